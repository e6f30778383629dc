use super::{Codec, CsvValue, DecodeStrategy, Decoder, EncodeStrategy, Encoder, IsZero};
use crate::{shape::TagMetadata, CsvError};

/// A field value that can be absent, distinct from the zero value of `T`.
///
/// Plain scalar fields decode an empty cell as their zero value. Wrapping them
/// in `Nullable` keeps "no value" and "zero" apart in both directions: an
/// empty cell decodes to [`Nullable::Null`], and a present zero is written out
/// even when the field is tagged `omitempty`.
///
/// # Examples
///
/// ```
/// use tagged_csv::codec::Nullable;
///
/// let mut owed: Nullable<f64> = Nullable::Null;
/// assert!(owed.is_null());
///
/// owed.set(0.0);
/// assert_eq!(owed.get(), Some(&0.0));
///
/// owed.unset();
/// assert_eq!(owed.get(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nullable<T> {
    Null,
    Value(T),
}

impl<T> Default for Nullable<T> {
    fn default() -> Self {
        Nullable::Null
    }
}

impl<T> Nullable<T> {
    pub fn new(value: T) -> Self {
        Nullable::Value(value)
    }

    pub fn set(&mut self, value: T) {
        *self = Nullable::Value(value);
    }

    pub fn unset(&mut self) {
        *self = Nullable::Null;
    }

    /// Returns the value if one was set.
    pub fn get(&self) -> Option<&T> {
        match self {
            Nullable::Value(value) => Some(value),
            Nullable::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Nullable::Null)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Nullable::Value(value) => Some(value),
            Nullable::Null => None,
        }
    }
}

impl<T> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Nullable::Value(value),
            None => Nullable::Null,
        }
    }
}

impl<T> IsZero for Nullable<T> {
    fn is_zero(&self) -> bool {
        self.is_null()
    }
}

// The inner codec is resolved once, under the column name of the field, and
// shared by every cell of that field.
impl<T: CsvValue> CsvValue for Nullable<T> {
    fn resolve(metadata: &TagMetadata) -> Codec<Self> {
        let (encode_inner, decode_inner, _, _) =
            T::resolve(&TagMetadata::new(metadata.name())).into_parts();
        let column = metadata.name().to_string();
        let required = metadata.required();
        let omit_empty = metadata.omit_empty();

        let encoder: Encoder<Self> = Box::new(move |value: &Nullable<T>| {
            if omit_empty && value.is_zero() {
                return Ok(String::new());
            }
            match value {
                Nullable::Value(value) => encode_inner(value),
                Nullable::Null => Ok(String::new()),
            }
        });
        let decoder: Decoder<Self> = Box::new(move |data: &str, is_null: bool| {
            if is_null {
                if required {
                    return Err(CsvError::RequiredField(column.clone()));
                }
                return Ok(Nullable::Null);
            }
            decode_inner(data, false).map(Nullable::Value)
        });

        Codec::from_parts(
            encoder,
            decoder,
            EncodeStrategy::MarshalCsv,
            DecodeStrategy::UnmarshalCsv,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::Nullable;
    use crate::{
        codec::{
            Capabilities, CsvValue, DecodeStrategy, EncodeStrategy, Scalar, ScalarError, ScalarKind,
        },
        shape::{ShapeCache, TagMetadata},
        CsvError,
    };

    static COUNTED_PROBES: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug, Default, PartialEq)]
    struct Counted(i64);

    impl Scalar for Counted {
        const KIND: ScalarKind = ScalarKind::I64;

        fn encode_scalar(&self) -> String {
            self.0.to_string()
        }

        fn parse_scalar(data: &str) -> Result<Self, ScalarError> {
            i64::parse_scalar(data).map(Counted)
        }

        fn zero() -> Self {
            Counted(0)
        }
    }

    impl CsvValue for Counted {
        fn capabilities() -> Capabilities<Self> {
            COUNTED_PROBES.fetch_add(1, Ordering::SeqCst);
            Capabilities::new().with_scalar()
        }
    }

    #[derive(Debug, Default)]
    struct Wrapped {
        value: Nullable<Counted>,
    }

    crate::csv_record!(Wrapped { value => "value" });

    #[test]
    fn set_and_get() {
        let mut flag = Nullable::<bool>::default();
        assert!(flag.is_null());
        assert_eq!(flag.get(), None);

        flag.set(true);
        assert_eq!(flag.get(), Some(&true));

        flag.set(false);
        assert_eq!(flag, Nullable::Value(false));

        flag.unset();
        assert!(flag.is_null());
        assert_eq!(flag.into_option(), None);
    }

    #[test]
    fn resolves_through_custom_capabilities() {
        let codec = Nullable::<i32>::resolve(&TagMetadata::parse("an_int"));

        assert_eq!(codec.encode_strategy(), EncodeStrategy::MarshalCsv);
        assert_eq!(codec.decode_strategy(), DecodeStrategy::UnmarshalCsv);
    }

    #[test]
    fn empty_cell_stays_null() {
        let codec = Nullable::<i32>::resolve(&TagMetadata::parse("an_int"));

        assert_eq!(codec.decode("", true).unwrap(), Nullable::Null);
        assert_eq!(codec.decode("11", false).unwrap(), Nullable::Value(11));
        assert_eq!(codec.decode("0", false).unwrap(), Nullable::Value(0));
    }

    #[test]
    fn present_zero_survives_omitempty() {
        let codec = Nullable::<f64>::resolve(&TagMetadata::parse("a_float,omitempty"));

        assert_eq!(codec.encode(&Nullable::Value(0.0)).unwrap(), "0");
        assert_eq!(codec.encode(&Nullable::Value(523.52)).unwrap(), "523.52");
        assert_eq!(codec.encode(&Nullable::Null).unwrap(), "");
    }

    #[test]
    fn inner_errors_are_attributed_to_the_outer_field() {
        let codec = Nullable::<i32>::resolve(&TagMetadata::parse("an_int"));

        let err = codec.decode("eleven", false).unwrap_err();
        assert!(matches!(err, CsvError::Conversion { ref column, .. } if column == "an_int"));
    }

    #[test]
    fn required_nullable_rejects_empty_cells() {
        let codec = Nullable::<String>::resolve(&TagMetadata::parse("a_string,required"));

        let err = codec.decode("", true).unwrap_err();
        assert_eq!(err.to_string(), "a_string is a required field");
    }

    #[test]
    fn inner_type_is_resolved_once_per_field() {
        let cache = ShapeCache::new();
        let instructions = cache.resolve::<Wrapped>();
        let field = &instructions.fields()[0];

        let mut record = Wrapped::default();
        for cell in ["1", "", "3", "4"] {
            field.decode(&mut record, cell, cell.is_empty()).unwrap();
            field.encode(&record).unwrap();
        }

        assert_eq!(record.value, Nullable::Value(Counted(4)));
        assert_eq!(COUNTED_PROBES.load(Ordering::SeqCst), 1);
    }
}
