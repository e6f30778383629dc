use std::{marker::PhantomData, sync::Arc};

use super::TagMetadata;
use crate::{
    codec::{CsvValue, DecodeStrategy, EncodeStrategy},
    CsvError,
};

/// Reads one field of a record and encodes it.
pub(crate) type RecordEncoder<R> = Box<dyn Fn(&R) -> Result<String, CsvError> + Send + Sync>;

/// Decodes one cell and stores it into a field of a record.
pub(crate) type RecordDecoder<R> =
    Box<dyn Fn(&mut R, &str, bool) -> Result<(), CsvError> + Send + Sync>;

/// A record type whose fields map to CSV columns.
///
/// Most implementations are generated with [`csv_record!`](crate::csv_record).
/// Writing one by hand looks like this:
///
/// ```
/// use tagged_csv::shape::{CsvRecord, RecordShape};
///
/// #[derive(Debug, Default)]
/// struct Invoice {
///     email: String,
///     owed: f64,
///     internal_note: String,
/// }
///
/// impl CsvRecord for Invoice {
///     fn shape() -> RecordShape<Self> {
///         RecordShape::builder()
///             .field("email", "email,required", |r: &Self| &r.email, |r: &mut Self| &mut r.email)
///             .field("owed", "owed,omitempty", |r: &Self| &r.owed, |r: &mut Self| &mut r.owed)
///             .untagged("internal_note")
///             .build()
///     }
/// }
///
/// assert_eq!(Invoice::shape().len(), 3);
/// ```
pub trait CsvRecord: Default + 'static {
    fn shape() -> RecordShape<Self>;
}

/// The ordered field layout of a record type.
pub struct RecordShape<R> {
    fields: Vec<FieldDeclaration<R>>,
}

impl<R: 'static> RecordShape<R> {
    pub fn builder() -> ShapeBuilder<R> {
        ShapeBuilder { fields: Vec::new() }
    }
}

impl<R> RecordShape<R> {
    pub fn fields(&self) -> &[FieldDeclaration<R>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One declared field: its position, its name and its tag if any.
pub struct FieldDeclaration<R> {
    index: usize,
    name: &'static str,
    tag: Option<&'static str>,
    binder: Option<Box<dyn FieldBinder<R>>>,
}

impl<R> FieldDeclaration<R> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `None` for untagged fields, which never take part in conversion.
    pub fn tag(&self) -> Option<&'static str> {
        self.tag
    }

    pub(crate) fn bind(&self, metadata: &TagMetadata) -> Option<BoundField<R>> {
        self.binder.as_ref().map(|binder| binder.bind(metadata))
    }
}

/// The accessor pair of a field combined with the codec of its type.
pub(crate) struct BoundField<R> {
    pub(crate) encoder: RecordEncoder<R>,
    pub(crate) decoder: RecordDecoder<R>,
    pub(crate) encode_strategy: EncodeStrategy,
    pub(crate) decode_strategy: DecodeStrategy,
}

pub(crate) trait FieldBinder<R>: Send + Sync {
    fn bind(&self, metadata: &TagMetadata) -> BoundField<R>;
}

struct Accessor<T, G, M> {
    get: Arc<G>,
    get_mut: Arc<M>,
    _value: PhantomData<fn() -> T>,
}

impl<R, T, G, M> FieldBinder<R> for Accessor<T, G, M>
where
    R: 'static,
    T: CsvValue,
    G: Fn(&R) -> &T + Send + Sync + 'static,
    M: Fn(&mut R) -> &mut T + Send + Sync + 'static,
{
    fn bind(&self, metadata: &TagMetadata) -> BoundField<R> {
        let (encode, decode, encode_strategy, decode_strategy) = T::resolve(metadata).into_parts();
        let get = Arc::clone(&self.get);
        let get_mut = Arc::clone(&self.get_mut);

        BoundField {
            encoder: Box::new(move |record: &R| encode((*get)(record))),
            decoder: Box::new(move |record: &mut R, data: &str, is_null: bool| {
                *(*get_mut)(record) = decode(data, is_null)?;
                Ok(())
            }),
            encode_strategy,
            decode_strategy,
        }
    }
}

/// Collects field declarations in declaration order.
pub struct ShapeBuilder<R> {
    fields: Vec<FieldDeclaration<R>>,
}

impl<R: 'static> ShapeBuilder<R> {
    /// Declares a tagged field reached through `get` and `get_mut`.
    pub fn field<T, G, M>(mut self, name: &'static str, tag: &'static str, get: G, get_mut: M) -> Self
    where
        T: CsvValue,
        G: Fn(&R) -> &T + Send + Sync + 'static,
        M: Fn(&mut R) -> &mut T + Send + Sync + 'static,
    {
        let accessor = Accessor {
            get: Arc::new(get),
            get_mut: Arc::new(get_mut),
            _value: PhantomData,
        };
        let binder: Box<dyn FieldBinder<R>> = Box::new(accessor);
        self.push(name, Some(tag), Some(binder));
        self
    }

    /// Declares a field without a tag. It keeps its position but is never converted.
    pub fn untagged(mut self, name: &'static str) -> Self {
        self.push(name, None, None);
        self
    }

    pub fn build(self) -> RecordShape<R> {
        RecordShape {
            fields: self.fields,
        }
    }

    fn push(
        &mut self,
        name: &'static str,
        tag: Option<&'static str>,
        binder: Option<Box<dyn FieldBinder<R>>>,
    ) {
        let index = self.fields.len();
        self.fields.push(FieldDeclaration {
            index,
            name,
            tag,
            binder,
        });
    }
}

/// Implements [`CsvRecord`] for a struct from a list of its fields.
///
/// Tagged fields are written `field => "tag"`, untagged fields as a bare
/// `field`. Fields must be listed in declaration order.
///
/// ```
/// use tagged_csv::{csv_record, shape::CsvRecord};
///
/// #[derive(Debug, Default)]
/// struct Customer {
///     email: String,
///     age: u32,
///     should_bill: bool,
/// }
///
/// csv_record!(Customer {
///     email => "email,required",
///     age => "age,omitempty",
///     should_bill,
/// });
///
/// let shape = Customer::shape();
/// assert_eq!(shape.fields()[2].tag(), None);
/// ```
#[macro_export]
macro_rules! csv_record {
    (@field $builder:ident, $field:ident, $tag:literal) => {
        $builder.field(
            stringify!($field),
            $tag,
            |record: &Self| &record.$field,
            |record: &mut Self| &mut record.$field,
        )
    };
    (@field $builder:ident, $field:ident) => {
        $builder.untagged(stringify!($field))
    };
    ($record:ty { $($field:ident $(=> $tag:literal)?),* $(,)? }) => {
        impl $crate::shape::CsvRecord for $record {
            fn shape() -> $crate::shape::RecordShape<Self> {
                let builder = $crate::shape::RecordShape::<Self>::builder();
                $( let builder = $crate::csv_record!(@field builder, $field $(, $tag)?); )*
                builder.build()
            }
        }
    };
}
