//! Conversion between CSV cells and native field values.
//!
//! A field type opts into conversion by implementing [`CsvValue`]. Its
//! [`Capabilities`] list the conversion behaviours it supports; the resolver
//! picks one encode and one decode strategy from that list in a fixed
//! priority order:
//!
//! | Priority | Encode          | Decode            |
//! |----------|-----------------|-------------------|
//! | 1        | [`MarshalCsv`]  | [`UnmarshalCsv`]  |
//! | 2        | [`MarshalText`] | [`UnmarshalText`] |
//! | 3        | `Display`       | -                 |
//! | 4        | scalar kind     | scalar kind       |
//!
//! A type with none of them still resolves; its codec fails when invoked.
//!
//! # Examples
//!
//! ```
//! use tagged_csv::codec::{BoxError, Capabilities, CsvValue, MarshalCsv, UnmarshalCsv};
//! use tagged_csv::shape::TagMetadata;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Celsius(f64);
//!
//! impl MarshalCsv for Celsius {
//!     fn marshal_csv(&self) -> Result<String, BoxError> {
//!         Ok(format!("{}C", self.0))
//!     }
//! }
//!
//! impl UnmarshalCsv for Celsius {
//!     fn unmarshal_csv(&mut self, data: &str) -> Result<(), BoxError> {
//!         self.0 = data.trim_end_matches('C').parse()?;
//!         Ok(())
//!     }
//! }
//!
//! impl CsvValue for Celsius {
//!     fn capabilities() -> Capabilities<Self> {
//!         Capabilities::new().with_marshal_csv().with_unmarshal_csv()
//!     }
//! }
//!
//! let codec = Celsius::resolve(&TagMetadata::new("temperature"));
//! assert_eq!(codec.encode(&Celsius(21.5)).unwrap(), "21.5C");
//! assert_eq!(codec.decode("-3C", false).unwrap(), Celsius(-3.0));
//! ```

mod nullable;
mod resolver;
pub mod scalar;

pub use crate::error::BoxError;
pub use nullable::Nullable;
pub use resolver::{
    resolve, Capabilities, Codec, DecodeStrategy, Decoder, EncodeStrategy, Encoder,
};
pub use scalar::{Scalar, ScalarError, ScalarKind};

use crate::shape::TagMetadata;

/// Custom conversion of a value into a CSV cell.
pub trait MarshalCsv {
    fn marshal_csv(&self) -> Result<String, BoxError>;
}

/// Custom conversion of a CSV cell into a value.
///
/// The cell arrives with CSV escaping already removed. The resolver calls this
/// on a default constructed value, so the implementation only has to fill it in.
pub trait UnmarshalCsv {
    fn unmarshal_csv(&mut self, data: &str) -> Result<(), BoxError>;
}

/// Generic text encoding, the produced bytes become the cell.
pub trait MarshalText {
    fn marshal_text(&self) -> Result<Vec<u8>, BoxError>;
}

/// Generic text decoding, fed with the raw bytes of the cell.
pub trait UnmarshalText {
    fn unmarshal_text(&mut self, data: &[u8]) -> Result<(), BoxError>;
}

/// A custom notion of emptiness, preferred over `== Default::default()` when a
/// field is tagged `omitempty`.
pub trait IsZero {
    fn is_zero(&self) -> bool;
}

/// A type that can be stored in a tagged record field.
pub trait CsvValue: Sized + 'static {
    /// Conversion behaviours supported by this type.
    ///
    /// The default declares none, which makes every encode and decode fail
    /// with an unsupported type error.
    fn capabilities() -> Capabilities<Self> {
        Capabilities::new()
    }

    /// Builds the encoder and decoder for a field of this type.
    fn resolve(metadata: &TagMetadata) -> Codec<Self> {
        resolve(Self::capabilities(), metadata)
    }
}

// One level of optionality: `None` is an empty cell and an empty cell is `None`.
impl<T: CsvValue> CsvValue for Option<T> {
    fn resolve(metadata: &TagMetadata) -> Codec<Self> {
        let inner = T::resolve(&TagMetadata::new(metadata.name()));
        let column = metadata.name().to_string();
        let required = metadata.required();
        let (encode_inner, decode_inner, encode_strategy, decode_strategy) = inner.into_parts();

        let encoder: Encoder<Self> = Box::new(move |value: &Option<T>| match value {
            Some(value) => encode_inner(value),
            None => Ok(String::new()),
        });
        let decoder: Decoder<Self> = Box::new(move |data: &str, is_null: bool| {
            if is_null {
                if required {
                    return Err(crate::CsvError::RequiredField(column.clone()));
                }
                return Ok(None);
            }
            decode_inner(data, false).map(Some)
        });

        Codec::from_parts(encoder, decoder, encode_strategy, decode_strategy)
    }
}
