use std::{any::type_name, fmt};

use log::{trace, warn};

use super::{
    scalar::{self, Scalar, ScalarError, ScalarKind},
    IsZero, MarshalCsv, MarshalText, UnmarshalCsv, UnmarshalText,
};
use crate::{error::BoxError, shape::TagMetadata, CsvError};

/// Converts a field value into its cell string.
pub type Encoder<T> = Box<dyn Fn(&T) -> Result<String, CsvError> + Send + Sync>;

/// Converts a cell string into a field value. The flag is `true` when the raw
/// cell was empty.
pub type Decoder<T> = Box<dyn Fn(&str, bool) -> Result<T, CsvError> + Send + Sync>;

/// The conversion behaviours a type supports.
///
/// Built by chaining `with_*` calls, each one only available when the type
/// implements the matching trait.
pub struct Capabilities<T> {
    marshal_csv: Option<fn(&T) -> Result<String, BoxError>>,
    marshal_text: Option<fn(&T) -> Result<Vec<u8>, BoxError>>,
    stringer: Option<fn(&T) -> String>,
    unmarshal_csv: Option<fn(&str) -> Result<T, BoxError>>,
    unmarshal_text: Option<fn(&[u8]) -> Result<T, BoxError>>,
    zeroer: Option<fn(&T) -> bool>,
    structural_zero: Option<fn(&T) -> bool>,
    scalar: Option<ScalarCodec<T>>,
}

struct ScalarCodec<T> {
    kind: ScalarKind,
    encode: fn(&T) -> String,
    decode: fn(&str) -> Result<T, ScalarError>,
}

impl<T> Clone for ScalarCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ScalarCodec<T> {}

impl<T> Clone for Capabilities<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Capabilities<T> {}

impl<T> Default for Capabilities<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn unmarshal_csv_into<T: UnmarshalCsv + Default>(data: &str) -> Result<T, BoxError> {
    let mut value = T::default();
    value.unmarshal_csv(data)?;
    Ok(value)
}

fn unmarshal_text_into<T: UnmarshalText + Default>(data: &[u8]) -> Result<T, BoxError> {
    let mut value = T::default();
    value.unmarshal_text(data)?;
    Ok(value)
}

fn display<T: fmt::Display>(value: &T) -> String {
    value.to_string()
}

fn equals_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

impl<T> Capabilities<T> {
    /// No capabilities at all.
    pub fn new() -> Self {
        Self {
            marshal_csv: None,
            marshal_text: None,
            stringer: None,
            unmarshal_csv: None,
            unmarshal_text: None,
            zeroer: None,
            structural_zero: None,
            scalar: None,
        }
    }

    pub fn with_marshal_csv(mut self) -> Self
    where
        T: MarshalCsv,
    {
        self.marshal_csv = Some(T::marshal_csv);
        self
    }

    pub fn with_unmarshal_csv(mut self) -> Self
    where
        T: UnmarshalCsv + Default,
    {
        self.unmarshal_csv = Some(unmarshal_csv_into::<T>);
        self
    }

    pub fn with_marshal_text(mut self) -> Self
    where
        T: MarshalText,
    {
        self.marshal_text = Some(T::marshal_text);
        self
    }

    pub fn with_unmarshal_text(mut self) -> Self
    where
        T: UnmarshalText + Default,
    {
        self.unmarshal_text = Some(unmarshal_text_into::<T>);
        self
    }

    /// Encode through `Display`. There is no decode counterpart.
    pub fn with_display(mut self) -> Self
    where
        T: fmt::Display,
    {
        self.stringer = Some(display::<T>);
        self
    }

    /// Use [`IsZero`] for `omitempty` checks.
    pub fn with_zeroer(mut self) -> Self
    where
        T: IsZero,
    {
        self.zeroer = Some(T::is_zero);
        self
    }

    /// Use `== T::default()` for `omitempty` checks when no [`IsZero`] is declared.
    pub fn with_structural_zero(mut self) -> Self
    where
        T: Default + PartialEq,
    {
        self.structural_zero = Some(equals_default::<T>);
        self
    }

    /// Fall back to the scalar codec of `T`.
    pub fn with_scalar(mut self) -> Self
    where
        T: Scalar,
    {
        self.scalar = Some(ScalarCodec {
            kind: T::KIND,
            encode: scalar::encode::<T>,
            decode: scalar::decode::<T>,
        });
        self
    }

    /// The encode strategy the resolver picks for these capabilities.
    pub fn encode_strategy(&self) -> EncodeStrategy {
        if self.marshal_csv.is_some() {
            EncodeStrategy::MarshalCsv
        } else if self.marshal_text.is_some() {
            EncodeStrategy::MarshalText
        } else if self.stringer.is_some() {
            EncodeStrategy::Display
        } else if let Some(scalar) = self.scalar {
            EncodeStrategy::Scalar(scalar.kind)
        } else {
            EncodeStrategy::Unsupported
        }
    }

    /// The decode strategy the resolver picks for these capabilities.
    pub fn decode_strategy(&self) -> DecodeStrategy {
        if self.unmarshal_csv.is_some() {
            DecodeStrategy::UnmarshalCsv
        } else if self.unmarshal_text.is_some() {
            DecodeStrategy::UnmarshalText
        } else if let Some(scalar) = self.scalar {
            DecodeStrategy::Scalar(scalar.kind)
        } else {
            DecodeStrategy::Unsupported
        }
    }

    fn zero_check(&self) -> Option<fn(&T) -> bool> {
        self.zeroer.or(self.structural_zero)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStrategy {
    MarshalCsv,
    MarshalText,
    Display,
    Scalar(ScalarKind),
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    UnmarshalCsv,
    UnmarshalText,
    Scalar(ScalarKind),
    Unsupported,
}

/// A resolved encoder and decoder pair for one field.
pub struct Codec<T> {
    encoder: Encoder<T>,
    decoder: Decoder<T>,
    encode_strategy: EncodeStrategy,
    decode_strategy: DecodeStrategy,
}

impl<T> Codec<T> {
    pub fn from_parts(
        encoder: Encoder<T>,
        decoder: Decoder<T>,
        encode_strategy: EncodeStrategy,
        decode_strategy: DecodeStrategy,
    ) -> Self {
        Self {
            encoder,
            decoder,
            encode_strategy,
            decode_strategy,
        }
    }

    pub fn into_parts(self) -> (Encoder<T>, Decoder<T>, EncodeStrategy, DecodeStrategy) {
        (
            self.encoder,
            self.decoder,
            self.encode_strategy,
            self.decode_strategy,
        )
    }

    pub fn encode(&self, value: &T) -> Result<String, CsvError> {
        (self.encoder)(value)
    }

    pub fn decode(&self, data: &str, is_null: bool) -> Result<T, CsvError> {
        (self.decoder)(data, is_null)
    }

    pub fn encode_strategy(&self) -> EncodeStrategy {
        self.encode_strategy
    }

    pub fn decode_strategy(&self) -> DecodeStrategy {
        self.decode_strategy
    }
}

/// Selects the encoder and decoder for a field from the capabilities of its type.
///
/// The `omitempty` and `required` flags of `metadata` are bound here, so the
/// returned closures never look at the tag again. Resolution itself never
/// fails: an unsupported type yields closures that fail when called.
pub fn resolve<T: 'static>(capabilities: Capabilities<T>, metadata: &TagMetadata) -> Codec<T> {
    let encode_strategy = capabilities.encode_strategy();
    let decode_strategy = capabilities.decode_strategy();
    trace!(
        "Resolved field {} of type {}: encode via {:?}, decode via {:?}",
        metadata.name(),
        type_name::<T>(),
        encode_strategy,
        decode_strategy
    );

    Codec {
        encoder: encoder(&capabilities, metadata),
        decoder: decoder(&capabilities, metadata),
        encode_strategy,
        decode_strategy,
    }
}

fn encoder<T: 'static>(capabilities: &Capabilities<T>, metadata: &TagMetadata) -> Encoder<T> {
    let column = metadata.name().to_string();

    let convert: Encoder<T> = if let Some(marshal) = capabilities.marshal_csv {
        Box::new(move |value: &T| {
            marshal(value).map_err(|source| CsvError::conversion(&column, source))
        })
    } else if let Some(marshal) = capabilities.marshal_text {
        Box::new(move |value: &T| {
            let bytes = marshal(value).map_err(|source| CsvError::conversion(&column, source))?;
            String::from_utf8(bytes).map_err(|source| CsvError::conversion(&column, source))
        })
    } else if let Some(stringer) = capabilities.stringer {
        Box::new(move |value: &T| Ok(stringer(value)))
    } else if let Some(scalar) = capabilities.scalar {
        let encode = scalar.encode;
        Box::new(move |value: &T| Ok(encode(value)))
    } else {
        return Box::new(move |_: &T| {
            Err(CsvError::Unserializable {
                column: column.clone(),
                type_name: type_name::<T>(),
            })
        });
    };

    if !metadata.omit_empty() {
        return convert;
    }

    match capabilities.zero_check() {
        Some(is_zero) => Box::new(move |value: &T| {
            if is_zero(value) {
                return Ok(String::new());
            }
            convert(value)
        }),
        None => {
            warn!(
                "omitempty on field {} is ignored: {} has no zero check",
                metadata.name(),
                type_name::<T>()
            );
            convert
        }
    }
}

fn decoder<T: 'static>(capabilities: &Capabilities<T>, metadata: &TagMetadata) -> Decoder<T> {
    let column = metadata.name().to_string();
    let required = metadata.required();

    if let Some(unmarshal) = capabilities.unmarshal_csv {
        Box::new(move |data: &str, is_null: bool| {
            if required && is_null {
                return Err(CsvError::RequiredField(column.clone()));
            }
            unmarshal(data).map_err(|source| CsvError::conversion(&column, source))
        })
    } else if let Some(unmarshal) = capabilities.unmarshal_text {
        Box::new(move |data: &str, is_null: bool| {
            if required && is_null {
                return Err(CsvError::RequiredField(column.clone()));
            }
            unmarshal(data.as_bytes()).map_err(|source| CsvError::conversion(&column, source))
        })
    } else if let Some(scalar) = capabilities.scalar {
        let decode = scalar.decode;
        Box::new(move |data: &str, is_null: bool| {
            if required && is_null {
                return Err(CsvError::RequiredField(column.clone()));
            }
            decode(data).map_err(|source| CsvError::conversion(&column, source))
        })
    } else {
        Box::new(move |_: &str, _: bool| {
            Err(CsvError::Undeserializable {
                column: column.clone(),
                type_name: type_name::<T>(),
            })
        })
    }
}
