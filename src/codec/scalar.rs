//! Canonical string forms for scalar values.
//!
//! Every scalar kind has one encode and one decode function. Encoding never
//! fails; decoding treats an empty cell as the zero value without invoking the
//! underlying parser, so `""` is always a valid `0`, `0.0` or `false`.

use std::{
    fmt,
    num::{ParseFloatError, ParseIntError},
};

use thiserror::Error;

use super::{Capabilities, CsvValue, IsZero};

/// The native kind a scalar field is converted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Bool,
    String,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::I8 => "int8",
            ScalarKind::I16 => "int16",
            ScalarKind::I32 => "int32",
            ScalarKind::I64 => "int64",
            ScalarKind::Isize => "int",
            ScalarKind::U8 => "uint8",
            ScalarKind::U16 => "uint16",
            ScalarKind::U32 => "uint32",
            ScalarKind::U64 => "uint64",
            ScalarKind::Usize => "uint",
            ScalarKind::F32 => "float32",
            ScalarKind::F64 => "float64",
            ScalarKind::Bool => "bool",
            ScalarKind::String => "string",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, PartialEq)]
/// A malformed scalar literal.
pub enum ScalarError {
    #[error("invalid integer {literal:?}: {source}")]
    Int {
        literal: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid float {literal:?}: {source}")]
    Float {
        literal: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("invalid boolean {0:?}")]
    Bool(String),
}

/// A value with a canonical, self-describing string form.
pub trait Scalar: Sized {
    const KIND: ScalarKind;

    fn encode_scalar(&self) -> String;

    /// Parses `data`, which is guaranteed to be non-empty for numeric kinds.
    fn parse_scalar(data: &str) -> Result<Self, ScalarError>;

    fn zero() -> Self;
}

/// Encodes a scalar into its canonical form.
pub fn encode<T: Scalar>(value: &T) -> String {
    value.encode_scalar()
}

/// Decodes a scalar, returning the zero value for an empty cell.
pub fn decode<T: Scalar>(data: &str) -> Result<T, ScalarError> {
    if data.is_empty() {
        return Ok(T::zero());
    }
    T::parse_scalar(data)
}

macro_rules! integer_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const KIND: ScalarKind = ScalarKind::$kind;

                fn encode_scalar(&self) -> String {
                    self.to_string()
                }

                fn parse_scalar(data: &str) -> Result<Self, ScalarError> {
                    data.parse::<$ty>().map_err(|source| ScalarError::Int {
                        literal: data.to_string(),
                        source,
                    })
                }

                fn zero() -> Self {
                    0
                }
            }

            impl CsvValue for $ty {
                fn capabilities() -> Capabilities<Self> {
                    Capabilities::new().with_scalar().with_structural_zero()
                }
            }
        )*
    };
}

integer_scalar! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
}

// `Display` for floats is the shortest representation that round-trips and
// never switches to exponent notation.
macro_rules! float_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const KIND: ScalarKind = ScalarKind::$kind;

                fn encode_scalar(&self) -> String {
                    self.to_string()
                }

                fn parse_scalar(data: &str) -> Result<Self, ScalarError> {
                    data.parse::<$ty>().map_err(|source| ScalarError::Float {
                        literal: data.to_string(),
                        source,
                    })
                }

                fn zero() -> Self {
                    0.0
                }
            }

            // Only positive zero is empty: `-0.0 == 0.0` would blank a negative zero.
            impl IsZero for $ty {
                fn is_zero(&self) -> bool {
                    self.to_bits() == 0
                }
            }

            impl CsvValue for $ty {
                fn capabilities() -> Capabilities<Self> {
                    Capabilities::new().with_scalar().with_zeroer()
                }
            }
        )*
    };
}

float_scalar! {
    f32 => F32,
    f64 => F64,
}

impl Scalar for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn encode_scalar(&self) -> String {
        let literal = if *self { "TRUE" } else { "FALSE" };
        literal.to_string()
    }

    fn parse_scalar(data: &str) -> Result<Self, ScalarError> {
        match data {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(ScalarError::Bool(data.to_string())),
        }
    }

    fn zero() -> Self {
        false
    }
}

impl CsvValue for bool {
    fn capabilities() -> Capabilities<Self> {
        Capabilities::new().with_scalar().with_structural_zero()
    }
}

// Strings are written verbatim, quoting belongs to the CSV writer.
impl Scalar for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn encode_scalar(&self) -> String {
        self.clone()
    }

    fn parse_scalar(data: &str) -> Result<Self, ScalarError> {
        Ok(data.to_string())
    }

    fn zero() -> Self {
        String::new()
    }
}

impl CsvValue for String {
    fn capabilities() -> Capabilities<Self> {
        Capabilities::new().with_scalar().with_structural_zero()
    }
}
