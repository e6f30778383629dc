use thiserror::Error;

/// Boxed error returned by user supplied conversion capabilities.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
/// Errors raised while binding CSV rows to records or projecting records to rows.
pub enum CsvError {
    /// The header row could not be read from the underlying CSV source.
    #[error("reading csv header: {0}")]
    Header(#[source] csv::Error),

    /// The input ended before a header row was seen.
    #[error("reading csv header: input is empty")]
    EmptyInput,

    /// A previous header failure left the reader without column names.
    #[error("reader is unusable after a failed header read")]
    ReaderFailed,

    /// Strict mode found a header column with no matching field.
    #[error("{0} was seen in the csv but not in the record provided")]
    UnknownColumn(String),

    /// A required field received an empty cell.
    #[error("{0} is a required field")]
    RequiredField(String),

    /// The field type has no scalar kind and no encode capability.
    #[error("can not serialize type {type_name} for field {column}")]
    Unserializable {
        column: String,
        type_name: &'static str,
    },

    /// The field type has no scalar kind and no decode capability.
    #[error("can not unserialize type {type_name} for field {column}")]
    Undeserializable {
        column: String,
        type_name: &'static str,
    },

    /// A scalar literal was malformed or a capability failed to convert the value.
    #[error("invalid value for field {column}: {source}")]
    Conversion {
        column: String,
        #[source]
        source: BoxError,
    },

    /// A row-level failure, `row` is 1-based and counts the header row.
    #[error("on row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: Box<CsvError>,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CsvError {
    pub(crate) fn conversion(column: &str, source: impl Into<BoxError>) -> Self {
        CsvError::Conversion {
            column: column.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn on_row(row: usize, source: CsvError) -> Self {
        CsvError::Row {
            row,
            source: Box::new(source),
        }
    }

    /// Returns the innermost error, looking through row context.
    pub fn root(&self) -> &CsvError {
        match self {
            CsvError::Row { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns the 1-based row number attached to this error, if any.
    pub fn row(&self) -> Option<usize> {
        match self {
            CsvError::Row { row, .. } => Some(*row),
            _ => None,
        }
    }
}
