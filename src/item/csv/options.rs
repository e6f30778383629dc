use serde::{Deserialize, Serialize};

/// Loadable settings for [`CsvRecordReaderBuilder`](super::csv_reader::CsvRecordReaderBuilder).
///
/// Missing keys fall back to their defaults, so a partial configuration
/// document is accepted.
///
/// ```
/// use tagged_csv::item::csv::options::CsvReaderOptions;
///
/// let options = CsvReaderOptions::default();
/// assert_eq!(options.delimiter, b',');
/// assert!(!options.strict_mode);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvReaderOptions {
    pub delimiter: u8,
    pub strict_mode: bool,
    pub trim: bool,
}

impl Default for CsvReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            strict_mode: false,
            trim: false,
        }
    }
}

/// Loadable settings for [`CsvRecordWriterBuilder`](super::csv_writer::CsvRecordWriterBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvWriterOptions {
    pub delimiter: u8,
    pub has_headers: bool,
}

impl Default for CsvWriterOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
        }
    }
}
