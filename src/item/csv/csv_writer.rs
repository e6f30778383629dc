use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::Write,
    path::Path,
    sync::Arc,
};

use csv::{Terminator, Writer, WriterBuilder};
use log::debug;

use super::options::CsvWriterOptions;
use crate::{
    core::item::{ItemWriter, ItemWriterResult},
    error::CsvError,
    shape::{CsvRecord, InstructionSet, ShapeCache},
};

/// Projects records of type `R` onto CSV rows.
///
/// The header row, made of every instruction's column name, is written with
/// the first batch unless disabled on the builder. The underlying writer is
/// flushed after every call to [`write`](ItemWriter::write).
pub struct CsvRecordWriter<R, W: Write> {
    writer: RefCell<Writer<W>>,
    instructions: Arc<InstructionSet<R>>,
    has_headers: bool,
    header_written: Cell<bool>,
}

impl<R: CsvRecord, W: Write> CsvRecordWriter<R, W> {
    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, CsvError> {
        self.writer
            .into_inner()
            .into_inner()
            .map_err(|error| CsvError::Io(error.into_error()))
    }

    fn write_header(&self) -> Result<(), CsvError> {
        let header = self.instructions.header();
        debug!("Writing csv header: {:?}", header);
        self.writer.borrow_mut().write_record(&header)?;
        Ok(())
    }

    fn write_rows(&self, items: &[R]) -> Result<(), CsvError> {
        if self.has_headers && !self.header_written.get() {
            self.write_header()?;
            self.header_written.set(true);
        }

        let mut writer = self.writer.borrow_mut();
        for item in items {
            let row = self.instructions.encode_record(item)?;
            writer.write_record(&row)?;
        }
        Ok(())
    }
}

impl<R: CsvRecord, W: Write> ItemWriter<R> for CsvRecordWriter<R, W> {
    /// Writes `items` as rows and flushes.
    ///
    /// Rows encoded before a failing record stay written and are flushed too.
    fn write(&self, items: &[R]) -> ItemWriterResult {
        let written = self.write_rows(items);
        let flushed = self.writer.borrow_mut().flush().map_err(CsvError::from);
        written.and(flushed)
    }

    fn flush(&self) -> ItemWriterResult {
        self.writer.borrow_mut().flush()?;
        Ok(())
    }
}

/// A builder for configuring CSV record writing.
///
/// # Default Configuration
///
/// - Delimiter: comma (,)
/// - Terminator: `\n`
/// - Header row: written
/// - Cache: [`ShapeCache::global`]
///
/// # Examples
///
/// ```
/// use tagged_csv::{csv_record, core::item::ItemWriter, item::csv::csv_writer::CsvRecordWriterBuilder};
///
/// #[derive(Debug, Default)]
/// struct Customer {
///     email: String,
///     age: u32,
///     owed: f64,
///     should_bill: bool,
/// }
///
/// csv_record!(Customer {
///     email => "email",
///     age => "age",
///     owed => "owed",
///     should_bill,
/// });
///
/// let writer = CsvRecordWriterBuilder::new()
///     .has_headers(false)
///     .from_writer::<Customer, _>(vec![]);
///
/// writer
///     .write(&[Customer {
///         email: "test@example.com".to_string(),
///         age: 32,
///         owed: 6512.23,
///         should_bill: true,
///     }])
///     .unwrap();
///
/// let data = String::from_utf8(writer.into_inner().unwrap()).unwrap();
/// assert_eq!(data, "test@example.com,32,6512.23\n");
/// ```
pub struct CsvRecordWriterBuilder<'c> {
    delimiter: u8,
    terminator: Terminator,
    has_headers: bool,
    cache: &'c ShapeCache,
}

impl Default for CsvRecordWriterBuilder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvRecordWriterBuilder<'static> {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            terminator: Terminator::Any(b'\n'),
            has_headers: true,
            cache: ShapeCache::global(),
        }
    }

    /// Creates a builder from loaded configuration.
    pub fn from_options(options: &CsvWriterOptions) -> Self {
        Self::new()
            .delimiter(options.delimiter)
            .has_headers(options.has_headers)
    }
}

impl<'c> CsvRecordWriterBuilder<'c> {
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn terminator(mut self, terminator: Terminator) -> Self {
        self.terminator = terminator;
        self
    }

    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    /// Resolves instruction sets through `cache` instead of the global one.
    pub fn with_cache<'n>(self, cache: &'n ShapeCache) -> CsvRecordWriterBuilder<'n> {
        CsvRecordWriterBuilder {
            delimiter: self.delimiter,
            terminator: self.terminator,
            has_headers: self.has_headers,
            cache,
        }
    }

    pub fn from_writer<R: CsvRecord, W: Write>(self, wtr: W) -> CsvRecordWriter<R, W> {
        let writer = self.csv_builder().from_writer(wtr);
        self.build(writer)
    }

    /// # Errors
    /// Returns `CsvError::Csv` if the file cannot be created.
    pub fn from_path<R: CsvRecord, P: AsRef<Path>>(
        self,
        path: P,
    ) -> Result<CsvRecordWriter<R, File>, CsvError> {
        let writer = self.csv_builder().from_path(path)?;
        Ok(self.build(writer))
    }

    fn csv_builder(&self) -> WriterBuilder {
        let mut builder = WriterBuilder::new();
        builder
            .delimiter(self.delimiter)
            .terminator(self.terminator)
            .has_headers(false)
            .flexible(false);
        builder
    }

    fn build<R: CsvRecord, W: Write>(&self, writer: Writer<W>) -> CsvRecordWriter<R, W> {
        CsvRecordWriter {
            writer: RefCell::new(writer),
            instructions: self.cache.resolve::<R>(),
            has_headers: self.has_headers,
            header_written: Cell::new(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::CsvRecordWriterBuilder;
    use crate::{codec::Nullable, core::item::ItemWriter, CsvError};

    #[derive(Debug, Default)]
    struct Customer {
        email: String,
        age: i32,
        owed: f64,
        should_bill: bool,
    }

    crate::csv_record!(Customer {
        email => "email",
        age => "age,omitempty",
        owed => "owed",
        should_bill,
    });

    #[derive(Debug, Default)]
    struct Balance {
        id: u32,
        amount: Nullable<i64>,
        previous: Nullable<i64>,
    }

    crate::csv_record!(Balance {
        id => "id",
        amount => "amount,omitempty",
        previous => "previous,omitempty",
    });

    #[derive(Debug, Default)]
    struct Opaque;

    #[derive(Debug, Default)]
    struct Broken {
        name: String,
        opaque: Opaque,
    }

    impl crate::codec::CsvValue for Opaque {}

    crate::csv_record!(Broken {
        name => "name",
        opaque => "opaque",
    });

    fn customer(email: &str, age: i32, owed: f64) -> Customer {
        Customer {
            email: email.to_string(),
            age,
            owed,
            should_bill: true,
        }
    }

    #[test]
    fn header_is_written_once() -> Result<(), Box<dyn Error>> {
        let wtr = CsvRecordWriterBuilder::new().from_writer::<Customer, _>(vec![]);

        wtr.write(&[customer("test@example.com", 32, 6512.23)])?;
        wtr.write(&[customer("other@example.com", 41, 0.5)])?;

        let data = String::from_utf8(wtr.into_inner()?)?;
        assert_eq!(
            data,
            "email,age,owed
test@example.com,32,6512.23
other@example.com,41,0.5
"
        );

        Ok(())
    }

    #[test]
    fn header_is_written_for_an_empty_batch() -> Result<(), Box<dyn Error>> {
        let wtr = CsvRecordWriterBuilder::new().from_writer::<Customer, _>(vec![]);

        wtr.write(&[])?;

        let data = String::from_utf8(wtr.into_inner()?)?;
        assert_eq!(data, "email,age,owed\n");

        Ok(())
    }

    #[test]
    fn omit_empty_blanks_zero_values() -> Result<(), Box<dyn Error>> {
        let wtr = CsvRecordWriterBuilder::new()
            .has_headers(false)
            .delimiter(b';')
            .from_writer::<Customer, _>(vec![]);

        wtr.write(&[customer("zero@example.com", 0, 0.0)])?;

        let data = String::from_utf8(wtr.into_inner()?)?;
        assert_eq!(data, "zero@example.com;;0\n");

        Ok(())
    }

    #[test]
    fn present_nullable_zero_is_written() -> Result<(), Box<dyn Error>> {
        let wtr = CsvRecordWriterBuilder::new().from_writer::<Balance, _>(vec![]);

        wtr.write(&[Balance {
            id: 1,
            amount: Nullable::Value(0),
            previous: Nullable::Null,
        }])?;

        let data = String::from_utf8(wtr.into_inner()?)?;
        assert_eq!(data, "id,amount,previous\n1,0,\n");

        Ok(())
    }

    #[test]
    fn unsupported_field_fails_the_write() -> Result<(), Box<dyn Error>> {
        let wtr = CsvRecordWriterBuilder::new().from_writer::<Broken, _>(vec![]);

        let err = wtr.write(&[Broken::default()]).unwrap_err();
        assert!(matches!(err, CsvError::Unserializable { ref column, .. } if column == "opaque"));

        let data = String::from_utf8(wtr.into_inner()?)?;
        assert_eq!(data, "name,opaque\n");

        Ok(())
    }
}
