use csv::{ReaderBuilder, StringRecord, Terminator, Trim};
use log::debug;
use std::{
    cell::{Cell, OnceCell, RefCell},
    collections::HashMap,
    fs::File,
    io::Read,
    path::Path,
    sync::Arc,
};

use super::options::CsvReaderOptions;
use crate::{
    core::item::{ItemReader, ItemReaderResult},
    error::CsvError,
    shape::{CsvRecord, InstructionSet, ShapeCache},
};

/// Column names of the header row and the instruction each column feeds.
struct Header {
    names: Vec<String>,
    positions: HashMap<String, usize>,
    targets: Vec<Option<usize>>,
}

impl Header {
    fn new<R>(row: &StringRecord, instructions: &InstructionSet<R>) -> Self {
        let names: Vec<String> = row.iter().map(str::to_string).collect();
        let positions = names
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();
        let targets = names
            .iter()
            .map(|name| instructions.position_of(name))
            .collect();

        Self {
            names,
            positions,
            targets,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    Uninitialized,
    Streaming,
    Exhausted,
    Failed,
}

/// A CSV reader that binds every data row to a record of type `R`.
///
/// The first row is always the header. Cells are matched to fields by column
/// name, so the column order of the file does not need to follow the field
/// order of the record. Columns without a matching field are ignored unless
/// strict mode is enabled.
///
/// # Type Parameters
///
/// - `R`: The record type, described by [`CsvRecord`].
/// - `Rd`: The source of CSV data. Must implement `Read`.
///
/// # Examples
///
/// ```
/// use tagged_csv::{csv_record, core::item::ItemReader, item::csv::csv_reader::CsvRecordReaderBuilder};
///
/// #[derive(Debug, Default)]
/// struct Record {
///     name: String,
///     value: i32,
/// }
///
/// csv_record!(Record { name => "name", value => "value" });
///
/// let data = "\
/// value,name
/// 123,foo
/// 456,bar
/// ";
///
/// let reader = CsvRecordReaderBuilder::new().from_reader::<Record, _>(data.as_bytes());
///
/// let record = reader.read().unwrap().unwrap();
/// assert_eq!(record.name, "foo");
/// assert_eq!(record.value, 123);
///
/// let record = reader.read().unwrap().unwrap();
/// assert_eq!(record.name, "bar");
///
/// assert!(reader.read().unwrap().is_none());
/// ```
pub struct CsvRecordReader<R, Rd> {
    reader: RefCell<csv::Reader<Rd>>,
    instructions: Arc<InstructionSet<R>>,
    strict_mode: bool,
    header: OnceCell<Header>,
    state: Cell<ReaderState>,
    /// 1-based number of the last row read, the header being row 1.
    current_row: Cell<usize>,
}

impl<R: CsvRecord, Rd: Read> CsvRecordReader<R, Rd> {
    /// Column names of the header row, once it has been read.
    pub fn headers(&self) -> Option<Vec<String>> {
        self.header.get().map(|header| header.names.clone())
    }

    /// Offset of `column` in the header row, once it has been read.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.header
            .get()
            .and_then(|header| header.positions.get(column).copied())
    }

    /// Iterates over the remaining records.
    ///
    /// Row errors are yielded and iteration goes on with the next row. A
    /// header failure is yielded once and ends the iteration.
    pub fn records(&self) -> impl Iterator<Item = Result<R, CsvError>> + '_ {
        let mut failed = false;
        std::iter::from_fn(move || {
            if failed {
                return None;
            }
            let next = self.read().transpose();
            failed = self.state.get() == ReaderState::Failed;
            next
        })
    }

    fn initialize(&self) -> Result<&Header, CsvError> {
        let mut row = StringRecord::new();
        let header = match self.reader.borrow_mut().read_record(&mut row) {
            Ok(true) => Header::new(&row, &self.instructions),
            Ok(false) => return Err(self.fail(CsvError::EmptyInput)),
            Err(error) => return Err(self.fail(CsvError::Header(error))),
        };
        self.current_row.set(1);
        debug!("Read csv header: {:?}", header.names);

        if self.strict_mode {
            let unknown = header
                .names
                .iter()
                .find(|name| self.instructions.field_by_name(name).is_none());
            if let Some(name) = unknown {
                return Err(self.fail(CsvError::UnknownColumn(name.clone())));
            }
        }

        self.state.set(ReaderState::Streaming);
        Ok(self.header.get_or_init(|| header))
    }

    fn fail(&self, error: CsvError) -> CsvError {
        self.state.set(ReaderState::Failed);
        error
    }
}

impl<R: CsvRecord, Rd: Read> ItemReader<R> for CsvRecordReader<R, Rd> {
    /// Reads the next row and binds it to a new record.
    ///
    /// The header row is read on the first call. Empty cells are decoded as
    /// null, fields without a column keep their default value.
    ///
    /// # Returns
    /// - `Ok(Some(record))` if a row was read and decoded
    /// - `Ok(None)` if there are no more rows
    /// - `Err(CsvError::Row { .. })` if a row could not be read or decoded
    /// - a header error if the header row is missing, unreadable or, in strict
    ///   mode, names an unknown column
    fn read(&self) -> ItemReaderResult<R> {
        let header = match (self.state.get(), self.header.get()) {
            (ReaderState::Uninitialized, _) => self.initialize()?,
            (ReaderState::Streaming, Some(header)) => header,
            (ReaderState::Exhausted, _) => return Ok(None),
            _ => return Err(CsvError::ReaderFailed),
        };

        let row_number = self.current_row.get() + 1;
        let mut row = StringRecord::new();
        let has_row = self.reader.borrow_mut().read_record(&mut row);
        // A malformed row is still consumed by the grammar reader.
        let has_row = has_row.map_err(|error| {
            self.current_row.set(row_number);
            CsvError::on_row(row_number, error.into())
        })?;
        if !has_row {
            self.state.set(ReaderState::Exhausted);
            return Ok(None);
        }
        self.current_row.set(row_number);

        let mut record = R::default();
        for (cell, target) in row.iter().zip(&header.targets) {
            let Some(position) = *target else {
                continue;
            };
            self.instructions.fields()[position]
                .decode(&mut record, cell, cell.is_empty())
                .map_err(|error| CsvError::on_row(row_number, error))?;
        }

        Ok(Some(record))
    }
}

/// A builder for configuring CSV record reading.
///
/// # Default Configuration
///
/// - Delimiter: comma (,)
/// - Terminator: CRLF (accepts `\r`, `\n` and `\r\n`)
/// - Trimming: disabled
/// - Strict mode: disabled
/// - Cache: [`ShapeCache::global`]
///
/// # Examples
///
/// ```
/// use tagged_csv::item::csv::csv_reader::CsvRecordReaderBuilder;
/// use csv::Terminator;
///
/// let builder = CsvRecordReaderBuilder::new()
///     .delimiter(b';')
///     .terminator(Terminator::Any(b'\n'))
///     .strict_mode(true);
/// ```
pub struct CsvRecordReaderBuilder<'c> {
    delimiter: u8,
    terminator: Terminator,
    trim: bool,
    strict_mode: bool,
    cache: &'c ShapeCache,
}

impl Default for CsvRecordReaderBuilder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvRecordReaderBuilder<'static> {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            terminator: Terminator::CRLF,
            trim: false,
            strict_mode: false,
            cache: ShapeCache::global(),
        }
    }

    /// Creates a builder from loaded configuration.
    pub fn from_options(options: &CsvReaderOptions) -> Self {
        Self::new()
            .delimiter(options.delimiter)
            .trim(options.trim)
            .strict_mode(options.strict_mode)
    }
}

impl<'c> CsvRecordReaderBuilder<'c> {
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn terminator(mut self, terminator: Terminator) -> Self {
        self.terminator = terminator;
        self
    }

    /// Trims leading and trailing whitespace from every cell, header included.
    pub fn trim(mut self, yes: bool) -> Self {
        self.trim = yes;
        self
    }

    /// Rejects header columns that match no field of the record.
    ///
    /// The check runs once, when the header row is read. A column whose
    /// field is tagged `-` counts as unknown.
    pub fn strict_mode(mut self, yes: bool) -> Self {
        self.strict_mode = yes;
        self
    }

    /// Resolves instruction sets through `cache` instead of the global one.
    pub fn with_cache<'n>(self, cache: &'n ShapeCache) -> CsvRecordReaderBuilder<'n> {
        CsvRecordReaderBuilder {
            delimiter: self.delimiter,
            terminator: self.terminator,
            trim: self.trim,
            strict_mode: self.strict_mode,
            cache,
        }
    }

    /// Creates a `CsvRecordReader` from any source implementing `Read`.
    pub fn from_reader<R: CsvRecord, Rd: Read>(self, rdr: Rd) -> CsvRecordReader<R, Rd> {
        let reader = self.csv_builder().from_reader(rdr);
        self.build(reader)
    }

    /// Creates a `CsvRecordReader` reading the file at `path`.
    ///
    /// # Errors
    /// Returns `CsvError::Csv` if the file cannot be opened.
    pub fn from_path<R: CsvRecord, P: AsRef<Path>>(
        self,
        path: P,
    ) -> Result<CsvRecordReader<R, File>, CsvError> {
        let reader = self.csv_builder().from_path(path)?;
        Ok(self.build(reader))
    }

    fn csv_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .terminator(self.terminator)
            .trim(if self.trim { Trim::All } else { Trim::None })
            // The header row is read as a plain record.
            .has_headers(false)
            .flexible(false);
        builder
    }

    fn build<R: CsvRecord, Rd: Read>(&self, reader: csv::Reader<Rd>) -> CsvRecordReader<R, Rd> {
        CsvRecordReader {
            reader: RefCell::new(reader),
            instructions: self.cache.resolve::<R>(),
            strict_mode: self.strict_mode,
            header: OnceCell::new(),
            state: Cell::new(ReaderState::Uninitialized),
            current_row: Cell::new(0),
        }
    }
}
