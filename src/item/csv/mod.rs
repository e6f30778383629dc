/// CSV support for binding rows to records and projecting records to rows.
///
/// # Module Architecture
///
/// 1. **CsvRecordReader**: reads the header row once, then decodes every data
///    row into a record, matching cells to fields by column name.
///
/// 2. **CsvRecordWriter**: writes a header row built from the record's column
///    names, then one row per record, flushing after every write.
///
/// Both are configured through builders, directly or from loaded
/// [`options`]. The CSV grammar itself (quoting, escaping, delimiters) is
/// handled by the `csv` crate; this module only exchanges unescaped cells.
///
/// # Ownership and Borrowing Considerations
///
/// Writers own or borrow their destination until dropped. Use
/// [`CsvRecordWriter::into_inner`](csv_writer::CsvRecordWriter::into_inner) to
/// get an in-memory buffer back after writing.
///
/// # Examples
///
/// ```
/// use tagged_csv::{
///     codec::Nullable,
///     core::item::{ItemReader, ItemWriter},
///     csv_record,
///     item::csv::{csv_reader::CsvRecordReaderBuilder, csv_writer::CsvRecordWriterBuilder},
/// };
///
/// #[derive(Debug, Default, PartialEq)]
/// struct City {
///     city: String,
///     country: String,
///     pop: Nullable<u32>,
/// }
///
/// csv_record!(City {
///     city => "city,required",
///     country => "country",
///     pop => "pop",
/// });
///
/// let csv_data = "\
/// country,city,pop
/// United States,Boston,4628910
/// United States,Concord,
/// ";
///
/// let reader = CsvRecordReaderBuilder::new().from_reader::<City, _>(csv_data.as_bytes());
/// let cities = reader.records().collect::<Result<Vec<_>, _>>().unwrap();
///
/// assert_eq!(cities.len(), 2);
/// assert_eq!(cities[0].pop, Nullable::Value(4628910));
/// assert!(cities[1].pop.is_null());
///
/// let writer = CsvRecordWriterBuilder::new().from_writer::<City, _>(vec![]);
/// writer.write(&cities).unwrap();
///
/// let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();
/// assert_eq!(output, "\
/// city,country,pop
/// Boston,United States,4628910
/// Concord,United States,
/// ");
/// ```

/// A module providing facilities for reading CSV rows into records.
pub mod csv_reader;

/// A module providing facilities for writing records as CSV rows.
pub mod csv_writer;

/// Serde-loadable reader and writer settings.
pub mod options;
