mod common;

use std::{error::Error, fmt, io::ErrorKind};

use tagged_csv::{
    codec::{BoxError, Capabilities, CsvValue, MarshalText, Nullable, UnmarshalText},
    core::item::{ItemReader, ItemWriter},
    csv_record,
    item::csv::{csv_reader::CsvRecordReaderBuilder, csv_writer::CsvRecordWriterBuilder},
    CsvError,
};

use common::init_logger;

#[derive(Debug, Default, PartialEq)]
struct Reading {
    sensor: String,
    value: i32,
    level: Nullable<u8>,
}

csv_record!(Reading {
    sensor => "sensor,required",
    value => "value",
    level => "level",
});

/// A type with no conversion capability.
#[derive(Debug, Default, PartialEq)]
struct Coordinates {
    lat: f64,
    lon: f64,
}

impl CsvValue for Coordinates {}

#[derive(Debug, Default)]
struct Place {
    name: String,
    position: Coordinates,
}

csv_record!(Place {
    name => "name",
    position => "position",
});

/// Upper-case ASCII codes only.
#[derive(Debug, Default, PartialEq)]
struct Code(String);

#[derive(Debug)]
struct InvalidCode(String);

impl fmt::Display for InvalidCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} is not an upper-case code", self.0)
    }
}

impl Error for InvalidCode {}

impl MarshalText for Code {
    fn marshal_text(&self) -> Result<Vec<u8>, BoxError> {
        Ok(self.0.as_bytes().to_vec())
    }
}

impl UnmarshalText for Code {
    fn unmarshal_text(&mut self, text: &[u8]) -> Result<(), BoxError> {
        let text = std::str::from_utf8(text)?;
        if !text.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(Box::new(InvalidCode(text.to_string())));
        }
        self.0 = text.to_string();
        Ok(())
    }
}

impl CsvValue for Code {
    fn capabilities() -> Capabilities<Self> {
        Capabilities::new().with_marshal_text().with_unmarshal_text()
    }
}

#[derive(Debug, Default)]
struct Airport {
    code: Code,
}

csv_record!(Airport { code => "code" });

/// A writer whose sink always fails.
struct FailingSink;

impl std::io::Write for FailingSink {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(ErrorKind::BrokenPipe, "sink closed"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn empty_input_has_no_header() {
    init_logger();

    let reader = CsvRecordReaderBuilder::new().from_reader::<Reading, _>("".as_bytes());

    let err = reader.read().unwrap_err();
    assert!(matches!(err, CsvError::EmptyInput));
    assert_eq!(err.to_string(), "reading csv header: input is empty");
}

#[test]
fn reader_stays_failed_after_a_header_error() {
    init_logger();

    let reader = CsvRecordReaderBuilder::new()
        .from_reader::<Reading, _>(&[0xff_u8, 0xfe, b',', b'x', b'\n'][..]);

    assert!(matches!(reader.read(), Err(CsvError::Header(_))));
    assert!(matches!(reader.read(), Err(CsvError::ReaderFailed)));
    assert_eq!(reader.headers(), None);
}

#[test]
fn strict_failure_is_fatal() {
    init_logger();

    let reader = CsvRecordReaderBuilder::new()
        .strict_mode(true)
        .from_reader::<Reading, _>("sensor,unit\nA,C\n".as_bytes());

    assert!(matches!(reader.read(), Err(CsvError::UnknownColumn(ref column)) if column == "unit"));
    assert!(matches!(reader.read(), Err(CsvError::ReaderFailed)));
}

#[test]
fn malformed_number_reports_row_and_column() {
    init_logger();

    let data = "sensor,value,level\nA,1,\nB,2,300\n";
    let reader = CsvRecordReaderBuilder::new().from_reader::<Reading, _>(data.as_bytes());

    let first = reader.read().unwrap().unwrap();
    assert_eq!(first.value, 1);
    assert!(first.level.is_null());

    let err = reader.read().unwrap_err();
    assert_eq!(err.row(), Some(3));
    match err.root() {
        CsvError::Conversion { column, source } => {
            assert_eq!(column, "level");
            assert!(source.to_string().contains("300"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn reading_continues_after_a_bad_row() -> Result<(), Box<dyn Error>> {
    init_logger();

    let data = "sensor,value\n,1\nB,2\n";
    let reader = CsvRecordReaderBuilder::new().from_reader::<Reading, _>(data.as_bytes());

    let err = reader.read().unwrap_err();
    assert_eq!(err.to_string(), "on row 2: sensor is a required field");

    let next = reader.read()?.unwrap();
    assert_eq!(next.sensor, "B");
    assert_eq!(next.value, 2);

    Ok(())
}

#[test]
fn unsupported_type_fails_only_when_used() -> Result<(), Box<dyn Error>> {
    init_logger();

    let reader = CsvRecordReaderBuilder::new().from_reader::<Place, _>("name\nHome\n".as_bytes());
    let place = reader.read()?.unwrap();
    assert_eq!(place.name, "Home");
    assert_eq!(place.position, Coordinates::default());

    let reader =
        CsvRecordReaderBuilder::new().from_reader::<Place, _>("name,position\nHome,1;2\n".as_bytes());
    let err = reader.read().unwrap_err();
    assert!(matches!(
        err.root(),
        CsvError::Undeserializable { column, .. } if column == "position"
    ));

    let writer = CsvRecordWriterBuilder::new()
        .has_headers(false)
        .from_writer::<Place, _>(vec![]);
    let err = writer.write(&[place]).unwrap_err();
    assert!(matches!(err, CsvError::Unserializable { ref column, .. } if column == "position"));

    Ok(())
}

#[test]
fn capability_errors_keep_their_source() {
    init_logger();

    let reader = CsvRecordReaderBuilder::new().from_reader::<Airport, _>("code\nCDG\nlhr\n".as_bytes());

    assert_eq!(reader.read().unwrap().unwrap().code, Code("CDG".to_string()));

    let err = reader.read().unwrap_err();
    assert_eq!(err.row(), Some(3));
    let source = err.root().source().unwrap();
    assert!(source.downcast_ref::<InvalidCode>().is_some());
    assert_eq!(source.to_string(), "\"lhr\" is not an upper-case code");
}

#[test]
fn sink_failures_are_returned() {
    init_logger();

    let writer = CsvRecordWriterBuilder::new().from_writer::<Reading, _>(FailingSink);

    let err = writer
        .write(&[Reading {
            sensor: "A".to_string(),
            value: 1,
            level: Nullable::Value(2),
        }])
        .unwrap_err();

    assert!(matches!(err, CsvError::Csv(_) | CsvError::Io(_)));
}
