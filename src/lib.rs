#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # Tagged CSV

 Bind CSV rows to typed Rust records, and project records back to rows,
 driven by a short tag attached to each field.

 ## Core Concepts

- **Tag:** `"<column>[,required][,omitempty]"`. A column of `-` excludes the field.
- **CsvRecord:** a record type listing its fields, usually declared with [`csv_record!`].
- **CsvValue:** a field type and the conversion capabilities it offers
  (custom CSV marshalling, text marshalling, `Display`, or a built-in scalar kind).
- **Nullable:** a wrapper distinguishing an empty cell from a zero value.
- **ShapeCache:** resolves the field instructions of each record type once and shares them.
- **ItemReader / ItemWriter:** the streaming surface, implemented by the CSV reader and writer.

 ## Getting Started

```rust
# use std::error::Error;
use tagged_csv::{
    codec::Nullable,
    core::item::{ItemReader, ItemWriter},
    csv_record,
    item::csv::{csv_reader::CsvRecordReaderBuilder, csv_writer::CsvRecordWriterBuilder},
};

#[derive(Debug, Default, PartialEq)]
struct Customer {
    email: String,
    age: u32,
    owed: f64,
    nickname: Nullable<String>,
    should_bill: bool,
}

csv_record!(Customer {
    email => "email,required",
    age => "age,omitempty",
    owed => "owed",
    nickname => "nickname",
    should_bill,
});

# fn main() -> Result<(), Box<dyn Error>> {
let input = "\
owed,email,nickname
6512.23,test@example.com,
0.5,other@example.com,Bob
";

let reader = CsvRecordReaderBuilder::new()
    .strict_mode(true)
    .from_reader::<Customer, _>(input.as_bytes());

let mut customers = Vec::new();
while let Some(customer) = reader.read()? {
    customers.push(customer);
}
assert!(customers[0].nickname.is_null());
assert_eq!(customers[1].nickname, Nullable::Value("Bob".to_string()));

let writer = CsvRecordWriterBuilder::new().from_writer::<Customer, _>(vec![]);
writer.write(&customers)?;

let output = String::from_utf8(writer.into_inner()?)?;
assert_eq!(output, "\
email,age,owed,nickname
test@example.com,,6512.23,
other@example.com,,0.5,Bob
");
# Ok(())
# }
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Field value conversion: scalar codecs, capabilities and their resolution
pub mod codec;

/// Reader and writer traits
pub mod core;

/// Error types for conversion and streaming
pub mod error;

#[doc(inline)]
pub use error::*;

/// CSV record reader and writer
pub mod item;

/// Record shapes, tag parsing and cached field instructions
pub mod shape;

pub use codec::{CsvValue, Nullable};
pub use shape::{CsvRecord, ShapeCache};
