use std::collections::{hash_map::Entry, HashMap};

use log::warn;

use super::{
    record::{RecordDecoder, RecordEncoder},
    RecordShape, TagMetadata,
};
use crate::{
    codec::{DecodeStrategy, EncodeStrategy},
    CsvError,
};

/// How to convert one field of a record, resolved once per record type.
pub struct FieldInstruction<R> {
    index: usize,
    metadata: TagMetadata,
    encoder: RecordEncoder<R>,
    decoder: RecordDecoder<R>,
    encode_strategy: EncodeStrategy,
    decode_strategy: DecodeStrategy,
}

impl<R> FieldInstruction<R> {
    /// Position of the field in its record declaration.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Column name used in headers.
    pub fn column(&self) -> &str {
        self.metadata.name()
    }

    pub fn metadata(&self) -> &TagMetadata {
        &self.metadata
    }

    pub fn encode_strategy(&self) -> EncodeStrategy {
        self.encode_strategy
    }

    pub fn decode_strategy(&self) -> DecodeStrategy {
        self.decode_strategy
    }

    /// Encodes the field of `record` into a cell.
    pub fn encode(&self, record: &R) -> Result<String, CsvError> {
        (self.encoder)(record)
    }

    /// Decodes `data` into the field of `record`. `is_null` is `true` when the
    /// raw cell was empty.
    pub fn decode(&self, record: &mut R, data: &str, is_null: bool) -> Result<(), CsvError> {
        (self.decoder)(record, data, is_null)
    }
}

/// The field instructions of one record type, in declaration order, plus a
/// lookup by column name.
pub struct InstructionSet<R> {
    fields: Vec<FieldInstruction<R>>,
    by_name: HashMap<String, usize>,
}

impl<R> InstructionSet<R> {
    /// Resolves every tagged, non-skipped field of `shape`.
    ///
    /// When two fields share a column name the first one keeps the name
    /// lookup; both are still encoded.
    pub fn build(shape: &RecordShape<R>) -> Self {
        let mut fields = Vec::with_capacity(shape.len());
        let mut by_name = HashMap::with_capacity(shape.len());

        for declaration in shape.fields() {
            let Some(tag) = declaration.tag() else {
                continue;
            };
            let metadata = TagMetadata::parse(tag);
            if metadata.is_skipped() {
                continue;
            }
            if metadata.name().is_empty() {
                warn!("Field {} has an empty column name", declaration.name());
            }
            let Some(bound) = declaration.bind(&metadata) else {
                continue;
            };

            match by_name.entry(metadata.name().to_string()) {
                Entry::Vacant(entry) => {
                    entry.insert(fields.len());
                }
                Entry::Occupied(_) => {
                    warn!(
                        "Column {} is declared more than once, field {} is not reachable by name",
                        metadata.name(),
                        declaration.name()
                    );
                }
            }

            fields.push(FieldInstruction {
                index: declaration.index(),
                metadata,
                encoder: bound.encoder,
                decoder: bound.decoder,
                encode_strategy: bound.encode_strategy,
                decode_strategy: bound.decode_strategy,
            });
        }

        Self { fields, by_name }
    }

    pub fn fields(&self) -> &[FieldInstruction<R>] {
        &self.fields
    }

    pub fn field_by_name(&self, column: &str) -> Option<&FieldInstruction<R>> {
        self.position_of(column).map(|position| &self.fields[position])
    }

    /// Offset of the instruction for `column` within [`fields`](Self::fields).
    pub fn position_of(&self, column: &str) -> Option<usize> {
        self.by_name.get(column).copied()
    }

    /// Column names in instruction order.
    pub fn header(&self) -> Vec<&str> {
        self.fields.iter().map(FieldInstruction::column).collect()
    }

    /// Encodes every field of `record`, in instruction order.
    pub fn encode_record(&self, record: &R) -> Result<Vec<String>, CsvError> {
        self.fields
            .iter()
            .map(|instruction| instruction.encode(record))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
