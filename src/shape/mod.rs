//! Record shapes and their cached field instructions.
//!
//! A record type describes its fields once through [`CsvRecord::shape`]. Each
//! tagged field is parsed ([`TagMetadata`]), resolved against the
//! capabilities of its type and turned into a [`FieldInstruction`]. The
//! resulting [`InstructionSet`] is built at most once per type and shared
//! through a [`ShapeCache`].

mod cache;
mod instruction;
mod record;
mod tag;

pub use cache::ShapeCache;
pub use instruction::{FieldInstruction, InstructionSet};
pub use record::{CsvRecord, FieldDeclaration, RecordShape, ShapeBuilder};
pub use tag::{TagMetadata, TagOption, SKIP_MARKER};
