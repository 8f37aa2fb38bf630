//! Extracted records and their provenance inputs.
//!
//! An extracted record is the structured output of the extraction service:
//! a patient identifier plus the six registry sections. Raw input is
//! validated against an embedded JSON Schema before it is deserialized.

mod parser;
mod schema;
mod sources;

pub use parser::{ExtractedRecord, FieldValues, RecordError};
pub use schema::validate_record_schema;
pub use sources::SourceMap;
