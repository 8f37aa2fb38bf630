//! JSON Schema validation for extracted records.
//!
//! Records are validated against schema/extracted_record.schema.json before
//! deserialization, so a broken extraction contract fails with every
//! offending location rather than the first serde error.

use std::sync::OnceLock;

/// Embedded record schema (loaded at compile time).
const RECORD_SCHEMA_JSON: &str = include_str!("../../../../schema/extracted_record.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn get_validator() -> Result<&'static jsonschema::Validator, String> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(RECORD_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result.as_ref().map_err(Clone::clone)
}

/// Validate a raw record value against the schema.
///
/// Returns every validation error message, each with its instance path.
pub fn validate_record_schema(record_json: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e])?;

    let errors: Vec<String> = validator
        .iter_errors(record_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
