//! JSON Schema checks for the booking and anomaly file formats.
//!
//! Writers run these checks on the encoded artifact before it reaches
//! storage, so a file that exists on disk always matches its published
//! shape. The schemas are compiled once per process and cached.
//!
//! # Example
//! ```rust
//! use bookguard_core::format::validate_batch_output;
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let batch = json!([
//!     {"booking_id": 1, "listing_id": 3, "user_id": 2500,
//!      "booking_time": "2025-01-01 00:00:00", "status": "confirmed"},
//!     {"booking_id": "", "listing_id": "", "user_id": 1001,
//!      "booking_time": "", "status": "unknown"}
//! ]);
//!
//! validate_batch_output(&batch)?;
//! # Ok(())
//! # }
//! ```

use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::{Value, json};
use thiserror::Error;

use crate::models::{BookingField, Violation};

/// Output format validation errors
#[derive(Debug, Error)]
pub enum FormatError {
    /// Schema compilation failed
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation { message: String },

    /// The document does not match the schema
    #[error("Format validation failed with {error_count} errors: {errors:?}")]
    ValidationFailed {
        error_count: usize,
        errors: Vec<String>,
    },
}

static BATCH_SCHEMA: OnceLock<Validator> = OnceLock::new();
static REPORT_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// An unsigned integer id, the empty-string failure value, or `null`.
fn id_or_blank() -> Value {
    json!({
        "oneOf": [
            { "type": "integer", "minimum": 0 },
            { "const": "" },
            { "type": "null" }
        ]
    })
}

fn record_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "booking_id": id_or_blank(),
            "listing_id": id_or_blank(),
            "user_id": id_or_blank(),
            "booking_time": { "type": ["string", "null"] },
            "status": { "type": ["string", "null"] }
        }
    })
}

/// Schema of a booking batch file.
pub fn batch_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "BookGuard booking batch",
        "type": "array",
        "items": record_schema()
    })
}

/// Schema of an anomaly report file.
pub fn report_schema() -> Value {
    let tags: Vec<&str> = BookingField::ALL
        .into_iter()
        .map(|field| field.missing_violation().as_str())
        .chain(std::iter::once(Violation::InvalidStatus.as_str()))
        .collect();

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "BookGuard anomaly report",
        "type": "array",
        "items": {
            "type": "object",
            "required": ["record_index", "violations", "record"],
            "additionalProperties": false,
            "properties": {
                "record_index": { "type": "integer", "minimum": 0 },
                "violations": {
                    "type": "array",
                    "minItems": 1,
                    "uniqueItems": true,
                    "items": { "enum": tags }
                },
                "record": record_schema()
            }
        }
    })
}

fn compile(schema: &Value) -> Result<Validator, FormatError> {
    jsonschema::validator_for(schema).map_err(|e| FormatError::SchemaCompilation {
        message: format!("Schema compilation error: {}", e),
    })
}

fn cached(
    cell: &'static OnceLock<Validator>,
    schema: fn() -> Value,
) -> Result<&'static Validator, FormatError> {
    if let Some(validator) = cell.get() {
        return Ok(validator);
    }
    let compiled = compile(&schema())?;
    Ok(cell.get_or_init(|| compiled))
}

/// Compiles both schemas up front.
///
/// Optional; the validate functions compile on first use. Calling this at
/// startup surfaces a broken schema before any run work is done.
pub fn initialize_format_validators() -> Result<(), FormatError> {
    cached(&BATCH_SCHEMA, batch_schema)?;
    cached(&REPORT_SCHEMA, report_schema)?;
    Ok(())
}

fn check(validator: &Validator, value: &Value) -> Result<(), FormatError> {
    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|error| error.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(FormatError::ValidationFailed {
            error_count: errors.len(),
            errors,
        })
    }
}

/// Validates an encoded batch against the batch file schema.
pub fn validate_batch_output(value: &Value) -> Result<(), FormatError> {
    check(cached(&BATCH_SCHEMA, batch_schema)?, value)
}

/// Validates an encoded anomaly report against the report file schema.
pub fn validate_report_output(value: &Value) -> Result<(), FormatError> {
    check(cached(&REPORT_SCHEMA, report_schema)?, value)
}
