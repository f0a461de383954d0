//! Text encoding of batches and anomaly reports.
//!
//! Both artifacts are UTF-8 JSON arrays of field-mapping objects, indented
//! with four spaces. Field order follows the record definition.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::PrettyFormatter;

use crate::error::{PipelineError, Result};
use crate::models::{AnomalyReport, Batch};

const INDENT: &[u8] = b"    ";

fn to_pretty_bytes<T: Serialize>(value: &T, what: &str) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| PipelineError::serialization(format!("Failed to encode {}", what), e))?;
    Ok(buffer)
}

fn from_bytes<T: DeserializeOwned>(bytes: &[u8], what: &str) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| PipelineError::decode(format!("Failed to decode {}", what), e))
}

/// Encodes a batch.
pub fn serialize_batch(batch: &Batch) -> Result<Vec<u8>> {
    to_pretty_bytes(batch, "booking batch")
}

/// Decodes a batch, failing with [`PipelineError::Decode`] on malformed input.
pub fn deserialize_batch(bytes: &[u8]) -> Result<Batch> {
    from_bytes(bytes, "booking batch")
}

/// Encodes an anomaly report.
pub fn serialize_report(report: &AnomalyReport) -> Result<Vec<u8>> {
    to_pretty_bytes(report, "anomaly report")
}

/// Decodes an anomaly report.
pub fn deserialize_report(bytes: &[u8]) -> Result<AnomalyReport> {
    from_bytes(bytes, "anomaly report")
}
