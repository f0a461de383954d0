//! Booking batch validation.
//!
//! Every record is checked against the fixed schema: all five fields must
//! be present and non-empty, and `status` must be an accepted
//! [`BookingStatus`]. The two checks are independent, so an empty status
//! carries both `missing_status` and `invalid_status`.
//!
//! [`BookingStatus`]: crate::models::BookingStatus

use crate::models::{AnomalyEntry, AnomalyReport, Batch, BookingField, BookingRecord, Violation};

/// Returns the violations for a single record.
///
/// Missing-field tags come first, in field order, followed by
/// `invalid_status` when the status check fails.
pub fn validate_record(record: &BookingRecord) -> Vec<Violation> {
    let mut violations: Vec<Violation> = BookingField::ALL
        .into_iter()
        .filter(|field| record.is_blank(*field))
        .map(BookingField::missing_violation)
        .collect();

    if record.parsed_status().is_none() {
        violations.push(Violation::InvalidStatus);
    }

    violations
}

/// Validates a batch, returning one entry per record with any violation.
///
/// Clean records are omitted. Entries keep ascending batch order.
pub fn validate(batch: &Batch) -> AnomalyReport {
    let entries: Vec<AnomalyEntry> = batch
        .iter()
        .enumerate()
        .filter_map(|(record_index, record)| {
            let violations = validate_record(record);
            if violations.is_empty() {
                return None;
            }
            tracing::trace!("Record {} flagged: {:?}", record_index, violations);
            Some(AnomalyEntry {
                record_index,
                violations,
                record: record.clone(),
            })
        })
        .collect();

    tracing::debug!(
        "Validated {} records, {} flagged",
        batch.len(),
        entries.len()
    );
    AnomalyReport::new(entries)
}
