//! The two pipeline stages and their hand-off.
//!
//! [`generate_bookings`] persists a batch and returns the run's
//! [`LocationKey`]; that return value is the only input
//! [`validate_bookings`] needs. Each stage either completes or fails before
//! writing its artifact.

use std::collections::BTreeMap;

use rand::Rng;
use serde::Serialize;

use crate::codec;
use crate::config::{LocationKey, RunContext};
use crate::error::{PipelineError, Result};
use crate::format;
use crate::generator::BookingGenerator;
use crate::storage::{ArtifactKind, ArtifactStore};
use crate::validator;

/// Outcome of a validation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    /// Run the report belongs to
    pub location_key: LocationKey,
    /// Records read from the batch
    pub records_checked: usize,
    /// Records with at least one violation
    pub anomalies: usize,
    /// Per-tag violation totals
    pub violation_counts: BTreeMap<String, usize>,
}

/// Checks encoded artifact bytes against their file schema.
fn checked_bytes(
    bytes: Vec<u8>,
    what: &str,
    check: fn(&serde_json::Value) -> std::result::Result<(), format::FormatError>,
) -> Result<Vec<u8>> {
    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| PipelineError::serialization(format!("Re-reading encoded {}", what), e))?;
    check(&value).map_err(|e| PipelineError::format(what.to_string(), e))?;
    Ok(bytes)
}

/// Generates a batch for `ctx` and persists it.
///
/// Returns the location key under which the batch was written.
pub async fn generate_bookings<R: Rng + ?Sized>(
    ctx: &RunContext,
    generator: &BookingGenerator,
    store: &dyn ArtifactStore,
    rng: &mut R,
) -> Result<LocationKey> {
    let key = ctx.location_key();
    let batch = generator.generate(ctx, rng);

    let bytes = checked_bytes(
        codec::serialize_batch(&batch)?,
        "booking batch",
        format::validate_batch_output,
    )?;
    store
        .write_artifact(&key, ArtifactKind::Bookings, &bytes)
        .await?;

    tracing::info!(
        "Written to file: {}",
        store.location(&key, ArtifactKind::Bookings)
    );
    tracing::debug!("Batch contains {} bookings", batch.len());
    Ok(key)
}

/// Validates the batch stored under `key` and persists its anomaly report.
///
/// # Errors
/// Fails with [`PipelineError::NotFound`] or [`PipelineError::Decode`] when
/// the batch is absent or corrupt; no report is written in that case.
pub async fn validate_bookings(
    store: &dyn ArtifactStore,
    key: &LocationKey,
) -> Result<ValidationSummary> {
    let raw = store.read_artifact(key, ArtifactKind::Bookings).await?;
    let batch = codec::deserialize_batch(&raw)?;
    let report = validator::validate(&batch);

    let bytes = checked_bytes(
        codec::serialize_report(&report)?,
        "anomaly report",
        format::validate_report_output,
    )?;
    store
        .write_artifact(key, ArtifactKind::Anomalies, &bytes)
        .await?;

    tracing::info!(
        "Anomalies written to file: {}",
        store.location(key, ArtifactKind::Anomalies)
    );
    tracing::info!("Total anomalies: {}", report.len());

    Ok(ValidationSummary {
        location_key: key.clone(),
        records_checked: batch.len(),
        anomalies: report.len(),
        violation_counts: report
            .violation_counts()
            .into_iter()
            .map(|(violation, count)| (violation.as_str().to_string(), count))
            .collect(),
    })
}

/// Runs both stages in strict sequence.
pub async fn run_pipeline<R: Rng + ?Sized>(
    ctx: &RunContext,
    generator: &BookingGenerator,
    store: &dyn ArtifactStore,
    rng: &mut R,
) -> Result<ValidationSummary> {
    let key = generate_bookings(ctx, generator, store, rng).await?;
    validate_bookings(store, &key).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::models::{Batch, BookingRecord, Field, Violation};
    use crate::storage::FileStore;
    use chrono::{TimeZone, Utc};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn context() -> RunContext {
        RunContext::new(Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap())
    }

    #[tokio::test]
    async fn test_pipeline_clean_batch_yields_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let generator =
            BookingGenerator::new(GeneratorConfig::new().with_field_success_prob(1.0)).unwrap();

        let summary = run_pipeline(&context(), &generator, &store, &mut StdRng::seed_from_u64(5))
            .await
            .unwrap();

        assert_eq!(summary.location_key.as_str(), "2025-03-04_05-06");
        assert!((5..=15).contains(&summary.records_checked));
        assert_eq!(summary.anomalies, 0);
        assert!(summary.violation_counts.is_empty());

        let report_path = store.artifact_path(&summary.location_key, ArtifactKind::Anomalies);
        let report = std::fs::read(report_path).unwrap();
        assert_eq!(report, b"[]");
    }

    #[tokio::test]
    async fn test_pipeline_all_failures_flags_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let generator =
            BookingGenerator::new(GeneratorConfig::new().with_field_success_prob(0.0)).unwrap();

        let summary = run_pipeline(&context(), &generator, &store, &mut StdRng::seed_from_u64(5))
            .await
            .unwrap();

        assert_eq!(summary.anomalies, summary.records_checked);
        assert_eq!(
            summary.violation_counts.get("missing_booking_id"),
            Some(&summary.records_checked)
        );
        assert_eq!(
            summary.violation_counts.get("invalid_status"),
            Some(&summary.records_checked)
        );
    }

    #[tokio::test]
    async fn test_pipeline_validate_missing_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let key = context().location_key();

        let error = validate_bookings(&store, &key).await.unwrap_err();

        assert!(error.is_not_found());
        assert!(!store.artifact_path(&key, ArtifactKind::Anomalies).exists());
    }

    #[tokio::test]
    async fn test_pipeline_validate_corrupt_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let key = context().location_key();
        store
            .write_artifact(&key, ArtifactKind::Bookings, b"{ definitely not a batch")
            .await
            .unwrap();

        let error = validate_bookings(&store, &key).await.unwrap_err();

        assert!(matches!(error, PipelineError::Decode { .. }));
        assert!(!store.artifact_path(&key, ArtifactKind::Anomalies).exists());
    }

    #[tokio::test]
    async fn test_pipeline_validates_hand_written_batch() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let key = LocationKey::parse("manual").unwrap();
        let batch = Batch::new(vec![
            BookingRecord {
                booking_id: Field::Value(1),
                listing_id: Field::Value(2),
                user_id: Field::Value(3000),
                booking_time: Field::text("2025-01-01 00:00:00"),
                status: Field::text("unknown"),
            },
            BookingRecord {
                booking_id: Field::Value(2),
                listing_id: Field::Value(2),
                user_id: Field::Value(3000),
                booking_time: Field::text("2025-01-01 00:00:00"),
                status: Field::text("cancelled"),
            },
        ]);
        store
            .write_artifact(
                &key,
                ArtifactKind::Bookings,
                &codec::serialize_batch(&batch).unwrap(),
            )
            .await
            .unwrap();

        let summary = validate_bookings(&store, &key).await.unwrap();
        assert_eq!(summary.records_checked, 2);
        assert_eq!(summary.anomalies, 1);

        let report = codec::deserialize_report(
            &store
                .read_artifact(&key, ArtifactKind::Anomalies)
                .await
                .unwrap(),
        )
        .unwrap();
        assert_eq!(report.flagged_records(), vec![0]);
    }

    #[tokio::test]
    async fn test_pipeline_reports_zero_booking_id_without_failing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let key = LocationKey::parse("zero-id").unwrap();
        store
            .write_artifact(
                &key,
                ArtifactKind::Bookings,
                br#"[{"booking_id": 0, "listing_id": 1, "user_id": 1000,
                      "booking_time": "2025-01-01 00:00:00", "status": "unknown"}]"#,
            )
            .await
            .unwrap();

        let summary = validate_bookings(&store, &key).await.unwrap();
        assert_eq!(summary.anomalies, 1);

        let report = codec::deserialize_report(
            &store
                .read_artifact(&key, ArtifactKind::Anomalies)
                .await
                .unwrap(),
        )
        .unwrap();
        assert_eq!(report.entries()[0].record.booking_id, Field::Value(0));
        assert_eq!(report.entries()[0].violations, vec![Violation::InvalidStatus]);
    }

    #[tokio::test]
    async fn test_pipeline_report_keeps_record_as_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let key = LocationKey::parse("nulls").unwrap();
        store
            .write_artifact(
                &key,
                ArtifactKind::Bookings,
                br#"[{"booking_id": 1, "listing_id": null, "user_id": 1000,
                      "booking_time": "2025-01-01 00:00:00", "status": "pending"}]"#,
            )
            .await
            .unwrap();

        validate_bookings(&store, &key).await.unwrap();

        let raw = store
            .read_artifact(&key, ArtifactKind::Anomalies)
            .await
            .unwrap();
        let report: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(
            report[0]["record"],
            serde_json::json!({
                "booking_id": 1,
                "listing_id": null,
                "user_id": 1000,
                "booking_time": "2025-01-01 00:00:00",
                "status": "pending"
            })
        );
    }

    #[tokio::test]
    async fn test_pipeline_unknown_keys_abort_before_report() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let key = LocationKey::parse("extra-key").unwrap();
        store
            .write_artifact(
                &key,
                ArtifactKind::Bookings,
                br#"[{"booking_id": 1, "status": "pending", "note": "x"}]"#,
            )
            .await
            .unwrap();

        let error = validate_bookings(&store, &key).await.unwrap_err();

        assert!(matches!(error, PipelineError::Decode { .. }));
        assert!(!store.artifact_path(&key, ArtifactKind::Anomalies).exists());
    }
}
