//! Core library for BookGuard, a booking data quality pipeline.
//!
//! A run has two stages executed in strict order:
//! 1. **Generate**: synthesize a batch of booking records with a fraction of
//!    deliberately corrupted fields and persist it under the run's location
//!    key.
//! 2. **Validate**: read that batch back, check every record against the
//!    booking schema and persist an anomaly report next to it.
//!
//! # Guarantees
//! - Generation and validation are synchronous and deterministic given the
//!   injected random source and execution timestamp
//! - Artifacts are schema-checked before being written and are written
//!   all-or-nothing
//! - A missing or corrupt batch aborts validation before any report exists
//!
//! # Example
//! ```rust,no_run
//! use bookguard_core::{BookingGenerator, FileStore, GeneratorConfig, RunContext, run_pipeline};
//! use rand::SeedableRng;
//!
//! # async fn example() -> bookguard_core::Result<()> {
//! let generator = BookingGenerator::new(GeneratorConfig::default())?;
//! let store = FileStore::default();
//! let ctx = RunContext::new(chrono::Utc::now());
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//!
//! let summary = run_pipeline(&ctx, &generator, &store, &mut rng).await?;
//! println!("{} anomalies", summary.anomalies);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod generator;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod validator;

// Re-export commonly used types
pub use config::{ConfigValidationError, GeneratorConfig, LocationKey, RunContext};
pub use error::{PipelineError, Result};
pub use generator::BookingGenerator;
pub use logging::init_logging;
pub use models::{
    AnomalyEntry, AnomalyReport, Batch, BookingField, BookingRecord, BookingStatus, Field,
    Violation,
};
pub use pipeline::{ValidationSummary, generate_bookings, run_pipeline, validate_bookings};
pub use storage::{ArtifactKind, ArtifactStore, FileStore};
pub use validator::{validate, validate_record};
