//! Generator and run configuration.
//!
//! The scheduler's execution timestamp is passed in explicitly through
//! [`RunContext`]; nothing in this crate reads ambient time on its own.

use std::fmt;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default probability that a generated field is well-formed.
pub const DEFAULT_FIELD_SUCCESS_PROB: f64 = 0.7;

/// Directory-name format of a run's location key.
pub const LOCATION_KEY_FORMAT: &str = "%Y-%m-%d_%H-%M";

/// Format of generated `booking_time` values.
pub const BOOKING_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Validation errors for generator configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigValidationError {
    #[error("batch_size_min ({min}) must not exceed batch_size_max ({max})")]
    InvalidBatchRange { min: usize, max: usize },
    #[error("field_success_prob must be between 0.0 and 1.0, got {0}")]
    InvalidProbability(f64),
    #[error("listing_catalog must contain at least one listing")]
    EmptyCatalog,
    #[error("user_id_min ({min}) must not exceed user_id_max ({max})")]
    InvalidUserRange { min: u32, max: u32 },
}

/// Synthetic batch generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Smallest batch size (inclusive)
    pub batch_size_min: usize,
    /// Largest batch size (inclusive)
    pub batch_size_max: usize,
    /// Probability (0.0-1.0) that each field is generated well-formed
    pub field_success_prob: f64,
    /// Listings a booking may reference
    pub listing_catalog: Vec<u32>,
    /// Lowest generated user id (inclusive)
    pub user_id_min: u32,
    /// Highest generated user id (inclusive)
    pub user_id_max: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            batch_size_min: 5,
            batch_size_max: 15,
            field_success_prob: DEFAULT_FIELD_SUCCESS_PROB,
            listing_catalog: vec![1, 2, 3, 4, 5],
            user_id_min: 1000,
            user_id_max: 5000,
        }
    }
}

impl GeneratorConfig {
    /// Creates a new generator config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the inclusive batch size range.
    pub fn with_batch_size(mut self, min: usize, max: usize) -> Self {
        self.batch_size_min = min;
        self.batch_size_max = max;
        self
    }

    /// Builder method to set the per-field success probability.
    pub fn with_field_success_prob(mut self, prob: f64) -> Self {
        if !(0.0..=1.0).contains(&prob) {
            tracing::warn!(
                "field_success_prob {} clamped to valid range [0.0, 1.0]",
                prob
            );
        }
        // NaN survives clamp and is rejected by validate()
        self.field_success_prob = prob.clamp(0.0, 1.0);
        self
    }

    /// Builder method to replace the listing catalog.
    pub fn with_listing_catalog(mut self, catalog: impl Into<Vec<u32>>) -> Self {
        self.listing_catalog = catalog.into();
        self
    }

    /// Builder method to set the inclusive user id range.
    pub fn with_user_id_range(mut self, min: u32, max: u32) -> Self {
        self.user_id_min = min;
        self.user_id_max = max;
        self
    }

    /// Inclusive batch size range.
    pub fn batch_size_range(&self) -> RangeInclusive<usize> {
        self.batch_size_min..=self.batch_size_max
    }

    /// Inclusive user id range.
    pub fn user_id_range(&self) -> RangeInclusive<u32> {
        self.user_id_min..=self.user_id_max
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.batch_size_min > self.batch_size_max {
            return Err(ConfigValidationError::InvalidBatchRange {
                min: self.batch_size_min,
                max: self.batch_size_max,
            });
        }
        if !(0.0..=1.0).contains(&self.field_success_prob) {
            return Err(ConfigValidationError::InvalidProbability(
                self.field_success_prob,
            ));
        }
        if self.listing_catalog.is_empty() {
            return Err(ConfigValidationError::EmptyCatalog);
        }
        if self.user_id_min > self.user_id_max {
            return Err(ConfigValidationError::InvalidUserRange {
                min: self.user_id_min,
                max: self.user_id_max,
            });
        }
        Ok(())
    }
}

/// Identifies where one run's artifacts live.
///
/// Derived from the run's execution timestamp at minute resolution, so two
/// scheduled runs never share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationKey(String);

impl LocationKey {
    /// Wraps an existing key, rejecting values that could escape the data root.
    pub fn parse(key: impl Into<String>) -> Result<Self, crate::PipelineError> {
        let key = key.into();
        let is_safe = !key.is_empty()
            && key != "."
            && key != ".."
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !is_safe {
            return Err(crate::PipelineError::configuration(format!(
                "Invalid location key '{}'",
                key
            )));
        }
        Ok(Self(key))
    }

    /// The key as a directory name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Explicit execution context supplied by the trigger for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    /// Scheduler-supplied execution timestamp
    pub execution_time: DateTime<Utc>,
}

impl RunContext {
    /// Creates a context for the given execution time.
    pub const fn new(execution_time: DateTime<Utc>) -> Self {
        Self { execution_time }
    }

    /// Storage location key for this run.
    pub fn location_key(&self) -> LocationKey {
        LocationKey(self.execution_time.format(LOCATION_KEY_FORMAT).to_string())
    }

    /// Value written into well-formed `booking_time` fields.
    pub fn booking_time(&self) -> String {
        self.execution_time.format(BOOKING_TIME_FORMAT).to_string()
    }
}
