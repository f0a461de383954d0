//! Synthetic booking generation.
//!
//! Each field is drawn independently: with probability
//! `field_success_prob` it receives a value from its domain, otherwise its
//! failure value. Every field fails as the empty string except `status`,
//! which fails to one of [`MALFORMED_STATUSES`] so that a status can be
//! wrong while still present.
//!
//! The random source is always supplied by the caller.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::{ConfigValidationError, GeneratorConfig, RunContext};
use crate::models::{Batch, BookingRecord, BookingStatus, Field, MALFORMED_STATUSES};

/// Produces batches of synthetic bookings with injected defects.
#[derive(Debug, Clone)]
pub struct BookingGenerator {
    config: GeneratorConfig,
}

impl BookingGenerator {
    /// Creates a generator, rejecting invalid configuration.
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns a reference to the generator configuration.
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates one batch for the given run.
    ///
    /// The batch size is drawn uniformly from the configured inclusive range.
    pub fn generate<R: Rng + ?Sized>(&self, ctx: &RunContext, rng: &mut R) -> Batch {
        let size = rng.random_range(self.config.batch_size_range());
        let booking_time = ctx.booking_time();

        let batch: Batch = (0..size)
            .map(|index| self.generate_record(index, &booking_time, rng))
            .collect();

        tracing::debug!(
            "Generated {} bookings for {}",
            batch.len(),
            ctx.location_key()
        );
        batch
    }

    /// Generates the record at `index` (zero-based) in a batch.
    pub fn generate_record<R: Rng + ?Sized>(
        &self,
        index: usize,
        booking_time: &str,
        rng: &mut R,
    ) -> BookingRecord {
        let booking_id = if self.succeeds(rng) {
            let id = u64::try_from(index).map_or(u64::MAX, |i| i.saturating_add(1));
            Field::Value(id)
        } else {
            Field::Empty
        };

        let listing_id = if self.succeeds(rng) {
            self.config
                .listing_catalog
                .choose(rng)
                .map_or(Field::Empty, |listing| Field::Value(*listing))
        } else {
            Field::Empty
        };

        let user_id = if self.succeeds(rng) {
            Field::Value(rng.random_range(self.config.user_id_range()))
        } else {
            Field::Empty
        };

        let booking_time = if self.succeeds(rng) {
            Field::text(booking_time)
        } else {
            Field::Empty
        };

        let status = if self.succeeds(rng) {
            BookingStatus::ALL
                .choose(rng)
                .map_or(Field::Empty, |status| Field::text(status.as_str()))
        } else {
            MALFORMED_STATUSES
                .choose(rng)
                .map_or(Field::Empty, |status| Field::text(*status))
        };

        BookingRecord {
            booking_id,
            listing_id,
            user_id,
            booking_time,
            status,
        }
    }

    fn succeeds<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.random::<f64>() < self.config.field_success_prob
    }
}
