//! Booking data quality pipeline.
//!
//! This binary is the trigger for one pipeline run: it generates a batch of
//! synthetic bookings with injected defects, validates it, and writes an
//! anomaly report next to it. Scheduling is left to the caller (cron, a
//! workflow engine, ...), which supplies the execution timestamp.

use std::path::PathBuf;

use bookguard_core::{
    BookingGenerator, FileStore, GeneratorConfig, LocationKey, Result, RunContext,
    ValidationSummary, config::DEFAULT_FIELD_SUCCESS_PROB, format::initialize_format_validators,
    generate_bookings, init_logging, storage::DEFAULT_DATA_ROOT, validate_bookings,
};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "bookguard")]
#[command(about = "Booking data quality pipeline")]
#[command(version)]
#[command(long_about = "
BookGuard - synthetic booking generation and anomaly reporting

Each run writes two files under <data-root>/<YYYY-MM-DD_HH-MM>/:
- bookings.json   the generated batch, with a fraction of fields corrupted
- anomalies.json  every record that failed a check, with its violations

CHECKS:
- booking_id, listing_id, user_id, booking_time, status present and non-empty
- status is one of confirmed, pending, cancelled

EXAMPLES:
  bookguard run
  bookguard run --execution-time 2025-01-01T00:00:00Z --seed 42
  bookguard generate --success-prob 0.5
  bookguard validate --key 2025-01-01_00-00
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a booking batch and print its location key
    Generate(GenerateArgs),
    /// Validate a previously generated batch
    Validate(ValidateArgs),
    /// Generate then validate, in order
    Run(GenerateArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Execution timestamp supplied by the scheduler
    #[arg(
        long,
        help = "Execution timestamp (RFC 3339); defaults to the current time"
    )]
    pub execution_time: Option<DateTime<Utc>>,

    /// Seed for the random source
    #[arg(
        long,
        env = "BOOKGUARD_SEED",
        help = "Seed for reproducible batches"
    )]
    pub seed: Option<u64>,

    /// Per-field success probability
    #[arg(
        long,
        default_value_t = DEFAULT_FIELD_SUCCESS_PROB,
        help = "Probability (0.0-1.0) that each field is well-formed"
    )]
    pub success_prob: f64,

    /// Smallest batch size
    #[arg(long, default_value_t = 5, help = "Minimum number of records")]
    pub min_records: usize,

    /// Largest batch size
    #[arg(long, default_value_t = 15, help = "Maximum number of records")]
    pub max_records: usize,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Location key printed by `generate`
    #[arg(long, help = "Location key of the batch (YYYY-MM-DD_HH-MM)")]
    pub key: String,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Directory holding one sub-directory per run
    #[arg(
        long,
        global = true,
        env = "BOOKGUARD_DATA_ROOT",
        default_value = DEFAULT_DATA_ROOT,
        help = "Root directory for run artifacts"
    )]
    pub data_root: PathBuf,

    /// Print the validation summary as JSON
    #[arg(long, global = true, help = "Print the validation summary as JSON")]
    pub json: bool,

    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    initialize_format_validators().map_err(|e| {
        bookguard_core::PipelineError::configuration(format!(
            "Failed to initialize format validators: {}",
            e
        ))
    })?;

    let store = FileStore::new(&cli.global.data_root);

    match &cli.command {
        Command::Generate(args) => {
            let key = generate(args, &store).await?;
            println!("{}", key);
            Ok(())
        }
        Command::Validate(args) => {
            let key = LocationKey::parse(args.key.as_str())?;
            let summary = validate_bookings(&store, &key).await.map_err(|e| {
                error!("Validation failed for {}: {}", key, e);
                e
            })?;
            print_summary(&summary, cli.global.json)
        }
        Command::Run(args) => {
            let key = generate(args, &store).await?;
            let summary = validate_bookings(&store, &key).await.map_err(|e| {
                error!("Validation failed for {}: {}", key, e);
                e
            })?;
            print_summary(&summary, cli.global.json)
        }
    }
}

/// Runs the generation stage for the CLI arguments.
async fn generate(args: &GenerateArgs, store: &FileStore) -> Result<LocationKey> {
    let config = GeneratorConfig::new()
        .with_batch_size(args.min_records, args.max_records)
        .with_field_success_prob(args.success_prob);
    let generator = BookingGenerator::new(config)?;

    let ctx = RunContext::new(args.execution_time.unwrap_or_else(Utc::now));
    let mut rng = match args.seed {
        Some(seed) => {
            info!("Using seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    generate_bookings(&ctx, &generator, store, &mut rng)
        .await
        .map_err(|e| {
            error!("Generation failed: {}", e);
            e
        })
}

fn print_summary(summary: &ValidationSummary, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(summary).map_err(|e| {
            bookguard_core::PipelineError::serialization("Validation summary", e)
        })?;
        println!("{}", text);
        return Ok(());
    }

    println!("Location: {}", summary.location_key);
    println!("Records checked: {}", summary.records_checked);
    println!("Anomalies: {}", summary.anomalies);
    for (violation, count) in &summary.violation_counts {
        println!("  {}: {}", violation, count);
    }
    Ok(())
}
