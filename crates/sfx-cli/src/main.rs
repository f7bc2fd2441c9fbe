//! Thin CLI shell over the snowflake-extractor core (§6): `sfx-extract
//! [--force] [--restart]`. Wires the concrete Postgres and file-based
//! adapters to the trait-level core (`sfx-schema`, `sfx-graph`, `sfx-sql`,
//! `sfx-doc`, `sfx-encode`, `sfx-driver`) and drives the batch loop to
//! completion or fatal error.

mod settings;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sfx_core::{CheckpointStore, Destination, RetryOnce};
use sfx_driver::{build_extraction_plan, check_drift, load_checkpoint_state, run_batch, CheckpointState};
use sfx_encode::SchemaMirror;
use sfx_postgres::{PgCheckpointStore, PgIntrospector, PgSourceExecutor};
use sfx_schema::Introspector;
use sfx_sql::PostgresDialect;
use settings::load_settings;

const CHECKPOINT_TABLE: &str = "sfx_checkpoint";

/// `sfx-extract`: incrementally snowflake-extracts `root_table` and its
/// configured relations into the destination, resuming from the last
/// checkpoint unless `--restart` is given.
#[derive(Debug, Parser)]
#[command(name = "sfx-extract", version)]
struct Cli {
    /// Path to the TOML settings file (§6's enumerated configuration).
    #[arg(long, default_value = "sfx.toml")]
    config: PathBuf,

    /// Promote the current schema fingerprint instead of halting on drift
    /// (sets `drift.allow_override`).
    #[arg(long)]
    force: bool,

    /// Reset the checkpoint to `(0, 0)` before extracting, re-processing
    /// the entire source from the beginning.
    #[arg(long)]
    restart: bool,

    /// Tracing verbosity (`error`, `warn`, `info`, `debug`, `trace`).
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            tracing::error!(error = %err, "extraction failed");
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str) {
    let ansi = std::env::var_os("NO_COLOR").is_none();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_ansi(ansi)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = load_settings(&cli.config)?;
    if cli.force {
        settings.driver.drift_allow_override = true;
    }

    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect(&settings.source.dsn)
        .await?;

    let introspector = PgIntrospector::new(pool.clone(), settings.source.schema.clone());
    let schema = introspector.introspect().await?;

    let extraction = build_extraction_plan(&schema, &settings.driver, &PostgresDialect)?;

    let checkpoint = PgCheckpointStore::new(pool.clone(), CHECKPOINT_TABLE);
    checkpoint.ensure_schema().await?;

    check_drift(&checkpoint, &settings.driver, &extraction.sql).await?;

    if cli.restart {
        tracing::info!("--restart: resetting checkpoint to (0, 0)");
        checkpoint
            .set(&settings.driver.state_key(), CheckpointState::default().to_bytes())
            .await?;
    }
    let mut state = load_checkpoint_state(&checkpoint, &settings.driver).await?;

    let source = PgSourceExecutor::new(
        pool,
        Duration::from_millis(settings.driver.statement_timeout_ms),
    );
    let destination = sfx_destination_file::FileDestination::new(&settings.destination.path);
    destination.ensure_table().await?;

    let mut mirror = SchemaMirror::new();

    // §5: a cancel signal between batches is honored cleanly; a batch
    // already in flight always runs to completion (or failure) first.
    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("signal received, stopping after the in-flight batch");
                cancelled.store(true, Ordering::SeqCst);
            }
        });
    }

    loop {
        if cancelled.load(Ordering::SeqCst) {
            tracing::info!("cancelled between batches, checkpoint unchanged");
            break;
        }

        let mut retry = RetryOnce::new();
        let outcome = run_batch(
            &extraction,
            &source,
            &destination,
            &checkpoint,
            &mut mirror,
            &settings.driver,
            &PostgresDialect,
            &settings.source.pk_column,
            &settings.source.last_modified_column,
            &mut state,
            &mut retry,
        )
        .await?;

        if outcome.documents == 0 {
            tracing::info!("caught up, terminating cleanly");
            break;
        }
        tracing::info!(documents = outcome.documents, "pushed batch to destination");
    }

    Ok(())
}
