use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use sync_service::api::EloverblikClient;
use sync_service::auth::TokenProvider;
use sync_service::config::AppConfig;
use sync_service::store::Store;
use sync_service::sync::{MeterOutcome, SyncEngine, SyncReport};
use sync_service::observability;

/// Exit codes: 0 = success (including no-op), 1 = at least one meter
/// failed or the run aborted, 2 = startup error (config or credential).
const EXIT_SYNC_FAILED: u8 = 1;
const EXIT_STARTUP: u8 = 2;

#[derive(Parser)]
#[command(name = "eldata", about = "Sync eloverblik consumption data into a local store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// First time setup: download all data since 2019
    InitDb,
    /// Update the store with data since the last stored reading
    Update,
}

fn print_report(report: &SyncReport) {
    for meter in &report.meters {
        match &meter.outcome {
            MeterOutcome::Synced { rows } => {
                println!("{}: synced {} rows", meter.meter_id, rows)
            }
            MeterOutcome::Skipped => println!("{}: already up to date", meter.meter_id),
            MeterOutcome::Failed(e) => println!("{}: FAILED: {}", meter.meter_id, e),
        }
    }
    if report.tariff_rows > 0 {
        println!("tariff snapshot replaced ({} rows)", report.tariff_rows);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    observability::init_tracing();

    let cli = Cli::parse();

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(EXIT_STARTUP);
        }
    };

    let auth_http = match reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.api.timeout_secs))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("failed to build HTTP client: {e}");
            return ExitCode::from(EXIT_STARTUP);
        }
    };
    let tokens = TokenProvider::new(
        cfg.auth.token_path.clone(),
        cfg.api.base_url.clone(),
        auth_http,
    );

    // A sync is about to run, so a missing credential is a startup
    // error, not a lazy one.
    if let Err(e) = tokens.read_refresh_token() {
        eprintln!("{e}");
        return ExitCode::from(EXIT_STARTUP);
    }

    let client = match EloverblikClient::new(
        cfg.api.base_url.clone(),
        Duration::from_secs(cfg.api.timeout_secs),
        tokens,
    ) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("failed to build API client: {e}");
            return ExitCode::from(EXIT_STARTUP);
        }
    };

    let store = Store::new(cfg.store.path.clone(), cfg.store.batch_size);
    let engine = SyncEngine::new(Arc::new(client), store);

    let started = Instant::now();
    let result = match cli.command {
        Command::InitDb => {
            println!("Initializing the database...");
            engine.backfill().await
        }
        Command::Update => {
            println!("Updating the database...");
            engine.update().await
        }
    };

    match result {
        Ok(report) => {
            print_report(&report);
            println!("Done in {:.1?}", started.elapsed());
            if report.has_failures() {
                ExitCode::from(EXIT_SYNC_FAILED)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("sync aborted: {e}");
            ExitCode::from(EXIT_SYNC_FAILED)
        }
    }
}
