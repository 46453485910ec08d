use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

use invitation_sync::api::{
    DocumentStore, GoogleSheetsClient, RealtimeDatabaseClient, ServiceAccountAuth,
    ServiceAccountKey, SpreadsheetService,
};
use invitation_sync::config::{Config, ConfigError, load_env_file};
use invitation_sync::sync::{SyncJob, SyncSummary, run_sync};

#[derive(Parser)]
#[command(name = "invitation-sync")]
#[command(about = "Publish the guest list spreadsheet to the invitation database")]
#[command(version)]
struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Write invitation links back to the sheet even if REGENERATE_LINK is off
    #[arg(long)]
    regenerate_links: bool,

    /// Read and build everything, print the guest map, write nothing
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "invitation_sync=info",
        1 => "invitation_sync=debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load the env file before the logger so RUST_LOG from it applies
    let env_loaded = load_env_file(cli.env_file.as_deref());
    init_logging(cli.verbose);

    if let Err(e) = run(cli, env_loaded).await {
        error!("{:#}", e);
        // The log filter may exclude this crate, stderr always gets the cause
        eprintln!("{} {}", "Error:".red().bold(), describe_error(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, env_loaded: Result<(), ConfigError>) -> Result<()> {
    env_loaded?;
    let config = Config::from_env(cli.regenerate_links)?;

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let key = ServiceAccountKey::from_file(&config.credentials_path)?;
    let auth = Arc::new(ServiceAccountAuth::new(key, http.clone()));
    info!("Using service account {}", auth.client_email());

    let sheets: Arc<dyn SpreadsheetService> = Arc::new(GoogleSheetsClient::new(
        http.clone(),
        auth.clone(),
        &config.sheet_id,
    ));
    let store: Arc<dyn DocumentStore> =
        Arc::new(RealtimeDatabaseClient::new(http, auth, &config.database_url));

    let job = SyncJob::from_config(&config, cli.dry_run);
    let summary = run_sync(&job, sheets, store).await?;

    print_summary(&job, &summary)
}

/// Full error chain on one line, outermost context first
fn describe_error(e: &anyhow::Error) -> String {
    format!("{:#}", e)
}

fn print_summary(job: &SyncJob, summary: &SyncSummary) -> Result<()> {
    if job.dry_run {
        let json = serde_json::to_string_pretty(&summary.map)
            .context("Failed to render guest map")?;
        println!("{}", json);
        eprintln!(
            "{} {} guests from {} rows (nothing written)",
            "Dry run:".yellow().bold(),
            summary.map.len(),
            summary.rows
        );
        return Ok(());
    }

    eprintln!(
        "{} {} guests to '{}', details to '{}'",
        "Published".green().bold(),
        summary.map.len(),
        job.paths.guests,
        job.paths.details
    );

    if summary.overwritten() > 0 {
        eprintln!(
            "{} {} rows shared a key with a later row and were replaced",
            "Note:".yellow().bold(),
            summary.overwritten()
        );
    }

    if let Some(links) = &summary.links {
        let line = format!("Links: {}/{} written", links.written, links.attempted);
        if links.is_complete() {
            eprintln!("{}", line.green());
        } else {
            eprintln!("{} ({} failed writes)", line.red(), links.failures.len());
        }
    }

    Ok(())
}
