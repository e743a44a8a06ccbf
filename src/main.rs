// src/main.rs
mod analysis;
mod config;
mod dart;
mod ingest;
mod markup;
mod storage;
mod utils;

use analysis::{OpenAiClient, ReportAnalyzer};
use config::{Command, IngestArgs, OutputFormat, Settings, WorkerArgs};
use dart::DartClient;
use ingest::{DirectorySync, Ingestor};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use storage::{ReportArchive, SqliteStore};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use utils::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI arguments (after loading .env so RUST_LOG from it applies)
    let cli = config::load();

    // 2. Setup logging (reads RUST_LOG env var)
    utils::logging::setup_logging();
    tracing::debug!("Running {:?}", cli.command);

    match &cli.command {
        Command::Ingest(args) => run_ingest(&cli.settings, args).await,
        Command::SyncCompanies => run_sync(&cli.settings).await,
        Command::Parse { file, format } => run_parse(&cli.settings, file, *format),
        Command::Worker(args) => run_worker(&cli.settings, args).await,
    }
}

fn open_store(settings: &Settings) -> Result<Arc<SqliteStore>, AppError> {
    Ok(Arc::new(SqliteStore::open(&settings.database_path)?))
}

fn dart_client(settings: &Settings) -> Result<DartClient, AppError> {
    let http = dart::client::build_http_client(settings.http_timeout())?;
    Ok(DartClient::new(http, &settings.dart_base_url, settings.dart_api_key()?))
}

fn build_ingestor(settings: &Settings, store: Arc<SqliteStore>, limit: Option<usize>) -> Result<Ingestor, AppError> {
    let llm = OpenAiClient::new(
        OpenAiClient::build_http_client(settings.llm_timeout())?,
        &settings.openai_base_url,
        settings.openai_api_key()?,
        &settings.openai_model,
    );
    tracing::info!("Extraction model: {}", llm.model());

    let archive = settings.archive_dir.as_ref().map(ReportArchive::new).transpose()?;

    Ok(Ingestor::new(dart_client(settings)?, store, ReportAnalyzer::new(Arc::new(llm)))
        .with_parser(settings.parser)
        .with_archive(archive)
        .with_debug_dir(settings.debug_dir.clone())
        .with_limit(limit))
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

async fn run_ingest(settings: &Settings, args: &IngestArgs) -> Result<(), AppError> {
    let query = args.query(today())?;
    let ingestor = build_ingestor(settings, open_store(settings)?, args.limit)?;
    let summary = ingestor.run(&query, None).await?;
    tracing::info!("Stored {} new reports ({} analyzed)", summary.stored, summary.analyzed);
    Ok(())
}

async fn run_sync(settings: &Settings) -> Result<(), AppError> {
    let directory = DirectorySync::new(dart_client(settings)?, open_store(settings)?);
    directory.sync().await?;
    Ok(())
}

fn run_parse(settings: &Settings, file: &Path, format: OutputFormat) -> Result<(), AppError> {
    let bytes = std::fs::read(file)?;
    let raw = String::from_utf8_lossy(&bytes);
    let parsed = markup::parse_document(&raw, settings.parser)?;

    if let (Some(dir), Some(normalized)) = (&settings.debug_dir, &parsed.normalized) {
        let name = file.file_stem().and_then(|s| s.to_str()).unwrap_or("document");
        utils::debug::dump_normalization(dir, name, &raw, normalized);
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&parsed.report)?),
        OutputFormat::Markdown => print!("{}", parsed.report.to_markdown()),
    }
    Ok(())
}

/// Runs ingestion and directory sync on fixed intervals, one job at a time,
/// until Ctrl-C. A failed run is logged and retried at the next tick.
async fn run_worker(settings: &Settings, args: &WorkerArgs) -> Result<(), AppError> {
    let store = open_store(settings)?;
    let ingestor = build_ingestor(settings, store.clone(), args.ingest.limit)?;
    let directory = DirectorySync::new(dart_client(settings)?, store);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl-C received, finishing current item");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                // Keep the sender alive so the worker does not read a closed channel as shutdown.
                std::future::pending::<()>().await;
            }
        }
    });

    let mut sync_tick = tokio::time::interval(Duration::from_secs(args.sync_every_hours * 3600));
    let mut ingest_tick = tokio::time::interval(Duration::from_secs(args.ingest_every_minutes * 60));
    sync_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ingest_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        "Worker started: ingest every {} min, directory sync every {} h",
        args.ingest_every_minutes,
        args.sync_every_hours
    );

    let mut shutdown = shutdown_rx.clone();
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = sync_tick.tick() => {
                if let Err(e) = directory.sync().await {
                    tracing::error!("Directory sync failed: {}", e);
                }
            }
            _ = ingest_tick.tick() => {
                let query = args.ingest.query(today())?;
                match ingestor.run(&query, Some(&shutdown_rx)).await {
                    Ok(summary) if summary.interrupted => break,
                    Ok(_) => {}
                    Err(e) => tracing::error!("Ingestion run failed: {}", e),
                }
            }
        }
    }

    tracing::info!("Worker stopped");
    Ok(())
}
