// src/config.rs
use crate::analysis::client::{DEFAULT_BASE_URL as OPENAI_BASE_URL, DEFAULT_MODEL};
use crate::dart::client::DEFAULT_BASE_URL as DART_BASE_URL;
use crate::dart::ListQuery;
use crate::markup::ParserBackend;
use crate::utils::AppError;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Ingests Open DART disclosures into SQLite and extracts structured data from them.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings shared by every subcommand. Each one can also come from the
/// environment or a `.env` file.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Open DART API key
    #[arg(long, global = true, env = "DART_API_KEY", hide_env_values = true, default_value = "")]
    pub dart_api_key: String,

    #[arg(long, global = true, env = "DART_BASE_URL", default_value = DART_BASE_URL)]
    pub dart_base_url: String,

    /// API key for the extraction model
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true, default_value = "")]
    pub openai_api_key: String,

    #[arg(long, global = true, env = "OPENAI_BASE_URL", default_value = OPENAI_BASE_URL)]
    pub openai_base_url: String,

    #[arg(long, global = true, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub openai_model: String,

    /// SQLite database file
    #[arg(long, global = true, env = "DATABASE_PATH", default_value = "./dart.sqlite3")]
    pub database_path: PathBuf,

    /// Timeout for DART requests, in seconds
    #[arg(long, global = true, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Timeout for model calls, in seconds
    #[arg(long, global = true, env = "LLM_TIMEOUT_SECS", default_value_t = 300)]
    pub llm_timeout_secs: u64,

    /// Also write canonical JSON and markdown per report under this directory
    #[arg(long, global = true, env = "ARCHIVE_DIR")]
    pub archive_dir: Option<PathBuf>,

    /// Write raw/normalized markup dumps per report under this directory
    #[arg(long, global = true, env = "DEBUG_DIR")]
    pub debug_dir: Option<PathBuf>,

    #[arg(long, global = true, env = "PARSER", value_enum, default_value_t = ParserBackend::Tree)]
    pub parser: ParserBackend,
}

impl Settings {
    pub fn dart_api_key(&self) -> Result<&str, AppError> {
        require("DART_API_KEY", &self.dart_api_key)
    }

    pub fn openai_api_key(&self) -> Result<&str, AppError> {
        require("OPENAI_API_KEY", &self.openai_api_key)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

fn require<'a>(name: &str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Config(format!("{} is not set", name)));
    }
    Ok(value)
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the disclosure list once and process every new entry
    Ingest(IngestArgs),
    /// Refresh the issuer directory
    SyncCompanies,
    /// Parse a local document and print its canonical form
    Parse {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Run ingestion and directory sync on a schedule until Ctrl-C
    Worker(WorkerArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Only list disclosures of this issuer
    #[arg(long)]
    pub corp_code: Option<String>,

    /// First receipt date (YYYY-MM-DD or YYYYMMDD)
    #[arg(long, value_parser = parse_date)]
    pub begin: Option<NaiveDate>,

    /// Last receipt date (YYYY-MM-DD or YYYYMMDD), defaults to today
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,

    /// Window length when --begin is not given
    #[arg(long, default_value_t = 5)]
    pub days: i64,

    /// Process at most this many list entries
    #[arg(long)]
    pub limit: Option<usize>,
}

impl IngestArgs {
    pub fn query(&self, today: NaiveDate) -> Result<ListQuery, AppError> {
        let end = self.end.unwrap_or(today);
        let begin = self.begin.unwrap_or(end - chrono::Duration::days(self.days));
        if begin > end {
            return Err(AppError::Config(format!("begin date {} is after end date {}", begin, end)));
        }
        let query = ListQuery::new(begin, end);
        Ok(match &self.corp_code {
            Some(code) => query.with_corp_code(code.as_str()),
            None => query,
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct WorkerArgs {
    /// Minutes between ingestion runs
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub ingest_every_minutes: u64,

    /// Hours between directory syncs
    #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(u64).range(1..))]
    pub sync_every_hours: u64,

    #[command(flatten)]
    pub ingest: IngestArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .map_err(|e| format!("invalid date '{}': {}", value, e))
}

/// Loads `.env` if present, then parses the command line.
pub fn load() -> Cli {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {}", e);
        }
    }
    Cli::parse()
}
