// src/utils/error.rs
use thiserror::Error;

// Specific error types for each layer of the pipeline
#[derive(Error, Debug)]
pub enum DartError {
    #[error("Network request failed: {0}")]
    Transport(#[from] reqwest::Error), // Timeouts and connection failures land here

    #[error("DART error {status}: {message}")]
    Upstream { status: String, message: String }, // Application-level status, even on HTTP 200

    #[error("DART HTTP error {status}: {body}")]
    UpstreamHttp { status: reqwest::StatusCode, body: String },

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error while unpacking archive: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode DART response: {0}")]
    Decode(String),
}

impl DartError {
    /// Whether a later scheduled run could reasonably succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DartError::Transport(_) | DartError::Upstream { .. } | DartError::UpstreamHttp { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Markup nesting deeper than {0} levels")]
    TooDeep(usize),
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("LLM request failed: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("LLM API error: {0}")]
    Api(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Failed to decode model output: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

/// Batch-fatal failures of an ingestion run. Item-scoped problems
/// (missing documents, extraction failures) never surface here.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("DART upstream failure: {0}")]
    Upstream(DartError),

    #[error("Transport failure: {0}")]
    Transport(DartError),

    #[error("Malformed document {receipt_no}: {source}")]
    MalformedDocument {
        receipt_no: String,
        #[source]
        source: ParseError,
    },

    #[error("Persistence failure: {0}")]
    Persistence(#[from] StorageError),

    #[error("Failed to serialize canonical report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid modification date {value:?} for issuer {corp_code}")]
    InvalidDirectoryDate { corp_code: String, value: String },
}

impl From<DartError> for IngestError {
    fn from(err: DartError) -> Self {
        match err {
            DartError::Transport(_) | DartError::Io(_) => IngestError::Transport(err),
            other => IngestError::Upstream(other),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("DART interaction failed: {0}")]
    Dart(#[from] DartError),

    #[error("Parsing failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),
}
