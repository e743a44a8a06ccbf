// src/storage/mod.rs
//! Persistence boundary for raw reports, analyses and the issuer directory.

pub mod archive;
pub mod sqlite;

pub use archive::ReportArchive;
pub use sqlite::SqliteStore;

use crate::utils::error::StorageError;
use chrono::{DateTime, NaiveDate, Utc};

/// Category stored for issuers that carry a stock code.
pub const CATEGORY_LISTED: &str = "listed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReport {
    pub id: i64,
    pub receipt_number: String,
    pub corp_code: String,
    pub blob: Vec<u8>,
    pub blob_size: i64,
    pub structured_json: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRawReport {
    pub receipt_number: String,
    pub corp_code: String,
    pub blob: Vec<u8>,
    pub structured_json: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub id: i64,
    pub raw_report_id: i64,
    pub tokens_used: i64,
    pub analysis_json: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub raw_report_id: i64,
    pub tokens_used: i64,
    pub analysis_json: Vec<u8>,
}

/// Company directory entry, keyed by `corp_code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuer {
    pub id: i64,
    pub corp_code: String,
    pub name: String,
    pub eng_name: String,
    pub last_modified_date: NaiveDate,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewIssuer {
    pub corp_code: String,
    pub name: String,
    pub eng_name: String,
    pub last_modified_date: NaiveDate,
    pub category: String,
}

/// Result of a create-if-absent insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Created<T> {
    Inserted(T),
    /// A row with the same natural key already exists; nothing was written.
    AlreadyExists,
}

/// Storage used by the ingestion and directory jobs.
///
/// Every method is one atomic write or read. Implementations must be safe to
/// share between concurrently running jobs.
pub trait Store: Send + Sync {
    fn count_raw_reports(&self, receipt_number: &str) -> Result<i64, StorageError>;

    /// Inserts a raw report unless one with the same receipt number exists.
    fn create_raw_report(&self, report: NewRawReport) -> Result<Created<RawReport>, StorageError>;

    fn raw_report_by_receipt(&self, receipt_number: &str) -> Result<Option<RawReport>, StorageError>;

    fn create_analysis(&self, analysis: NewAnalysis) -> Result<Analysis, StorageError>;

    fn analyses_for(&self, raw_report_id: i64) -> Result<Vec<Analysis>, StorageError>;

    fn find_issuer(&self, corp_code: &str) -> Result<Option<Issuer>, StorageError>;

    fn create_issuer(&self, issuer: NewIssuer) -> Result<Issuer, StorageError>;

    /// Overwrites the mutable fields of an existing issuer, matched by `corp_code`.
    fn update_issuer(&self, issuer: &Issuer) -> Result<(), StorageError>;

    fn count_issuers(&self) -> Result<i64, StorageError>;
}
