// src/storage/sqlite.rs
use super::{Analysis, Created, Issuer, NewAnalysis, NewIssuer, NewRawReport, RawReport, Store};
use crate::utils::error::StorageError;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed [`Store`]. One connection behind a mutex; every trait
/// method holds the lock for a single statement.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        init(&conn)?;
        tracing::info!("Opened database at {}", path.display());
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        init(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS raw_reports (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          receipt_number TEXT NOT NULL UNIQUE,
          corp_code TEXT NOT NULL,
          blob_data BLOB NOT NULL,
          blob_size INTEGER NOT NULL,
          json_data BLOB NOT NULL,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_raw_reports_corp_code ON raw_reports(corp_code);

        CREATE TABLE IF NOT EXISTS analyses (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          raw_report_id INTEGER NOT NULL REFERENCES raw_reports(id),
          tokens_used INTEGER NOT NULL DEFAULT 0,
          analysis BLOB NOT NULL,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_analyses_raw_report_id ON analyses(raw_report_id);

        CREATE TABLE IF NOT EXISTS companies (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          corp_code TEXT NOT NULL UNIQUE,
          corp_name TEXT NOT NULL,
          corp_eng_name TEXT NOT NULL DEFAULT '',
          last_modified_date TEXT NOT NULL,
          category TEXT NOT NULL DEFAULT '',
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );
        "#,
    )
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let value: String = row.get(idx)?;
    NaiveDate::parse_from_str(&value, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

const RAW_REPORT_COLUMNS: &str =
    "id, receipt_number, corp_code, blob_data, blob_size, json_data, created_at, updated_at";

fn raw_report_from_row(row: &Row<'_>) -> rusqlite::Result<RawReport> {
    Ok(RawReport {
        id: row.get(0)?,
        receipt_number: row.get(1)?,
        corp_code: row.get(2)?,
        blob: row.get(3)?,
        blob_size: row.get(4)?,
        structured_json: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
        updated_at: timestamp_column(row, 7)?,
    })
}

fn analysis_from_row(row: &Row<'_>) -> rusqlite::Result<Analysis> {
    Ok(Analysis {
        id: row.get(0)?,
        raw_report_id: row.get(1)?,
        tokens_used: row.get(2)?,
        analysis_json: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
        updated_at: timestamp_column(row, 5)?,
    })
}

fn issuer_from_row(row: &Row<'_>) -> rusqlite::Result<Issuer> {
    Ok(Issuer {
        id: row.get(0)?,
        corp_code: row.get(1)?,
        name: row.get(2)?,
        eng_name: row.get(3)?,
        last_modified_date: date_column(row, 4)?,
        category: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
        updated_at: timestamp_column(row, 7)?,
    })
}

impl Store for SqliteStore {
    fn count_raw_reports(&self, receipt_number: &str) -> Result<i64, StorageError> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM raw_reports WHERE receipt_number = ?1",
            params![receipt_number],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn create_raw_report(&self, report: NewRawReport) -> Result<Created<RawReport>, StorageError> {
        let now = Utc::now();
        let stamp = now.to_rfc3339();
        let blob_size = report.blob.len() as i64;

        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            INSERT INTO raw_reports (receipt_number, corp_code, blob_data, blob_size, json_data, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(receipt_number) DO NOTHING
            "#,
            params![
                report.receipt_number,
                report.corp_code,
                report.blob,
                blob_size,
                report.structured_json,
                stamp,
            ],
        )?;
        if changed == 0 {
            return Ok(Created::AlreadyExists);
        }

        Ok(Created::Inserted(RawReport {
            id: conn.last_insert_rowid(),
            receipt_number: report.receipt_number,
            corp_code: report.corp_code,
            blob: report.blob,
            blob_size,
            structured_json: report.structured_json,
            created_at: now,
            updated_at: now,
        }))
    }

    fn raw_report_by_receipt(&self, receipt_number: &str) -> Result<Option<RawReport>, StorageError> {
        let conn = self.conn()?;
        let report = conn
            .query_row(
                &format!("SELECT {} FROM raw_reports WHERE receipt_number = ?1", RAW_REPORT_COLUMNS),
                params![receipt_number],
                raw_report_from_row,
            )
            .optional()?;
        Ok(report)
    }

    fn create_analysis(&self, analysis: NewAnalysis) -> Result<Analysis, StorageError> {
        let now = Utc::now();
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO analyses (raw_report_id, tokens_used, analysis, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
            params![
                analysis.raw_report_id,
                analysis.tokens_used,
                analysis.analysis_json,
                now.to_rfc3339(),
            ],
        )?;

        Ok(Analysis {
            id: conn.last_insert_rowid(),
            raw_report_id: analysis.raw_report_id,
            tokens_used: analysis.tokens_used,
            analysis_json: analysis.analysis_json,
            created_at: now,
            updated_at: now,
        })
    }

    fn analyses_for(&self, raw_report_id: i64) -> Result<Vec<Analysis>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, raw_report_id, tokens_used, analysis, created_at, updated_at
            FROM analyses WHERE raw_report_id = ?1 ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![raw_report_id], analysis_from_row)?;
        let analyses = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(analyses)
    }

    fn find_issuer(&self, corp_code: &str) -> Result<Option<Issuer>, StorageError> {
        let conn = self.conn()?;
        let issuer = conn
            .query_row(
                r#"
                SELECT id, corp_code, corp_name, corp_eng_name, last_modified_date, category, created_at, updated_at
                FROM companies WHERE corp_code = ?1
                "#,
                params![corp_code],
                issuer_from_row,
            )
            .optional()?;
        Ok(issuer)
    }

    fn create_issuer(&self, issuer: NewIssuer) -> Result<Issuer, StorageError> {
        let now = Utc::now();
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO companies (corp_code, corp_name, corp_eng_name, last_modified_date, category, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
            params![
                issuer.corp_code,
                issuer.name,
                issuer.eng_name,
                issuer.last_modified_date.format(DATE_FORMAT).to_string(),
                issuer.category,
                now.to_rfc3339(),
            ],
        )?;

        Ok(Issuer {
            id: conn.last_insert_rowid(),
            corp_code: issuer.corp_code,
            name: issuer.name,
            eng_name: issuer.eng_name,
            last_modified_date: issuer.last_modified_date,
            category: issuer.category,
            created_at: now,
            updated_at: now,
        })
    }

    fn update_issuer(&self, issuer: &Issuer) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE companies
            SET corp_name = ?2, corp_eng_name = ?3, last_modified_date = ?4, category = ?5, updated_at = ?6
            WHERE corp_code = ?1
            "#,
            params![
                issuer.corp_code,
                issuer.name,
                issuer.eng_name,
                issuer.last_modified_date.format(DATE_FORMAT).to_string(),
                issuer.category,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn count_issuers(&self) -> Result<i64, StorageError> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))?;
        Ok(count)
    }
}
