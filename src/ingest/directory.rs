// src/ingest/directory.rs
use crate::dart::{CorpCodeRecord, DartClient};
use crate::storage::{NewIssuer, Store, CATEGORY_LISTED};
use crate::utils::error::IngestError;
use chrono::NaiveDate;
use std::sync::Arc;

const MODIFY_DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub records: usize,
    pub created: usize,
    pub updated: usize,
}

/// Mirrors the upstream issuer directory into the `companies` table.
/// Issuers missing from the latest directory are left as they are.
pub struct DirectorySync {
    dart: DartClient,
    store: Arc<dyn Store>,
}

impl DirectorySync {
    pub fn new(dart: DartClient, store: Arc<dyn Store>) -> Self {
        Self { dart, store }
    }

    pub async fn sync(&self) -> Result<SyncSummary, IngestError> {
        let records = self.dart.fetch_companies().await?;
        let summary = self.apply(&records)?;
        tracing::info!(
            "Directory sync finished: {} records, {} created, {} updated, {} issuers stored",
            summary.records,
            summary.created,
            summary.updated,
            self.store.count_issuers()?
        );
        Ok(summary)
    }

    /// Upserts every record by corp code. A malformed modification date
    /// aborts the whole sync.
    pub fn apply(&self, records: &[CorpCodeRecord]) -> Result<SyncSummary, IngestError> {
        let mut summary = SyncSummary {
            records: records.len(),
            ..Default::default()
        };

        for record in records {
            if record.corp_code.is_empty() {
                tracing::debug!("Skipping directory record without a corp code: {}", record.corp_name);
                continue;
            }
            let modified = parse_modify_date(record)?;

            match self.store.find_issuer(&record.corp_code)? {
                Some(mut issuer) => {
                    issuer.name = record.corp_name.clone();
                    issuer.eng_name = record.corp_eng_name.clone();
                    issuer.last_modified_date = modified;
                    if record.is_listed() {
                        issuer.category = CATEGORY_LISTED.to_string();
                    }
                    self.store.update_issuer(&issuer)?;
                    summary.updated += 1;
                }
                None => {
                    self.store.create_issuer(NewIssuer {
                        corp_code: record.corp_code.clone(),
                        name: record.corp_name.clone(),
                        eng_name: record.corp_eng_name.clone(),
                        last_modified_date: modified,
                        category: if record.is_listed() {
                            CATEGORY_LISTED.to_string()
                        } else {
                            String::new()
                        },
                    })?;
                    summary.created += 1;
                }
            }
        }

        Ok(summary)
    }
}

fn parse_modify_date(record: &CorpCodeRecord) -> Result<NaiveDate, IngestError> {
    NaiveDate::parse_from_str(&record.modify_date, MODIFY_DATE_FORMAT).map_err(|_| {
        IngestError::InvalidDirectoryDate {
            corp_code: record.corp_code.clone(),
            value: record.modify_date.clone(),
        }
    })
}
