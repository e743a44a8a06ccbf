// src/ingest/orchestrator.rs
use crate::analysis::{ReportAnalyzer, ReportType};
use crate::dart::{DartClient, DisclosureListEntry, ListQuery};
use crate::markup::{self, normalize, ParserBackend};
use crate::storage::{Created, NewAnalysis, NewRawReport, ReportArchive, Store};
use crate::utils::debug;
use crate::utils::error::{DartError, IngestError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

/// Counters for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub listed: usize,
    pub already_stored: usize,
    pub missing_documents: usize,
    pub stored: usize,
    pub analyzed: usize,
    pub extraction_failures: usize,
    /// Shutdown was requested before every listed entry was visited.
    pub interrupted: bool,
}

/// What happened to a single list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    AlreadyStored,
    DocumentMissing,
    Stored { analyzed: bool },
}

impl IngestSummary {
    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::AlreadyStored => self.already_stored += 1,
            ItemOutcome::DocumentMissing => self.missing_documents += 1,
            ItemOutcome::Stored { analyzed } => {
                self.stored += 1;
                if analyzed {
                    self.analyzed += 1;
                } else {
                    self.extraction_failures += 1;
                }
            }
        }
    }
}

/// Lists recent disclosures and turns each new one into a stored raw
/// report plus, when extraction succeeds, an analysis.
///
/// Entries are handled one at a time. Missing documents and extraction
/// failures only affect their own entry; upstream, transport, parse and
/// storage failures end the run.
pub struct Ingestor {
    dart: DartClient,
    store: Arc<dyn Store>,
    analyzer: ReportAnalyzer,
    parser: ParserBackend,
    archive: Option<ReportArchive>,
    debug_dir: Option<PathBuf>,
    limit: Option<usize>,
}

impl Ingestor {
    pub fn new(dart: DartClient, store: Arc<dyn Store>, analyzer: ReportAnalyzer) -> Self {
        Self {
            dart,
            store,
            analyzer,
            parser: ParserBackend::default(),
            archive: None,
            debug_dir: None,
            limit: None,
        }
    }

    pub fn with_parser(mut self, parser: ParserBackend) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_archive(mut self, archive: Option<ReportArchive>) -> Self {
        self.archive = archive;
        self
    }

    pub fn with_debug_dir(mut self, debug_dir: Option<PathBuf>) -> Self {
        self.debug_dir = debug_dir;
        self
    }

    /// Caps how many list entries one run visits.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Runs one batch. `shutdown` is checked between entries; once it reads
    /// `true` the run stops and reports what it finished.
    pub async fn run(
        &self,
        query: &ListQuery,
        shutdown: Option<&watch::Receiver<bool>>,
    ) -> Result<IngestSummary, IngestError> {
        let entries = self.dart.fetch_disclosures(query).await?;
        let mut summary = IngestSummary {
            listed: entries.len(),
            ..Default::default()
        };

        let limit = self.limit.unwrap_or(usize::MAX);
        for entry in entries.iter().take(limit) {
            if shutdown.is_some_and(|rx| *rx.borrow()) {
                tracing::info!("Shutdown requested, stopping before {}", entry.receipt_no);
                summary.interrupted = true;
                break;
            }

            let span = tracing::info_span!(
                "disclosure",
                receipt_no = %entry.receipt_no,
                corp_code = %entry.corp_code
            );
            let outcome = self.process_entry(entry).instrument(span).await?;
            summary.record(outcome);
        }

        tracing::info!(
            "Ingestion finished: {} listed, {} already stored, {} missing, {} stored, {} analyzed, {} extraction failures",
            summary.listed,
            summary.already_stored,
            summary.missing_documents,
            summary.stored,
            summary.analyzed,
            summary.extraction_failures
        );
        Ok(summary)
    }

    async fn process_entry(&self, entry: &DisclosureListEntry) -> Result<ItemOutcome, IngestError> {
        if self.store.count_raw_reports(&entry.receipt_no)? > 0 {
            tracing::debug!("Already stored, skipping");
            return Ok(ItemOutcome::AlreadyStored);
        }

        let blob = match self.dart.fetch_document(&entry.receipt_no).await {
            Ok(blob) => blob,
            Err(DartError::DocumentNotFound(_)) => {
                tracing::warn!("Document not available upstream, skipping: {}", entry.title);
                return Ok(ItemOutcome::DocumentMissing);
            }
            Err(e) => {
                tracing::error!("Document download failed (retryable: {}): {}", e.is_retryable(), e);
                return Err(e.into());
            }
        };

        let raw = String::from_utf8_lossy(&blob);
        let parsed = match markup::parse_document(&raw, self.parser) {
            Ok(parsed) => parsed,
            Err(source) => {
                if let Some(dir) = &self.debug_dir {
                    debug::dump_normalization(dir, &entry.receipt_no, &raw, &normalize::normalize(&raw));
                }
                return Err(IngestError::MalformedDocument {
                    receipt_no: entry.receipt_no.clone(),
                    source,
                });
            }
        };
        if let (Some(dir), Some(normalized)) = (&self.debug_dir, &parsed.normalized) {
            debug::dump_normalization(dir, &entry.receipt_no, &raw, normalized);
        }
        if parsed.report.is_empty() {
            tracing::warn!("Parsed document has no tables or paragraphs");
        }

        let structured = serde_json::to_string(&parsed.report)?;
        let raw_report = match self.store.create_raw_report(NewRawReport {
            receipt_number: entry.receipt_no.clone(),
            corp_code: entry.corp_code.clone(),
            blob,
            structured_json: structured.clone().into_bytes(),
        })? {
            Created::Inserted(report) => report,
            Created::AlreadyExists => {
                tracing::debug!("Stored concurrently by another run, skipping");
                return Ok(ItemOutcome::AlreadyStored);
            }
        };
        tracing::info!("Stored raw report {} ({} bytes)", raw_report.id, raw_report.blob_size);

        if let Some(archive) = &self.archive {
            if let Err(e) = archive.save_report(&entry.corp_code, &entry.receipt_no, &parsed.report) {
                tracing::warn!("Failed to archive report: {}", e);
            }
        }

        // The list title is only a fallback for documents without a DOCUMENT-NAME.
        let title = if parsed.report.report_title.is_empty() {
            entry.title.as_str()
        } else {
            parsed.report.report_title.as_str()
        };
        let report_type = ReportType::classify(title);
        tracing::debug!("Classified '{}' as {}", title, report_type);

        let mut outcome = match self.analyzer.analyze(&structured, report_type).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Extraction failed, keeping raw report {} only: {}", raw_report.id, e);
                return Ok(ItemOutcome::Stored { analyzed: false });
            }
        };

        if outcome.extraction.issuer_name().is_empty() {
            match self.store.find_issuer(&entry.corp_code)? {
                Some(issuer) => *outcome.extraction.issuer_name_mut() = issuer.name,
                None => tracing::info!("No directory entry to backfill issuer name"),
            }
        }

        let analysis = self.store.create_analysis(NewAnalysis {
            raw_report_id: raw_report.id,
            tokens_used: outcome.tokens_used,
            analysis_json: serde_json::to_vec(&outcome.extraction)?,
        })?;
        tracing::info!(
            "Stored {} analysis {} ({} tokens)",
            outcome.extraction.report_type(),
            analysis.id,
            analysis.tokens_used
        );

        Ok(ItemOutcome::Stored { analyzed: true })
    }
}
