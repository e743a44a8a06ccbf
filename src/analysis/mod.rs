// src/analysis/mod.rs
//! Second-pass structured extraction over a canonical report.

pub mod client;
pub mod schema;

pub use client::{Completion, LlmBackend, OpenAiClient};
pub use schema::{Extraction, ReportType};

use crate::utils::error::AnalysisError;
use schema::PeriodicReport;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Byte ceiling on the document text sent to the model.
pub const PROMPT_BYTE_LIMIT: usize = 128 * 1024;
pub const TRUNCATION_MARKER: &str = "\n\n[...truncated for brevity...]";

const USER_PROMPT_HEADER: &str = "Below is the original text of a DART disclosure. \
Extract the required information and output only JSON matching the schema.\nDisclosure:\n";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub tokens_used: i64,
    pub extraction: Extraction,
}

/// Builds prompts for a report type, calls the model and decodes its answer.
#[derive(Clone)]
pub struct ReportAnalyzer {
    backend: Arc<dyn LlmBackend>,
}

impl ReportAnalyzer {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    pub async fn analyze(&self, document: &str, report_type: ReportType) -> Result<AnalysisOutcome, AnalysisError> {
        let system_prompt = format!("{}\n\n{}", schema::SYSTEM_PROMPT, report_type.schema_prompt());
        let user_prompt = build_user_prompt(document, report_type.instructions());

        let completion = self.backend.complete(&system_prompt, &user_prompt).await?;
        let output = strip_code_fence(completion.text.trim());
        if output.is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }

        let extraction = report_type.decode(output)?;
        if let Extraction::PeriodicReport(report) = &extraction {
            let metrics = TrendMetrics::from_report(report);
            tracing::debug!("Trend metrics: {:?}", metrics);
        }

        Ok(AnalysisOutcome {
            tokens_used: completion.tokens_used,
            extraction,
        })
    }
}

fn build_user_prompt(document: &str, instructions: &str) -> String {
    let mut prompt = String::with_capacity(document.len().min(PROMPT_BYTE_LIMIT) + 512);
    prompt.push_str(USER_PROMPT_HEADER);
    prompt.push_str(&truncate_document(document, PROMPT_BYTE_LIMIT));
    if !instructions.is_empty() {
        prompt.push_str("\n\nAdditional instructions:\n");
        prompt.push_str(instructions);
    }
    prompt
}

/// Cuts `text` to at most `limit` bytes on a UTF-8 boundary and appends
/// [`TRUNCATION_MARKER`] when anything was cut.
pub fn truncate_document(text: &str, limit: usize) -> std::borrow::Cow<'_, str> {
    if text.len() <= limit {
        return std::borrow::Cow::Borrowed(text);
    }
    let mut end = limit;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    std::borrow::Cow::Owned(format!("{}{}", &text[..end], TRUNCATION_MARKER))
}

// Models sometimes wrap the object in a ```json fence despite instructions.
fn strip_code_fence(output: &str) -> &str {
    let Some(rest) = output.strip_prefix("```") else {
        return output;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Ratios derived from a periodic report, in percent, keyed by period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendMetrics {
    /// Operating income over sales, per consolidated income statement period.
    pub operating_margin: BTreeMap<String, f64>,
    /// Total liabilities over total equity, per consolidated balance sheet period.
    pub debt_ratio: BTreeMap<String, f64>,
}

impl TrendMetrics {
    pub fn from_report(report: &PeriodicReport) -> Self {
        let operating_margin = report
            .consolidated
            .income_statement
            .iter()
            .filter(|(_, is)| is.sales != 0)
            .map(|(period, is)| (period.clone(), is.operating_income as f64 / is.sales as f64 * 100.0))
            .collect();
        let debt_ratio = report
            .consolidated
            .balance_sheet
            .iter()
            .filter(|(_, bs)| bs.total_equity != 0)
            .map(|(period, bs)| (period.clone(), bs.total_liabilities as f64 / bs.total_equity as f64 * 100.0))
            .collect();
        Self {
            operating_margin,
            debt_ratio,
        }
    }
}
