// src/storage/archive.rs
use crate::markup::CanonicalReport;
use crate::utils::error::StorageError;
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem export of canonical reports, one JSON and one markdown file
/// per receipt number.
pub struct ReportArchive {
    base_dir: PathBuf,
}

/// Paths written by [`ReportArchive::save_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedPaths {
    pub json: PathBuf,
    pub markdown: PathBuf,
}

impl ReportArchive {
    /// Creates the archive rooted at `base_dir`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }
        Ok(Self { base_dir: base_path })
    }

    /// Writes `<base>/compact/<corp>/<receipt>.json` and
    /// `<base>/markdown/<corp>/<receipt>.md`.
    pub fn save_report(
        &self,
        corp_code: &str,
        receipt_no: &str,
        report: &CanonicalReport,
    ) -> Result<ArchivedPaths, StorageError> {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let json_path = self.write_file("compact", corp_code, &format!("{}.json", receipt_no), &json)?;

        let markdown_path =
            self.write_file("markdown", corp_code, &format!("{}.md", receipt_no), &report.to_markdown())?;

        tracing::info!("Archived {} to {}", receipt_no, self.base_dir.display());
        Ok(ArchivedPaths {
            json: json_path,
            markdown: markdown_path,
        })
    }

    fn write_file(&self, kind: &str, corp_code: &str, filename: &str, contents: &str) -> Result<PathBuf, StorageError> {
        let corp_dir = if corp_code.trim().is_empty() { "unknown" } else { corp_code };
        let target_dir = self.base_dir.join(kind).join(corp_dir);
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }
        let file_path = target_dir.join(filename);
        fs::write(&file_path, contents).map_err(StorageError::IoError)?;
        tracing::debug!("Wrote {}", file_path.display());
        Ok(file_path)
    }
}
