// src/utils/debug.rs
use crate::markup::Normalized;
use crate::utils::error::AppError;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes the raw markup, the normalized markup and the list of stripped tag
/// names for one receipt into `dir`, returning the three paths.
pub fn save_normalization_dump(
    dir: &Path,
    receipt_no: &str,
    raw: &str,
    normalized: &Normalized,
) -> Result<[PathBuf; 3], AppError> {
    fs::create_dir_all(dir)?;

    let raw_path = dir.join(format!("{}.raw.xml", receipt_no));
    fs::write(&raw_path, raw)?;

    let normalized_path = dir.join(format!("{}.normalized.xml", receipt_no));
    fs::write(&normalized_path, &normalized.text)?;

    let mut stripped = normalized.stripped_tags.join("\n");
    if !stripped.is_empty() {
        stripped.push('\n');
    }
    let stripped_path = dir.join(format!("{}.stripped.txt", receipt_no));
    fs::write(&stripped_path, stripped)?;

    tracing::info!("Saved normalization dump for {} to {}", receipt_no, dir.display());
    Ok([raw_path, normalized_path, stripped_path])
}

/// Same as [`save_normalization_dump`] but only logs failures.
pub fn dump_normalization(dir: &Path, receipt_no: &str, raw: &str, normalized: &Normalized) {
    if let Err(e) = save_normalization_dump(dir, receipt_no, raw, normalized) {
        tracing::warn!("Failed to write normalization dump for {}: {}", receipt_no, e);
    }
}
