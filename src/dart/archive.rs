// src/dart/archive.rs
use crate::utils::error::DartError;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Concatenates every file entry of a zip archive, in archive order.
///
/// DART ships one meaningful entry per archive but its name varies, so no
/// entry name is assumed. Directory entries are skipped.
pub fn unpack_all(bytes: &[u8]) -> Result<Vec<u8>, DartError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut out = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        tracing::trace!("Unpacking archive entry {} ({} bytes)", entry.name(), entry.size());
        entry.read_to_end(&mut out)?;
    }

    Ok(out)
}

/// Builds an in-memory zip for tests.
#[cfg(test)]
pub(crate) fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
