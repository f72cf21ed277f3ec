use anyhow::Context;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::app::ports::{ArchiveExtractor, ExtractedEntry};
use crate::constants::mime_for_extension;
use crate::domain::extension_of;

/// Lists the file entries of a `.zip` archive on disk.
pub struct ZipArchiveExtractor;

impl ArchiveExtractor for ZipArchiveExtractor {
    fn extract(&self, path: &Path) -> anyhow::Result<Vec<ExtractedEntry>> {
        let file = File::open(path).with_context(|| format!("Failed to open archive: {}", path.display()))?;
        let mut archive = zip::ZipArchive::new(file)
            .with_context(|| format!("Not a readable zip archive: {}", path.display()))?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mime_type = mime_for_extension(&extension_of(&name)).to_string();
            entries.push(ExtractedEntry {
                name,
                size: entry.size(),
                mime_type,
            });
        }
        debug!("Listed {} entries in {}", entries.len(), path.display());
        Ok(entries)
    }
}
