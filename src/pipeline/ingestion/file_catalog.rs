use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::app::ports::ArchiveExtractor;
use crate::constants::{STANDARDIZED_FORMATS, TEXT_DATA_FILE_NAME};
use crate::domain::{FileRecord, StandardizedData};

/// Where an upload stands after being added to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum UploadStatus {
    Uploaded,
    Extracted(usize),
    ExtractionFailed(String),
}

/// A top-level upload plus whatever was extracted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upload {
    pub record: FileRecord,
    pub status: UploadStatus,
    pub extracted: Vec<FileRecord>,
}

/// Normalizes uploaded and extracted items into one flat file list.
#[derive(Debug, Clone, Default)]
pub struct FileCatalog {
    uploads: Vec<Upload>,
}

impl FileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plain (non-archive) upload.
    pub fn add_file(&mut self, record: FileRecord) -> Uuid {
        let id = record.id;
        debug!("Added upload {} ({} bytes)", record.name, record.size);
        self.uploads.push(Upload {
            record,
            status: UploadStatus::Uploaded,
            extracted: Vec::new(),
        });
        id
    }

    /// Adds an archive upload and flattens its entries through `extractor`.
    ///
    /// A failed extraction keeps the archive itself in the catalog and marks
    /// it `ExtractionFailed`; it is not an ingestion error.
    pub fn add_archive(
        &mut self,
        mut record: FileRecord,
        path: &Path,
        extractor: &dyn ArchiveExtractor,
    ) -> Uuid {
        let id = record.id;
        let (status, extracted) = match extractor.extract(path) {
            Ok(entries) => {
                let extracted: Vec<FileRecord> = entries
                    .into_iter()
                    .map(|entry| {
                        let mut file = FileRecord::new(entry.name, entry.size, entry.mime_type);
                        file.source_archive = Some(record.name.clone());
                        file
                    })
                    .collect();
                record.extracted_count = Some(extracted.len());
                debug!("Archive {} contains {} files", record.name, extracted.len());
                (UploadStatus::Extracted(extracted.len()), extracted)
            }
            Err(e) => {
                warn!("Error processing archive {}: {}", record.name, e);
                (UploadStatus::ExtractionFailed(e.to_string()), Vec::new())
            }
        };
        self.uploads.push(Upload {
            record,
            status,
            extracted,
        });
        id
    }

    /// Turns pasted free text into a `text_data.txt` upload. Blank text adds nothing.
    pub fn add_text_data(&mut self, text: &str) -> Option<Uuid> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let record = FileRecord::new(TEXT_DATA_FILE_NAME, text.len() as u64, "text/plain");
        Some(self.add_file(record))
    }

    /// Removes an upload, together with anything extracted from it.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.uploads.len();
        self.uploads.retain(|u| u.record.id != id);
        before != self.uploads.len()
    }

    pub fn uploads(&self) -> &[Upload] {
        &self.uploads
    }

    /// Number of top-level uploads, which is what stage 1 requires to be non-zero.
    pub fn upload_count(&self) -> usize {
        self.uploads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty()
    }

    /// Every upload followed by its extracted entries, archives included.
    pub fn flattened(&self) -> Vec<FileRecord> {
        self.uploads
            .iter()
            .flat_map(|u| std::iter::once(&u.record).chain(u.extracted.iter()))
            .cloned()
            .collect()
    }

    pub fn standardize(&self) -> StandardizedData {
        let files = self.flattened();
        StandardizedData {
            total_files: files.len(),
            file_types: classify_extensions(&files),
            standardized_formats: STANDARDIZED_FORMATS
                .iter()
                .map(|(family, format)| (family.to_string(), format.to_string()))
                .collect(),
            files,
        }
    }
}

/// Extension → count over `files`.
pub fn classify_extensions(files: &[FileRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for file in files {
        *counts.entry(file.extension()).or_insert(0) += 1;
    }
    counts
}

/// Human-readable size with a 1024 base, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
