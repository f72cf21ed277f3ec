use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

use crate::app::ports::PersistencePort;
use crate::error::{PipelineError, Result};
use crate::pipeline::storage::CatalogEntry;

/// File-based implementation of PersistencePort
/// Appends catalog entries to an NDJSON file, one entry per line
pub struct NdjsonCatalogStore {
    file_writer: Mutex<BufWriter<File>>,
    file_path: PathBuf,
}

impl NdjsonCatalogStore {
    pub fn open(file_path: impl AsRef<Path>) -> Result<Self> {
        let path = file_path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        info!("Opening catalog store: {}", path.display());

        let file_writer = BufWriter::new(OpenOptions::new().create(true).append(true).open(path)?);

        Ok(Self {
            file_writer: Mutex::new(file_writer),
            file_path: path.to_path_buf(),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn read_entries(&self) -> Result<Vec<CatalogEntry>> {
        let reader = BufReader::new(File::open(&self.file_path)?);
        let mut entries = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CatalogEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(
                    "Skipping unreadable catalog line {} in {}: {}",
                    line_no + 1,
                    self.file_path.display(),
                    e
                ),
            }
        }
        entries.reverse();
        Ok(entries)
    }
}

#[async_trait]
impl PersistencePort for NdjsonCatalogStore {
    async fn append(&self, entry: &CatalogEntry) -> Result<()> {
        let json_line = serde_json::to_string(entry)?;

        let mut writer = self
            .file_writer
            .lock()
            .map_err(|_| PipelineError::Persistence("catalog writer lock poisoned".into()))?;
        writeln!(writer, "{}", json_line)
            .and_then(|_| writer.flush())
            .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<CatalogEntry>> {
        if let Ok(mut writer) = self.file_writer.lock() {
            writer.flush()?;
        }
        self.read_entries()
    }
}
