//! Batch description consumed by the `run` command.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::app::pipeline_use_case::PipelineSession;
use crate::app::ports::ArchiveExtractor;
use crate::domain::{DatasetInfo, FileRecord};
use crate::error::{PipelineError, Result};
use crate::pipeline::ingestion::FileCatalog;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub info: DatasetInfo,
    #[serde(default)]
    pub files: Vec<ManifestFile>,
    /// Pasted text, ingested as `text_data.txt`.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFile {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// On-disk location; relative paths resolve against the manifest's directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Manifest {
    /// Reads a `.toml` manifest as TOML and anything else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read manifest '{}': {}", path.display(), e))
        })?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Ok(toml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    /// Builds the upload catalog and an unstarted session.
    pub fn into_session(self, base_dir: &Path, extractor: &dyn ArchiveExtractor) -> Result<PipelineSession> {
        self.info.check()?;
        let mut files = FileCatalog::new();

        for entry in self.files {
            let path = entry.path.as_ref().map(|p| base_dir.join(p));
            let size = match (entry.size, &path) {
                (Some(size), _) => size,
                (None, Some(path)) => fs::metadata(path)?.len(),
                (None, None) => 0,
            };
            let record = match entry.mime_type {
                Some(mime) => FileRecord::new(entry.name, size, mime),
                None => FileRecord::guessed(entry.name, size),
            };

            match path {
                Some(path) if record.is_archive() => {
                    files.add_archive(record, &path, extractor);
                }
                _ => {
                    files.add_file(record);
                }
            }
        }

        if let Some(text) = self.text {
            files.add_text_data(&text);
        }

        debug!("Manifest produced {} uploads", files.upload_count());
        Ok(PipelineSession::new(files, self.info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::ExtractedEntry;

    struct TwoEntries;

    impl ArchiveExtractor for TwoEntries {
        fn extract(&self, _path: &Path) -> anyhow::Result<Vec<ExtractedEntry>> {
            Ok(vec![
                ExtractedEntry {
                    name: "a.csv".into(),
                    size: 1,
                    mime_type: "text/csv".into(),
                },
                ExtractedEntry {
                    name: "b.png".into(),
                    size: 1,
                    mime_type: "image/png".into(),
                },
            ])
        }
    }

    #[test]
    fn json_manifest_with_archive_and_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        fs::write(
            &path,
            r#"{
                "info": {"title": "Run", "robotModel": "UR5", "sensors": "", "description": "", "price": 0},
                "files": [
                    {"name": "joint_states.csv", "size": 2048},
                    {"name": "bundle.zip", "size": 10, "path": "bundle.zip"}
                ],
                "text": "{\"episode\": 1}"
            }"#,
        )
        .unwrap();

        let manifest = Manifest::from_path(&path).unwrap();
        let session = manifest.into_session(dir.path(), &TwoEntries).unwrap();

        assert_eq!(session.files.upload_count(), 3);
        // csv + zip + 2 extracted + text_data.txt
        assert_eq!(session.files.standardize().total_files, 5);
        assert_eq!(session.info.robot_model, "UR5");
    }

    #[test]
    fn toml_manifest_reads_sizes_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("log.txt"), b"hello").unwrap();
        let path = dir.path().join("batch.toml");
        fs::write(
            &path,
            r#"
            [info]
            title = "Logs"

            [[files]]
            name = "log.txt"
            path = "log.txt"
            "#,
        )
        .unwrap();

        let session = Manifest::from_path(&path)
            .unwrap()
            .into_session(dir.path(), &TwoEntries)
            .unwrap();
        assert_eq!(session.files.uploads()[0].record.size, 5);
        assert_eq!(session.files.uploads()[0].record.mime_type, "text/plain");
    }

    #[test]
    fn negative_price_is_rejected_before_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        fs::write(
            &path,
            r#"{"info": {"title": "Run", "price": -25}, "files": [{"name": "a.csv", "size": 1}], "text": "   "}"#,
        )
        .unwrap();

        let err = Manifest::from_path(&path)
            .unwrap()
            .into_session(dir.path(), &TwoEntries)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInfo(_)));
    }

    #[test]
    fn blank_text_adds_no_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        fs::write(&path, r#"{"info": {"title": "Run"}, "files": [{"name": "a.csv", "size": 1}], "text": "  \n "}"#)
            .unwrap();

        let session = Manifest::from_path(&path)
            .unwrap()
            .into_session(dir.path(), &TwoEntries)
            .unwrap();
        assert_eq!(session.files.upload_count(), 1);
    }

    #[test]
    fn missing_manifest_is_a_config_error() {
        let err = Manifest::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
