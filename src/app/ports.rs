use async_trait::async_trait;
use std::path::Path;

use crate::domain::{
    ContentAnalysis, Dataset, DetectionResult, FileRecord, PublishRecord, StageEvent,
    ValidationResult,
};
use crate::pipeline::storage::CatalogEntry;

// Ingest-side ports

/// One inner entry of an archive, as reported by the extraction collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedEntry {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

pub trait ArchiveExtractor: Send + Sync {
    /// Lists the file entries of the archive at `path`; directories are skipped.
    fn extract(&self, path: &Path) -> anyhow::Result<Vec<ExtractedEntry>>;
}

// Inference-side ports

/// A single text-completion call against the remote backend.
#[async_trait]
pub trait CompletionPort: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
    fn name(&self) -> &str;
}

/// Task-level inference used by the orchestrator.
///
/// The gateway implementation never returns `Err`; it substitutes the local
/// heuristic result instead. Other implementations may fail, and the
/// orchestrator maps those failures into the stage error taxonomy.
#[async_trait]
pub trait InferencePort: Send + Sync {
    async fn detect(&self, description: &str, files: &[FileRecord]) -> anyhow::Result<DetectionResult>;
    async fn validate(&self, dataset: &Dataset) -> anyhow::Result<ValidationResult>;
    async fn tag(&self, dataset: &Dataset) -> anyhow::Result<ContentAnalysis>;
    async fn publish(&self, dataset: &Dataset) -> anyhow::Result<PublishRecord>;
}

// Output-side ports

/// Receives every stage transition; the orchestrator never renders anything itself.
pub trait StatusReporter: Send + Sync {
    fn report(&self, event: &StageEvent);
}

impl<F> StatusReporter for F
where
    F: Fn(&StageEvent) + Send + Sync,
{
    fn report(&self, event: &StageEvent) {
        self(event)
    }
}

/// Append-only store keyed by dataset id.
#[async_trait]
pub trait PersistencePort: Send + Sync {
    async fn append(&self, entry: &CatalogEntry) -> crate::error::Result<()>;

    /// Every stored entry, most recent first.
    async fn load_all(&self) -> crate::error::Result<Vec<CatalogEntry>>;
}
