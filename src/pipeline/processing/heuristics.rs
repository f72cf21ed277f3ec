use async_trait::async_trait;

use super::detect::detect;
use super::publish::PublicationSynthesizer;
use super::quality_gate::{QualityGate, ValidationScoringEngine};
use super::tagging::ContentTagger;
use crate::app::ports::InferencePort;
use crate::domain::{
    ContentAnalysis, Dataset, DetectionResult, FileRecord, PublishRecord, ValidationResult,
};

/// Deterministic local stand-in for every inference task.
///
/// Detection and scoring are pure functions of their inputs; the only state
/// is the seeded random streams used for drift jitter and tag sampling, and
/// the DOI counter.
pub struct LocalHeuristicEngine {
    scoring: ValidationScoringEngine,
    tagger: ContentTagger,
    publisher: PublicationSynthesizer,
}

impl LocalHeuristicEngine {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            scoring: ValidationScoringEngine::with_seed(seed),
            tagger: ContentTagger::new(seed),
            publisher: PublicationSynthesizer::default(),
        }
    }

    pub fn with_publisher(mut self, publisher: PublicationSynthesizer) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn detect(&self, description: &str, files: &[FileRecord]) -> DetectionResult {
        detect(description, files)
    }

    /// Runs an independent detection pass, then scores against it.
    pub fn validate(&self, dataset: &Dataset) -> ValidationResult {
        let detection = detect(&dataset.info.description, dataset.files());
        self.scoring.score(dataset, &detection)
    }

    pub fn tag(&self, dataset: &Dataset) -> ContentAnalysis {
        self.tagger.tag(dataset)
    }

    pub fn publish(&self, dataset: &Dataset) -> PublishRecord {
        self.publisher.synthesize(dataset)
    }
}

impl Default for LocalHeuristicEngine {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl InferencePort for LocalHeuristicEngine {
    async fn detect(&self, description: &str, files: &[FileRecord]) -> anyhow::Result<DetectionResult> {
        Ok(LocalHeuristicEngine::detect(self, description, files))
    }

    async fn validate(&self, dataset: &Dataset) -> anyhow::Result<ValidationResult> {
        Ok(LocalHeuristicEngine::validate(self, dataset))
    }

    async fn tag(&self, dataset: &Dataset) -> anyhow::Result<ContentAnalysis> {
        Ok(LocalHeuristicEngine::tag(self, dataset))
    }

    async fn publish(&self, dataset: &Dataset) -> anyhow::Result<PublishRecord> {
        Ok(LocalHeuristicEngine::publish(self, dataset))
    }
}
