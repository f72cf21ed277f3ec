use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, info_span, warn, Instrument, Span};

use crate::app::ports::{InferencePort, PersistencePort, StatusReporter};
use crate::constants::AUTOFILL_MIN_DESCRIPTION_LEN;
use crate::domain::{Dataset, DatasetInfo, FileRecord, Stage, StageEvent, StageStatus, ValidationResult};
use crate::error::{PipelineError, Result};
use crate::observability::metrics;
use crate::pipeline::ingestion::FileCatalog;
use crate::pipeline::storage::{Catalog, CatalogEntry};

/// In-flight state for one dataset: its uploads, the record being built and
/// the per-stage status board.
#[derive(Debug)]
pub struct PipelineSession {
    pub files: FileCatalog,
    pub info: DatasetInfo,
    dataset: Option<Dataset>,
    statuses: [StageStatus; 4],
}

impl PipelineSession {
    pub fn new(files: FileCatalog, info: DatasetInfo) -> Self {
        Self {
            files,
            info,
            dataset: None,
            statuses: [StageStatus::Waiting; 4],
        }
    }

    /// The dataset as built so far; stays inspectable after a failed stage.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn status(&self, stage: Stage) -> StageStatus {
        self.statuses[stage.position()]
    }

    pub fn statuses(&self) -> [StageStatus; 4] {
        self.statuses
    }

    fn active_dataset(&mut self, stage: Stage) -> Result<&mut Dataset> {
        self.dataset
            .as_mut()
            .ok_or(PipelineError::NoActiveDataset(stage.index()))
    }
}

/// How a full run ended.
#[derive(Debug)]
pub enum PipelineOutcome {
    Published(Box<Dataset>),
    Halted { stage: Stage, error: PipelineError },
}

impl PipelineOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, PipelineOutcome::Published(_))
    }
}

/// Drives a dataset through ingestion, validation, analysis and publishing.
///
/// Stages run strictly one after another. Each stage entry point can also be
/// invoked on its own to retry a failed stage; that only resets the retried
/// stage's status.
pub struct PipelineOrchestrator {
    inference: Arc<dyn InferencePort>,
    catalog: Catalog,
    persistence: Arc<dyn PersistencePort>,
    reporter: Arc<dyn StatusReporter>,
    settle_delay: Duration,
}

impl PipelineOrchestrator {
    pub fn new(
        inference: Arc<dyn InferencePort>,
        catalog: Catalog,
        persistence: Arc<dyn PersistencePort>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            inference,
            catalog,
            persistence,
            reporter,
            settle_delay: Duration::ZERO,
        }
    }

    /// Pause between a completed stage and the next one, for observers.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Fills a blank robot model or sensor list from detection once the
    /// description is long enough to be worth scanning. Declared values are
    /// never overwritten.
    pub async fn autofill_info(&self, info: &mut DatasetInfo, files: &[FileRecord]) {
        if info.description.chars().count() < AUTOFILL_MIN_DESCRIPTION_LEN {
            return;
        }
        let detection = match self.inference.detect(&info.description, files).await {
            Ok(detection) => detection,
            Err(e) => {
                warn!("⚠️ Auto-detection failed, leaving metadata as declared: {}", e);
                return;
            }
        };
        if info.robot_model.trim().is_empty() {
            info.robot_model = detection.robot_model;
        }
        if info.sensors.trim().is_empty() {
            info.sensors = detection.sensors;
        }
    }

    /// Runs all four stages, stopping at the first fatal error.
    pub async fn run(&self, session: &mut PipelineSession) -> PipelineOutcome {
        let span = info_span!("pipeline", dataset_id = tracing::field::Empty);
        self.run_stages(session).instrument(span).await
    }

    async fn run_stages(&self, session: &mut PipelineSession) -> PipelineOutcome {
        info!("🚀 Starting pipeline for '{}'", session.info.title);

        for (step, stage) in Stage::ALL.into_iter().enumerate() {
            if step > 0 && !self.settle_delay.is_zero() {
                tokio::time::sleep(self.settle_delay).await;
            }

            let result = match stage {
                Stage::Ingestion => self.run_stage1(session).await,
                Stage::Validation => self.run_stage2(session).await,
                Stage::Analysis => self.run_stage3(session).await,
                Stage::Publishing => self.run_stage4(session).await,
            };

            if stage == Stage::Ingestion {
                if let Some(dataset) = session.dataset() {
                    Span::current().record("dataset_id", dataset.id.as_str());
                }
            }

            if let Err(error) = result {
                error!("💥 Pipeline halted at {}: {}", stage, error);
                return PipelineOutcome::Halted { stage, error };
            }
        }

        match session.dataset() {
            Some(dataset) => {
                info!("🎉 Dataset {} published", dataset.id);
                PipelineOutcome::Published(Box::new(dataset.clone()))
            }
            None => PipelineOutcome::Halted {
                stage: Stage::Publishing,
                error: PipelineError::NoActiveDataset(Stage::Publishing.index()),
            },
        }
    }

    /// Ingestion: standardizes the uploaded files into a fresh dataset record.
    pub async fn run_stage1(&self, session: &mut PipelineSession) -> Result<()> {
        let stage = Stage::Ingestion;
        let started = Instant::now();
        self.report(session, stage, StageStatus::Active, "Processing...", "Parsing and unpacking uploaded files...");

        if session.files.is_empty() {
            return Err(self.fail(session, stage, "Error during data ingestion", PipelineError::EmptyInput));
        }
        if let Err(e) = session.info.check() {
            return Err(self.fail(session, stage, "Error during data ingestion", e));
        }

        let standardized = session.files.standardize();
        let total_files = standardized.total_files;
        let mut dataset = Dataset::new(session.info.clone());
        dataset.standardized_data = Some(standardized);
        info!("📦 Ingested {} files into dataset {}", total_files, dataset.id);
        session.dataset = Some(dataset);

        self.complete(
            session,
            stage,
            started,
            "Completed",
            format!("Processed {total_files} files. Converted to standardized formats."),
        );
        Ok(())
    }

    /// Validation: scores the dataset and rejects results that are out of shape.
    pub async fn run_stage2(&self, session: &mut PipelineSession) -> Result<()> {
        let stage = Stage::Validation;
        let started = Instant::now();
        self.report(
            session,
            stage,
            StageStatus::Active,
            "Validating...",
            "Checking file completeness, timestamps, robot constraints...",
        );

        let outcome = match session.dataset() {
            Some(dataset) => self
                .inference
                .validate(dataset)
                .await
                .map_err(|e| PipelineError::MalformedScore(e.to_string()))
                .and_then(check_validation_shape),
            None => Err(PipelineError::NoActiveDataset(stage.index())),
        };
        let report = match outcome {
            Ok(report) => report,
            Err(e) => return Err(self.fail(session, stage, "Failed to validate", e)),
        };

        let detail = format!(
            "Quality Score: {}%. Passed checks: {}/{}",
            report.overall_score, report.passed_checks, report.total_checks
        );
        session.active_dataset(stage)?.quality_report = Some(report);
        self.complete(session, stage, started, "Validation Completed", detail);
        Ok(())
    }

    /// Analysis: attaches content tags and a trajectory classification.
    pub async fn run_stage3(&self, session: &mut PipelineSession) -> Result<()> {
        let stage = Stage::Analysis;
        let started = Instant::now();
        self.report(session, stage, StageStatus::Active, "Analyzing...", "Extracting features and generating AI tags...");

        let outcome = match session.dataset() {
            Some(dataset) => self
                .inference
                .tag(dataset)
                .await
                .map_err(|e| PipelineError::TagGeneration(e.to_string())),
            None => Err(PipelineError::NoActiveDataset(stage.index())),
        };
        let analysis = match outcome {
            Ok(analysis) => analysis,
            Err(e) => return Err(self.fail(session, stage, "Error during AI analysis", e)),
        };

        let detail = format!(
            "Generated {} content tags and trajectory classification.",
            analysis.content_tags.len()
        );
        session.active_dataset(stage)?.ai_analysis = Some(analysis);
        self.complete(session, stage, started, "Completed", detail);
        Ok(())
    }

    /// Publishing: stamps DOI and citation, prepends to the catalog and hands
    /// the record to persistence. Persistence failures are logged and dropped.
    pub async fn run_stage4(&self, session: &mut PipelineSession) -> Result<()> {
        let stage = Stage::Publishing;
        let started = Instant::now();
        self.report(
            session,
            stage,
            StageStatus::Active,
            "Publishing...",
            "Generating dataset page and making searchable...",
        );

        let outcome = match session.dataset() {
            Some(dataset) => self
                .inference
                .publish(dataset)
                .await
                .map_err(|e| PipelineError::Publish(e.to_string())),
            None => Err(PipelineError::NoActiveDataset(stage.index())),
        };
        let record = match outcome {
            Ok(record) => record,
            Err(e) => return Err(self.fail(session, stage, "Error during publishing", e)),
        };

        let dataset = session.active_dataset(stage)?;
        dataset.doi = Some(record.doi.clone());
        dataset.citation = Some(record.citation);
        dataset.published = true;
        dataset.views = 0;
        dataset.downloads = 0;
        let published = dataset.clone();

        let catalog_size = self.catalog.prepend(published.clone()).await;
        metrics::catalog::size(catalog_size);
        metrics::pipeline::dataset_published();

        let entry = CatalogEntry::from_dataset(&published);
        if let Err(e) = self.persistence.append(&entry).await {
            metrics::catalog::persistence_failed();
            warn!("⚠️ Failed to persist dataset {}: {}", published.id, e);
        }

        self.complete(
            session,
            stage,
            started,
            "Published!",
            format!("Dataset published with DOI: {}", record.doi),
        );
        Ok(())
    }

    fn report(&self, session: &mut PipelineSession, stage: Stage, status: StageStatus, label: &str, detail: &str) {
        session.statuses[stage.position()] = status;
        self.reporter.report(&StageEvent {
            stage,
            status,
            label: label.to_string(),
            detail: detail.to_string(),
        });
    }

    fn complete(&self, session: &mut PipelineSession, stage: Stage, started: Instant, label: &str, detail: String) {
        info!("✅ {} completed: {}", stage, detail);
        metrics::pipeline::stage_completed(stage, started.elapsed().as_secs_f64());
        self.report(session, stage, StageStatus::Completed, label, &detail);
    }

    fn fail(&self, session: &mut PipelineSession, stage: Stage, context: &str, error: PipelineError) -> PipelineError {
        error!("❌ {} failed: {}", stage, error);
        metrics::pipeline::stage_failed(stage);
        self.report(session, stage, StageStatus::Error, "Failed", &format!("{context}: {error}"));
        error
    }
}

fn check_validation_shape(report: ValidationResult) -> Result<ValidationResult> {
    if report.total_checks == 0 {
        return Err(PipelineError::MalformedScore("totalChecks is zero".into()));
    }
    if report.passed_checks > report.total_checks {
        return Err(PipelineError::MalformedScore(format!(
            "passedChecks {} exceeds totalChecks {}",
            report.passed_checks, report.total_checks
        )));
    }
    if report.overall_score > 100 {
        return Err(PipelineError::MalformedScore(format!(
            "overallScore {} is outside 0..=100",
            report.overall_score
        )));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentAnalysis, DetectionResult, PublishRecord};
    use crate::pipeline::processing::LocalHeuristicEngine;
    use crate::pipeline::storage::InMemoryPersistence;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct MockReporter {
        pub events: Arc<std::sync::Mutex<Vec<StageEvent>>>,
    }

    impl MockReporter {
        fn new() -> Self {
            Self {
                events: Arc::new(std::sync::Mutex::new(Vec::new())),
            }
        }

        fn events(&self) -> Vec<StageEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl StatusReporter for MockReporter {
        fn report(&self, event: &StageEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    /// Delegates to the local engine but can be told to fail individual tasks.
    struct ScriptedInference {
        engine: LocalHeuristicEngine,
        fail_tag: Option<String>,
        validation_override: Option<ValidationResult>,
        pub calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ScriptedInference {
        fn new() -> Self {
            Self {
                engine: LocalHeuristicEngine::new(Some(1)),
                fail_tag: None,
                validation_override: None,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl InferencePort for ScriptedInference {
        async fn detect(&self, description: &str, files: &[FileRecord]) -> anyhow::Result<DetectionResult> {
            self.calls.lock().await.push("detect");
            Ok(self.engine.detect(description, files))
        }

        async fn validate(&self, dataset: &Dataset) -> anyhow::Result<ValidationResult> {
            self.calls.lock().await.push("validate");
            Ok(self
                .validation_override
                .clone()
                .unwrap_or_else(|| self.engine.validate(dataset)))
        }

        async fn tag(&self, dataset: &Dataset) -> anyhow::Result<ContentAnalysis> {
            self.calls.lock().await.push("tag");
            match &self.fail_tag {
                Some(message) => Err(anyhow::anyhow!(message.clone())),
                None => Ok(self.engine.tag(dataset)),
            }
        }

        async fn publish(&self, dataset: &Dataset) -> anyhow::Result<PublishRecord> {
            self.calls.lock().await.push("publish");
            Ok(self.engine.publish(dataset))
        }
    }

    struct FailingPersistence;

    #[async_trait]
    impl PersistencePort for FailingPersistence {
        async fn append(&self, _entry: &CatalogEntry) -> Result<()> {
            Err(PipelineError::Persistence("store offline".into()))
        }

        async fn load_all(&self) -> Result<Vec<CatalogEntry>> {
            Ok(Vec::new())
        }
    }

    fn session(title: &str, file_names: &[&str]) -> PipelineSession {
        let mut files = FileCatalog::new();
        for name in file_names {
            files.add_file(FileRecord::guessed(*name, 2048));
        }
        PipelineSession::new(
            files,
            DatasetInfo {
                title: title.into(),
                robot_model: "Universal Robots UR5".into(),
                sensors: "Camera".into(),
                description: "UR5 picking boxes with a camera in a warehouse".into(),
                price: 0.0,
            },
        )
    }

    fn orchestrator(
        inference: ScriptedInference,
        persistence: Arc<dyn PersistencePort>,
    ) -> (PipelineOrchestrator, Arc<MockReporter>, Arc<Mutex<Vec<&'static str>>>) {
        let reporter = Arc::new(MockReporter::new());
        let calls = inference.calls.clone();
        let orchestrator = PipelineOrchestrator::new(
            Arc::new(inference),
            Catalog::new(),
            persistence,
            reporter.clone(),
        );
        (orchestrator, reporter, calls)
    }

    #[tokio::test]
    async fn full_run_publishes_and_persists() {
        let store = InMemoryPersistence::new();
        let (orchestrator, reporter, _) = orchestrator(ScriptedInference::new(), Arc::new(store.clone()));
        let mut session = session("Warehouse", &["a.csv", "b.png", "c.json"]);

        let outcome = orchestrator.run(&mut session).await;

        let PipelineOutcome::Published(dataset) = outcome else {
            panic!("expected a published dataset");
        };
        assert!(dataset.published);
        assert_eq!(dataset.views, 0);
        assert!(dataset.doi.as_deref().unwrap().starts_with("10.1000/"));
        assert_eq!(session.statuses(), [StageStatus::Completed; 4]);
        assert_eq!(orchestrator.catalog().len().await, 1);
        assert_eq!(store.entries().len(), 1);

        let events = reporter.events();
        assert_eq!(events.len(), 8);
        assert_eq!(events[0].status, StageStatus::Active);
        assert_eq!(events[7].stage, Stage::Publishing);
        assert_eq!(events[7].label, "Published!");
    }

    #[tokio::test]
    async fn empty_upload_halts_at_ingestion() {
        let (orchestrator, reporter, calls) = orchestrator(ScriptedInference::new(), Arc::new(InMemoryPersistence::new()));
        let mut session = session("Nothing", &[]);

        let outcome = orchestrator.run(&mut session).await;

        assert!(matches!(
            outcome,
            PipelineOutcome::Halted { stage: Stage::Ingestion, error: PipelineError::EmptyInput }
        ));
        assert_eq!(session.status(Stage::Ingestion), StageStatus::Error);
        assert_eq!(session.status(Stage::Validation), StageStatus::Waiting);
        assert!(calls.lock().await.is_empty());
        assert!(orchestrator.catalog().is_empty().await);
        let last = reporter.events().pop().unwrap();
        assert!(last.detail.contains("No files uploaded"));
    }

    #[tokio::test]
    async fn negative_price_halts_at_ingestion_and_is_never_stored() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let (orchestrator, reporter, calls) = orchestrator(ScriptedInference::new(), persistence.clone());
        let mut session = session("Discounted", &["a.csv"]);
        session.info.price = -25.0;

        let outcome = orchestrator.run(&mut session).await;

        assert!(matches!(
            outcome,
            PipelineOutcome::Halted { stage: Stage::Ingestion, error: PipelineError::InvalidInfo(_) }
        ));
        assert_eq!(session.status(Stage::Ingestion), StageStatus::Error);
        assert!(session.dataset().is_none());
        assert!(calls.lock().await.is_empty());
        assert!(orchestrator.catalog().is_empty().await);
        assert!(persistence.entries().is_empty());
        let last = reporter.events().pop().unwrap();
        assert!(last.detail.contains("price"));
    }

    #[tokio::test]
    async fn tag_failure_halts_with_message_passed_through() {
        let mut inference = ScriptedInference::new();
        inference.fail_tag = Some("tag vocabulary unavailable".into());
        let (orchestrator, _, calls) = orchestrator(inference, Arc::new(InMemoryPersistence::new()));
        let mut session = session("Kitchen", &["a.csv"]);

        let outcome = orchestrator.run(&mut session).await;

        match outcome {
            PipelineOutcome::Halted { stage, error } => {
                assert_eq!(stage, Stage::Analysis);
                assert_eq!(error.to_string(), "tag vocabulary unavailable");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!calls.lock().await.contains(&"publish"));
        assert!(orchestrator.catalog().is_empty().await);
        // Earlier stages' data stays inspectable.
        assert!(session.dataset().unwrap().quality_report.is_some());
    }

    #[tokio::test]
    async fn out_of_shape_score_is_malformed() {
        let mut inference = ScriptedInference::new();
        inference.validation_override = Some(ValidationResult {
            overall_score: 80,
            passed_checks: 20,
            total_checks: 16,
            scenario: String::new(),
            checks: Vec::new(),
            completeness_data: Default::default(),
            timestamp_data: Default::default(),
        });
        let (orchestrator, _, calls) = orchestrator(inference, Arc::new(InMemoryPersistence::new()));
        let mut session = session("Bad", &["a.csv"]);

        let outcome = orchestrator.run(&mut session).await;

        assert!(matches!(
            outcome,
            PipelineOutcome::Halted { stage: Stage::Validation, error: PipelineError::MalformedScore(_) }
        ));
        assert_eq!(*calls.lock().await, vec!["validate"]);
    }

    #[tokio::test]
    async fn persistence_failure_does_not_block_publishing() {
        let (orchestrator, _, _) = orchestrator(ScriptedInference::new(), Arc::new(FailingPersistence));
        let mut session = session("Offline", &["a.csv"]);

        let outcome = orchestrator.run(&mut session).await;

        assert!(outcome.is_published());
        assert_eq!(orchestrator.catalog().len().await, 1);
    }

    #[tokio::test]
    async fn stages_require_an_ingested_dataset() {
        let (orchestrator, _, _) = orchestrator(ScriptedInference::new(), Arc::new(InMemoryPersistence::new()));
        let mut session = session("Out of order", &["a.csv"]);

        let err = orchestrator.run_stage2(&mut session).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoActiveDataset(2)));
        assert_eq!(session.status(Stage::Validation), StageStatus::Error);
    }

    #[tokio::test]
    async fn retrying_a_failed_stage_resets_only_that_stage() {
        let (orchestrator, _, _) = orchestrator(ScriptedInference::new(), Arc::new(InMemoryPersistence::new()));
        let mut session = session("Retry", &[]);

        assert!(orchestrator.run_stage1(&mut session).await.is_err());
        session.files.add_file(FileRecord::guessed("late.csv", 10));
        orchestrator.run_stage1(&mut session).await.unwrap();

        assert_eq!(session.status(Stage::Ingestion), StageStatus::Completed);
        assert_eq!(session.status(Stage::Validation), StageStatus::Waiting);
    }

    #[tokio::test]
    async fn autofill_only_fills_blanks_for_long_descriptions() {
        let (orchestrator, _, _) = orchestrator(ScriptedInference::new(), Arc::new(InMemoryPersistence::new()));

        let mut info = DatasetInfo {
            robot_model: "My Custom Arm".into(),
            description: "A Franka Panda arm with a wrist camera stacking blocks".into(),
            ..Default::default()
        };
        orchestrator.autofill_info(&mut info, &[]).await;
        assert_eq!(info.robot_model, "My Custom Arm");
        assert_eq!(info.sensors, "Camera");

        let mut short = DatasetInfo {
            description: "UR5 camera".into(),
            ..Default::default()
        };
        orchestrator.autofill_info(&mut short, &[]).await;
        assert!(short.robot_model.is_empty());
        assert!(short.sensors.is_empty());
    }
}
