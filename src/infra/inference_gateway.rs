use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::completion_client::HttpCompletionClient;
use super::json_extract::extract_json_object;
use super::prompts;
use crate::app::ports::{CompletionPort, InferencePort};
use crate::config::InferenceConfig;
use crate::domain::{
    Check, CompletenessData, ContentAnalysis, Dataset, DetectionResult, FileRecord, PublishRecord,
    TimestampData, TrajectoryClassification, ValidationResult,
};
use crate::observability::metrics;
use crate::pipeline::processing::LocalHeuristicEngine;

/// One unit of work for the gateway.
#[derive(Debug, Clone)]
pub enum InferenceTask {
    Detect { description: String, files: Vec<FileRecord> },
    Validate(Box<Dataset>),
    Tag(Box<Dataset>),
    Publish(Box<Dataset>),
}

impl InferenceTask {
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceTask::Detect { .. } => "detect",
            InferenceTask::Validate(_) => "validate",
            InferenceTask::Tag(_) => "tag",
            InferenceTask::Publish(_) => "publish",
        }
    }
}

/// Typed result per task kind.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceResult {
    Detection(DetectionResult),
    Validation(ValidationResult),
    Analysis(ContentAnalysis),
    Publication(PublishRecord),
}

impl InferenceResult {
    pub fn to_json(&self) -> Value {
        let value = match self {
            InferenceResult::Detection(r) => serde_json::to_value(r),
            InferenceResult::Validation(r) => serde_json::to_value(r),
            InferenceResult::Analysis(r) => serde_json::to_value(r),
            InferenceResult::Publication(r) => serde_json::to_value(r),
        };
        value.unwrap_or(Value::Null)
    }
}

/// Remote inference with a local fallback for every task.
///
/// Any failure on the remote path (no backend configured, transport error,
/// non-2xx status, timeout, unparseable text, missing or out-of-shape
/// fields) yields the local heuristic result for the same input. Callers
/// never see an error from the gateway.
pub struct InferenceGateway {
    backend: Option<Arc<dyn CompletionPort>>,
    fallback: Arc<LocalHeuristicEngine>,
    timeout: Duration,
}

impl InferenceGateway {
    pub fn new(
        backend: Option<Arc<dyn CompletionPort>>,
        fallback: Arc<LocalHeuristicEngine>,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            fallback,
            timeout,
        }
    }

    pub fn from_config(config: &InferenceConfig, fallback: Arc<LocalHeuristicEngine>) -> anyhow::Result<Self> {
        let backend = HttpCompletionClient::from_config(config)?
            .map(|client| Arc::new(client) as Arc<dyn CompletionPort>);
        match &backend {
            Some(client) => info!("Inference backend enabled: {}", client.name()),
            None => info!("No inference backend configured; using local heuristics only"),
        }
        Ok(Self::new(backend, fallback, config.timeout()))
    }

    pub fn is_fallback_only(&self) -> bool {
        self.backend.is_none()
    }

    /// Generic task dispatcher over the typed entry points.
    pub async fn call(&self, task: InferenceTask) -> InferenceResult {
        match task {
            InferenceTask::Detect { description, files } => {
                InferenceResult::Detection(self.detect_or_fallback(&description, &files).await)
            }
            InferenceTask::Validate(dataset) => {
                InferenceResult::Validation(self.validate_or_fallback(&dataset).await)
            }
            InferenceTask::Tag(dataset) => InferenceResult::Analysis(self.tag_or_fallback(&dataset).await),
            InferenceTask::Publish(dataset) => {
                InferenceResult::Publication(self.publish_or_fallback(&dataset).await)
            }
        }
    }

    pub async fn detect_or_fallback(&self, description: &str, files: &[FileRecord]) -> DetectionResult {
        match self
            .remote("detect", prompts::detect_prompt(description, files), coerce_detection)
            .await
        {
            Some(result) => result,
            None => self.fallback.detect(description, files),
        }
    }

    pub async fn validate_or_fallback(&self, dataset: &Dataset) -> ValidationResult {
        match self
            .remote("validate", prompts::validate_prompt(dataset), coerce_validation)
            .await
        {
            Some(result) => result,
            None => self.fallback.validate(dataset),
        }
    }

    pub async fn tag_or_fallback(&self, dataset: &Dataset) -> ContentAnalysis {
        match self.remote("tag", prompts::tag_prompt(dataset), coerce_analysis).await {
            Some(result) => result,
            None => self.fallback.tag(dataset),
        }
    }

    pub async fn publish_or_fallback(&self, dataset: &Dataset) -> PublishRecord {
        match self
            .remote("publish", prompts::publish_prompt(dataset), coerce_publication)
            .await
        {
            Some(result) => result,
            None => self.fallback.publish(dataset),
        }
    }

    async fn remote<T>(&self, task: &'static str, prompt: String, coerce: fn(&Value) -> Option<T>) -> Option<T> {
        let backend = self.backend.as_ref()?;

        let text = match tokio::time::timeout(self.timeout, backend.complete(&prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                return self.fell_back(task, &format!("backend error: {e:#}"));
            }
            Err(_) => {
                return self.fell_back(task, &format!("timed out after {:?}", self.timeout));
            }
        };

        let Some(value) = extract_json_object(&text) else {
            return self.fell_back(task, "response contained no JSON object");
        };
        match coerce(&value) {
            Some(result) => {
                debug!("Remote {} result accepted", task);
                metrics::inference::remote_success(task);
                Some(result)
            }
            None => self.fell_back(task, "response is missing expected fields"),
        }
    }

    fn fell_back<T>(&self, task: &'static str, reason: &str) -> Option<T> {
        warn!("⚠️ Inference '{}' falling back to local heuristics: {}", task, reason);
        metrics::inference::fallback(task);
        None
    }
}

#[async_trait]
impl InferencePort for InferenceGateway {
    async fn detect(&self, description: &str, files: &[FileRecord]) -> anyhow::Result<DetectionResult> {
        Ok(self.detect_or_fallback(description, files).await)
    }

    async fn validate(&self, dataset: &Dataset) -> anyhow::Result<ValidationResult> {
        Ok(self.validate_or_fallback(dataset).await)
    }

    async fn tag(&self, dataset: &Dataset) -> anyhow::Result<ContentAnalysis> {
        Ok(self.tag_or_fallback(dataset).await)
    }

    async fn publish(&self, dataset: &Dataset) -> anyhow::Result<PublishRecord> {
        Ok(self.publish_or_fallback(dataset).await)
    }
}

fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(|s| s.trim().to_string()))
        .collect::<Option<Vec<String>>>()
        .map(|items| items.into_iter().filter(|s| !s.is_empty()).collect())
}

fn count_field(value: &Value, key: &str) -> Option<u32> {
    let n = value.get(key)?.as_f64()?;
    (n.is_finite() && n >= 0.0 && n <= f64::from(u32::MAX)).then(|| n.round() as u32)
}

pub fn coerce_detection(value: &Value) -> Option<DetectionResult> {
    let robot_model = value.get("robotModel")?.as_str()?.trim().to_string();
    let sensors = match value.get("sensors")? {
        Value::String(s) => s.trim().to_string(),
        list @ Value::Array(_) => string_list(list)?.join(", "),
        _ => return None,
    };
    Some(DetectionResult {
        robot_model,
        sensors,
    })
}

pub fn coerce_validation(value: &Value) -> Option<ValidationResult> {
    let overall_score = count_field(value, "overallScore")?;
    let passed_checks = count_field(value, "passedChecks")?;
    let total_checks = count_field(value, "totalChecks")?;
    if overall_score > 100 || total_checks == 0 || passed_checks > total_checks {
        return None;
    }

    let field = |key: &str| value.get(key).cloned().unwrap_or(Value::Null);
    Some(ValidationResult {
        overall_score,
        passed_checks,
        total_checks,
        scenario: value
            .get("scenario")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        checks: serde_json::from_value::<Vec<Check>>(field("checks")).unwrap_or_default(),
        completeness_data: serde_json::from_value::<CompletenessData>(field("completenessData"))
            .unwrap_or_default(),
        timestamp_data: serde_json::from_value::<TimestampData>(field("timestampData"))
            .unwrap_or_default(),
    })
}

pub fn coerce_analysis(value: &Value) -> Option<ContentAnalysis> {
    let tags = value.get("contentTags").or_else(|| value.get("tags"))?;
    let content_tags = string_list(tags)?;
    if content_tags.is_empty() {
        return None;
    }
    let trajectory_classification = value
        .get("trajectoryClassification")
        .cloned()
        .and_then(|v| serde_json::from_value::<TrajectoryClassification>(v).ok())
        .map(|mut t| {
            t.confidence = t.confidence.clamp(0.0, 1.0);
            t
        });
    Some(ContentAnalysis {
        content_tags,
        trajectory_classification,
    })
}

pub fn coerce_publication(value: &Value) -> Option<PublishRecord> {
    Some(PublishRecord {
        doi: non_empty_str(value, "doi")?,
        citation: non_empty_str(value, "citation")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DatasetInfo;
    use crate::pipeline::processing::publish::PublicationSynthesizer;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedBackend {
        reply: anyhow::Result<String>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl CannedBackend {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(anyhow::anyhow!("connection refused")),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CompletionPort for CannedBackend {
        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(anyhow::anyhow!(e.to_string())),
            }
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn engine() -> Arc<LocalHeuristicEngine> {
        Arc::new(LocalHeuristicEngine::new(Some(42)).with_publisher(PublicationSynthesizer::starting_at(700)))
    }

    fn gateway(backend: CannedBackend) -> InferenceGateway {
        InferenceGateway::new(Some(Arc::new(backend)), engine(), Duration::from_secs(5))
    }

    fn dataset() -> Dataset {
        Dataset::new(DatasetInfo {
            title: "Kitchen".into(),
            robot_model: "Franka Panda".into(),
            description: "Franka Panda cutting vegetables, wrist camera".into(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn remote_detection_is_used_when_well_formed() {
        let gw = gateway(CannedBackend::replying(
            r#"Here you go: {"robotModel": "KUKA KR6 R700", "sensors": ["LiDAR", "IMU"]}"#,
        ));
        let result = gw.detect_or_fallback("anything", &[]).await;
        assert_eq!(result.robot_model, "KUKA KR6 R700");
        assert_eq!(result.sensors, "LiDAR, IMU");
    }

    #[tokio::test]
    async fn backend_failure_equals_local_result() {
        let gw = gateway(CannedBackend::failing());
        let local = engine();
        let ds = dataset();

        assert_eq!(gw.detect_or_fallback(&ds.info.description, &[]).await, local.detect(&ds.info.description, &[]));
        assert_eq!(gw.validate_or_fallback(&ds).await, local.validate(&ds));
        assert_eq!(gw.tag_or_fallback(&ds).await, local.tag(&ds));
        assert_eq!(gw.publish_or_fallback(&ds).await, local.publish(&ds));
    }

    #[tokio::test]
    async fn missing_fields_fall_back() {
        let gw = gateway(CannedBackend::replying(r#"{"overallScore": "high", "passedChecks": 3}"#));
        let ds = dataset();
        assert_eq!(gw.validate_or_fallback(&ds).await, engine().validate(&ds));
    }

    #[tokio::test]
    async fn out_of_shape_score_falls_back() {
        let gw = gateway(CannedBackend::replying(
            r#"{"overallScore": 140, "passedChecks": 3, "totalChecks": 16}"#,
        ));
        let ds = dataset();
        assert_eq!(gw.validate_or_fallback(&ds).await, engine().validate(&ds));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out_into_fallback() {
        let mut backend = CannedBackend::replying(r#"{"doi": "10.9/1", "citation": "c"}"#);
        backend.delay = Duration::from_secs(60);
        let gw = InferenceGateway::new(Some(Arc::new(backend)), engine(), Duration::from_secs(1));

        let record = gw.publish_or_fallback(&dataset()).await;
        assert_eq!(record.doi, "10.1000/700");
    }

    #[tokio::test]
    async fn no_backend_is_permanent_fallback() {
        let gw = InferenceGateway::new(None, engine(), Duration::from_secs(1));
        assert!(gw.is_fallback_only());
        let result = gw
            .call(InferenceTask::Detect {
                description: "UR5 with lidar".into(),
                files: vec![],
            })
            .await;
        assert_eq!(
            result.to_json(),
            json!({"robotModel": "Universal Robots UR5", "sensors": "LiDAR"})
        );
    }

    #[tokio::test]
    async fn call_dispatches_by_task_kind() {
        let gw = gateway(CannedBackend::replying(
            r#"{"contentTags": ["kitchen", "cutting"], "trajectoryClassification": {"type": "Cutting", "confidence": 1.7}}"#,
        ));
        let task = InferenceTask::Tag(Box::new(dataset()));
        assert_eq!(task.kind(), "tag");

        let InferenceResult::Analysis(analysis) = gw.call(task).await else {
            panic!("expected an analysis result");
        };
        assert_eq!(analysis.content_tags, vec!["kitchen", "cutting"]);
        assert_eq!(analysis.trajectory_classification.unwrap().confidence, 1.0);
    }

    #[test]
    fn coercion_accepts_legacy_tags_key_and_rejects_empty_lists() {
        assert!(coerce_analysis(&json!({"tags": ["a"]})).is_some());
        assert!(coerce_analysis(&json!({"contentTags": []})).is_none());
        assert!(coerce_analysis(&json!({"contentTags": [1, 2]})).is_none());
    }

    #[test]
    fn publication_needs_both_strings() {
        assert!(coerce_publication(&json!({"doi": "10.1/2"})).is_none());
        assert!(coerce_publication(&json!({"doi": "10.1/2", "citation": " "})).is_none());
        assert!(coerce_publication(&json!({"doi": "10.1/2", "citation": "@dataset{}"})).is_some());
    }
}
