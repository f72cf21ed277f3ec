//! Domain data shapes shared across layers.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::constants::mime_for_extension;

/// A single uploaded or archive-extracted file. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_archive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_count: Option<usize>,
}

impl FileRecord {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            source_archive: None,
            extracted_count: None,
        }
    }

    /// Builds a record whose MIME type is guessed from the file extension.
    pub fn guessed(name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        let mime = mime_for_extension(&extension_of(&name));
        Self::new(name, size, mime)
    }

    /// Lower-cased text after the last `.`; the whole name when there is none.
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }

    pub fn is_archive(&self) -> bool {
        self.mime_type == "application/zip" || self.name.to_lowercase().ends_with(".zip")
    }
}

pub(crate) fn extension_of(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_lowercase()
}

/// Metadata declared by the uploader before stage 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasetInfo {
    pub title: String,
    pub robot_model: String,
    /// Comma-separated sensor names, as typed by the uploader.
    pub sensors: String,
    pub description: String,
    pub price: f64,
}

impl DatasetInfo {
    /// Rejects metadata that cannot be published, currently a negative or non-finite price.
    pub fn check(&self) -> crate::error::Result<()> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(crate::error::PipelineError::InvalidInfo(format!(
                "price must be a non-negative number, got {}",
                self.price
            )));
        }
        Ok(())
    }

    pub fn sensor_list(&self) -> Vec<String> {
        self.sensors
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// The four sequential pipeline phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Ingestion,
    Validation,
    Analysis,
    Publishing,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Ingestion,
        Stage::Validation,
        Stage::Analysis,
        Stage::Publishing,
    ];

    /// 1-based stage index as reported to observers.
    pub fn index(self) -> u8 {
        match self {
            Stage::Ingestion => 1,
            Stage::Validation => 2,
            Stage::Analysis => 3,
            Stage::Publishing => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Ingestion => "ingestion",
            Stage::Validation => "validation",
            Stage::Analysis => "analysis",
            Stage::Publishing => "publishing",
        }
    }

    pub(crate) fn position(self) -> usize {
        usize::from(self.index() - 1)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} ({})", self.index(), self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    #[default]
    Waiting,
    Active,
    Completed,
    Error,
}

impl StageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StageStatus::Waiting => "waiting",
            StageStatus::Active => "active",
            StageStatus::Completed => "completed",
            StageStatus::Error => "error",
        }
    }
}

/// One status-report event emitted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    pub stage: Stage,
    pub status: StageStatus,
    pub label: String,
    pub detail: String,
}

/// Output of stage 1: the flattened file list and its extension histogram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardizedData {
    pub total_files: usize,
    pub files: Vec<FileRecord>,
    pub file_types: BTreeMap<String, usize>,
    pub standardized_formats: BTreeMap<String, String>,
}

impl StandardizedData {
    pub fn count(&self, extension: &str) -> usize {
        self.file_types.get(extension).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub name: String,
    pub passed: bool,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
}

/// Percentages of complete, missing and corrupted records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletenessData {
    pub complete: u32,
    pub missing: u32,
    pub corrupted: u32,
}

/// Illustrative clock-drift series; never feeds into the score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampData {
    pub timestamps: Vec<String>,
    pub drifts: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub overall_score: u32,
    pub passed_checks: u32,
    pub total_checks: u32,
    #[serde(default)]
    pub scenario: String,
    #[serde(default)]
    pub checks: Vec<Check>,
    #[serde(default)]
    pub completeness_data: CompletenessData,
    #[serde(default)]
    pub timestamp_data: TimestampData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryClassification {
    #[serde(rename = "type")]
    pub kind: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
    pub content_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trajectory_classification: Option<TrajectoryClassification>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub robot_model: String,
    /// Comma-joined sensor labels in first-detected order.
    pub sensors: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub doi: String,
    pub citation: String,
}

/// Aggregate root: created by stage 1 and filled in additively by later stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: String,
    pub info: DatasetInfo,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standardized_data: Option<StandardizedData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_report: Option<ValidationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<ContentAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub downloads: u64,
}

impl Dataset {
    pub fn new(info: DatasetInfo) -> Self {
        Self {
            id: generate_dataset_id(),
            info,
            timestamp: Utc::now(),
            standardized_data: None,
            quality_report: None,
            ai_analysis: None,
            doi: None,
            citation: None,
            published: false,
            views: 0,
            downloads: 0,
        }
    }

    pub fn overall_score(&self) -> Option<u32> {
        self.quality_report.as_ref().map(|r| r.overall_score)
    }

    pub fn content_tags(&self) -> &[String] {
        self.ai_analysis
            .as_ref()
            .map(|a| a.content_tags.as_slice())
            .unwrap_or(&[])
    }

    /// Files seen by stage 1, empty before ingestion has run.
    pub fn files(&self) -> &[FileRecord] {
        self.standardized_data
            .as_ref()
            .map(|d| d.files.as_slice())
            .unwrap_or(&[])
    }
}

/// `dataset_` followed by nine base-36 characters.
pub fn generate_dataset_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("dataset_{suffix}")
}
