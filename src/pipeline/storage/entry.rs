use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_OWNER;
use crate::domain::{
    CompletenessData, ContentAnalysis, Dataset, DatasetInfo, TimestampData, ValidationResult,
};

/// Flat record handed to the persistence store after stage 4.
///
/// Field names follow the catalog database's snake_case columns. Only the
/// summary of the quality report is kept; the checklist and drift series are
/// presentation detail and are not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub dataset_id: String,
    pub name: String,
    pub owner: String,
    pub sensor_stack: String,
    pub components_used: String,
    pub description: String,
    pub price_for_download: f64,
    #[serde(default)]
    pub content_tags: Vec<String>,
    #[serde(default)]
    pub zip_file: String,
    pub timestamp: DateTime<Utc>,
    pub doi: String,
    pub citation: String,
    #[serde(default)]
    pub quality_score: Option<u32>,
    #[serde(default)]
    pub passed_checks: Option<u32>,
    #[serde(default)]
    pub total_checks: Option<u32>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub downloads: u64,
}

impl CatalogEntry {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let zip_file = dataset
            .files()
            .iter()
            .find(|f| f.source_archive.is_none() && f.is_archive())
            .map(|f| f.name.clone())
            .unwrap_or_default();
        let report = dataset.quality_report.as_ref();

        Self {
            dataset_id: dataset.id.clone(),
            name: dataset.info.title.clone(),
            owner: DEFAULT_OWNER.to_string(),
            sensor_stack: dataset.info.sensors.clone(),
            components_used: dataset.info.robot_model.clone(),
            description: dataset.info.description.clone(),
            price_for_download: dataset.info.price,
            content_tags: dataset.content_tags().to_vec(),
            zip_file,
            timestamp: dataset.timestamp,
            doi: dataset.doi.clone().unwrap_or_default(),
            citation: dataset.citation.clone().unwrap_or_default(),
            quality_score: report.map(|r| r.overall_score),
            passed_checks: report.map(|r| r.passed_checks),
            total_checks: report.map(|r| r.total_checks),
            views: dataset.views,
            downloads: dataset.downloads,
        }
    }

    /// Rebuilds a published dataset from a stored entry, for the read path.
    pub fn into_dataset(self) -> Dataset {
        let quality_report = self.quality_score.map(|overall_score| ValidationResult {
            overall_score,
            passed_checks: self.passed_checks.unwrap_or_default(),
            total_checks: self.total_checks.unwrap_or_default(),
            scenario: String::new(),
            checks: Vec::new(),
            completeness_data: CompletenessData::default(),
            timestamp_data: TimestampData::default(),
        });
        let ai_analysis = (!self.content_tags.is_empty()).then(|| ContentAnalysis {
            content_tags: self.content_tags,
            trajectory_classification: None,
        });

        Dataset {
            id: self.dataset_id,
            info: DatasetInfo {
                title: self.name,
                robot_model: self.components_used,
                sensors: self.sensor_stack,
                description: self.description,
                price: self.price_for_download,
            },
            timestamp: self.timestamp,
            standardized_data: None,
            quality_report,
            ai_analysis,
            doi: (!self.doi.is_empty()).then_some(self.doi),
            citation: (!self.citation.is_empty()).then_some(self.citation),
            published: true,
            views: self.views,
            downloads: self.downloads,
        }
    }
}
