use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Dataset;
use crate::pipeline::storage::Catalog;

/// Optional narrowing applied on top of the free-text query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub robot: Option<String>,
    pub sensor: Option<String>,
    pub min_quality: Option<u32>,
}

/// Aggregate statistics over the published datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub total_datasets: usize,
    pub avg_quality: u32,
    pub total_views: u64,
    pub total_downloads: u64,
    pub datasets: Vec<Dataset>,
}

/// Read path over the published catalog.
pub struct SearchUseCase {
    catalog: Catalog,
}

impl SearchUseCase {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Datasets where any searchable field contains `query`, ignoring case.
    /// A blank query matches nothing.
    pub async fn search(&self, query: &str) -> Vec<Dataset> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        let results: Vec<Dataset> = self
            .catalog
            .snapshot()
            .await
            .into_iter()
            .filter(|d| matches_query(d, &query))
            .collect();
        debug!("Search '{}' matched {} datasets", query, results.len());
        results
    }

    /// Query and filters ANDed together; a blank query matches everything.
    pub async fn filtered_search(&self, query: &str, filters: &SearchFilters) -> Vec<Dataset> {
        let query = query.trim().to_lowercase();
        let robot = lowered(filters.robot.as_deref());
        let sensor = lowered(filters.sensor.as_deref());

        self.catalog
            .snapshot()
            .await
            .into_iter()
            .filter(|d| query.is_empty() || matches_query(d, &query))
            .filter(|d| {
                robot
                    .as_deref()
                    .map_or(true, |r| d.info.robot_model.to_lowercase().contains(r))
            })
            .filter(|d| {
                sensor.as_deref().map_or(true, |s| {
                    d.info
                        .sensor_list()
                        .iter()
                        .any(|listed| listed.to_lowercase().contains(s))
                })
            })
            .filter(|d| {
                filters
                    .min_quality
                    .map_or(true, |min| d.overall_score().is_some_and(|score| score >= min))
            })
            .collect()
    }

    pub async fn profile(&self) -> ProfileSummary {
        profile_summary(self.catalog.published().await)
    }
}

fn lowered(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

fn matches_query(dataset: &Dataset, query: &str) -> bool {
    let info = &dataset.info;
    [&info.title, &info.description, &info.robot_model, &info.sensors]
        .into_iter()
        .any(|field| field.to_lowercase().contains(query))
        || dataset
            .content_tags()
            .iter()
            .any(|tag| tag.to_lowercase().contains(query))
}

/// Totals over `datasets`; the average quality is the rounded mean with
/// unscored datasets counted as zero.
pub fn profile_summary(datasets: Vec<Dataset>) -> ProfileSummary {
    let total_datasets = datasets.len();
    let avg_quality = if total_datasets == 0 {
        0
    } else {
        let sum: u64 = datasets
            .iter()
            .map(|d| u64::from(d.overall_score().unwrap_or(0)))
            .sum();
        (sum as f64 / total_datasets as f64).round() as u32
    };

    ProfileSummary {
        total_datasets,
        avg_quality,
        total_views: datasets.iter().map(|d| d.views).sum(),
        total_downloads: datasets.iter().map(|d| d.downloads).sum(),
        datasets,
    }
}
