//! Metrics for the dataset pipeline
//!
//! Metric names live in one enum so recording sites never spell a raw
//! string. Without an installed recorder every macro below is a no-op.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Environment variable holding the Prometheus listener address.
pub const METRICS_ADDR_ENV: &str = "ROBODATA_METRICS_ADDR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Pipeline stages
    StageCompleted,
    StageFailed,
    StageDuration,
    DatasetsPublished,

    // Quality gate
    QualityScore,
    QualityTierSelected,

    // Inference gateway
    InferenceRemoteSuccess,
    InferenceFallback,

    // Catalog
    PersistenceFailures,
    CatalogSize,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::StageCompleted => "robodata_stage_completed_total",
            MetricName::StageFailed => "robodata_stage_failed_total",
            MetricName::StageDuration => "robodata_stage_duration_seconds",
            MetricName::DatasetsPublished => "robodata_datasets_published_total",
            MetricName::QualityScore => "robodata_quality_score",
            MetricName::QualityTierSelected => "robodata_quality_tier_selected_total",
            MetricName::InferenceRemoteSuccess => "robodata_inference_remote_success_total",
            MetricName::InferenceFallback => "robodata_inference_fallback_total",
            MetricName::PersistenceFailures => "robodata_persistence_failures_total",
            MetricName::CatalogSize => "robodata_catalog_size",
        }
    }
}

/// Installs a Prometheus exporter when `ROBODATA_METRICS_ADDR` is set.
///
/// Idempotent. Returns whether an exporter is running after the call.
pub fn init_metrics() -> bool {
    INIT.call_once(|| {
        let Ok(addr_str) = std::env::var(METRICS_ADDR_ENV) else {
            return;
        };
        let addr = match addr_str.parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(_) => {
                warn!("Invalid metrics addr '{}', metrics exporter disabled", addr_str);
                return;
            }
        };
        match metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
        {
            Ok(()) => {
                info!("Prometheus exporter listening at http://{}/metrics", addr);
                INSTALLED.store(true, Ordering::SeqCst);
            }
            Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
        }
    });
    INSTALLED.load(Ordering::SeqCst)
}

pub mod pipeline {
    use super::MetricName;
    use crate::domain::Stage;

    pub fn stage_completed(stage: Stage, seconds: f64) {
        ::metrics::counter!(MetricName::StageCompleted.as_str(), "stage" => stage.as_str()).increment(1);
        ::metrics::histogram!(MetricName::StageDuration.as_str(), "stage" => stage.as_str()).record(seconds);
    }

    pub fn stage_failed(stage: Stage) {
        ::metrics::counter!(MetricName::StageFailed.as_str(), "stage" => stage.as_str()).increment(1);
    }

    pub fn dataset_published() {
        ::metrics::counter!(MetricName::DatasetsPublished.as_str()).increment(1);
    }
}

pub mod quality_gate {
    use super::MetricName;

    pub fn score_recorded(score: u32) {
        ::metrics::histogram!(MetricName::QualityScore.as_str()).record(f64::from(score));
    }

    pub fn tier_selected(tier: &'static str) {
        ::metrics::counter!(MetricName::QualityTierSelected.as_str(), "tier" => tier).increment(1);
    }
}

pub mod inference {
    use super::MetricName;

    pub fn remote_success(task: &'static str) {
        ::metrics::counter!(MetricName::InferenceRemoteSuccess.as_str(), "task" => task).increment(1);
    }

    pub fn fallback(task: &'static str) {
        ::metrics::counter!(MetricName::InferenceFallback.as_str(), "task" => task).increment(1);
    }
}

pub mod catalog {
    use super::MetricName;

    pub fn persistence_failed() {
        ::metrics::counter!(MetricName::PersistenceFailures.as_str()).increment(1);
    }

    pub fn size(len: usize) {
        ::metrics::gauge!(MetricName::CatalogSize.as_str()).set(len as f64);
    }
}
