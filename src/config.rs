use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CATALOG_PATH, DEFAULT_CONFIG_PATH, DEFAULT_INFERENCE_MODEL,
    DEFAULT_INFERENCE_TIMEOUT_SECS,
};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub inference: InferenceConfig,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
}

/// Connection settings for the remote inference backend.
///
/// Leaving `base_url` unset keeps the gateway in permanent fallback mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: DEFAULT_INFERENCE_MODEL.to_string(),
            timeout_seconds: DEFAULT_INFERENCE_TIMEOUT_SECS,
        }
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pause between a stage completing and the next one starting.
    pub settle_delay_ms: u64,
    /// Seed for the cosmetic random streams (drift jitter, tag sampling).
    pub seed: Option<u64>,
}

impl PipelineConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub catalog_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            catalog_path: DEFAULT_CATALOG_PATH.to_string(),
        }
    }
}

impl Config {
    /// Loads `robodata.toml` when present, then applies environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Like [`Config::load`] with an explicit file; a missing file means defaults.
    pub fn load_from(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let mut config = if config_path.exists() {
            Self::from_file(config_path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Overlays `ROBODATA_*` variables resolved through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ROBODATA_INFERENCE_URL") {
            self.inference.base_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(key) = lookup("ROBODATA_INFERENCE_KEY") {
            self.inference.api_key = Some(key).filter(|k| !k.trim().is_empty());
        }
        if let Some(model) = lookup("ROBODATA_INFERENCE_MODEL") {
            self.inference.model = model;
        }
        if let Some(secs) = lookup("ROBODATA_INFERENCE_TIMEOUT_SECS") {
            self.inference.timeout_seconds = parse_number("ROBODATA_INFERENCE_TIMEOUT_SECS", &secs)?;
        }
        if let Some(ms) = lookup("ROBODATA_SETTLE_DELAY_MS") {
            self.pipeline.settle_delay_ms = parse_number("ROBODATA_SETTLE_DELAY_MS", &ms)?;
        }
        if let Some(seed) = lookup("ROBODATA_SEED") {
            self.pipeline.seed = Some(parse_number("ROBODATA_SEED", &seed)?);
        }
        if let Some(path) = lookup("ROBODATA_CATALOG_PATH") {
            self.storage.catalog_path = path;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.inference.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PipelineError::Config(
                    "inference base_url must start with http:// or https://".to_string(),
                ));
            }
        }
        if self.inference.timeout_seconds == 0 {
            return Err(PipelineError::Config(
                "inference timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| PipelineError::Config(format!("{key} must be an unsigned integer, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_run_in_fallback_mode() {
        let config = Config::default();
        assert!(config.inference.base_url.is_none());
        assert_eq!(config.inference.timeout_seconds, DEFAULT_INFERENCE_TIMEOUT_SECS);
        assert_eq!(config.pipeline.settle_delay_ms, 0);
        assert_eq!(config.storage.catalog_path, DEFAULT_CATALOG_PATH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut config: Config = toml::from_str(
            r#"
            [inference]
            base_url = "http://localhost:1234"
            model = "local"

            [pipeline]
            settle_delay_ms = 1000
            "#,
        )
        .unwrap();

        config
            .apply_overrides(lookup_from(&[
                ("ROBODATA_INFERENCE_URL", "https://inference.example.com"),
                ("ROBODATA_SETTLE_DELAY_MS", "0"),
                ("ROBODATA_SEED", "42"),
            ]))
            .unwrap();

        assert_eq!(
            config.inference.base_url.as_deref(),
            Some("https://inference.example.com")
        );
        assert_eq!(config.inference.model, "local");
        assert_eq!(config.pipeline.settle_delay_ms, 0);
        assert_eq!(config.pipeline.seed, Some(42));
    }

    #[test]
    fn blank_url_override_disables_remote_inference() {
        let mut config = Config::default();
        config.inference.base_url = Some("http://localhost:1234".into());
        config
            .apply_overrides(lookup_from(&[("ROBODATA_INFERENCE_URL", "  ")]))
            .unwrap();
        assert!(config.inference.base_url.is_none());
    }

    #[test]
    fn rejects_non_http_url_and_bad_numbers() {
        let mut config = Config::default();
        config.inference.base_url = Some("ftp://nope".into());
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup_from(&[("ROBODATA_SEED", "abc")]))
            .unwrap_err();
        assert!(err.to_string().contains("ROBODATA_SEED"));
    }
}
