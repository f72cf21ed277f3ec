use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::app::ports::CompletionPort;
use crate::config::InferenceConfig;

/// OpenAI-compatible chat-completions client.
pub struct HttpCompletionClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl HttpCompletionClient {
    pub fn new(base_url: &str, config: &InferenceConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("failed to build inference HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            client,
        })
    }

    /// Client for the configured backend, or `None` when no URL is set.
    pub fn from_config(config: &InferenceConfig) -> anyhow::Result<Option<Self>> {
        match config.base_url.as_deref() {
            Some(url) => Ok(Some(Self::new(url, config)?)),
            None => Ok(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CompletionPort for HttpCompletionClient {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.2
        });

        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut req = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let resp = req.send().await?.error_for_status()?;
        let json: serde_json::Value = resp.json().await?;
        debug!("Completion response received from {}", url);

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .context("completion response has no choices[0].message.content")
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}
