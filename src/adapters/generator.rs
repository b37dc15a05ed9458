use crate::config::toml_config::GeneratorConfig;
use crate::domain::ports::TextGenerator;
use crate::utils::error::{MailError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text generator backed by an Ollama-compatible `/api/generate` endpoint.
pub struct OllamaGenerator {
    client: Client,
    config: GeneratorConfig,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: self.config.max_new_tokens,
                temperature: self.config.temperature,
            },
        };

        tracing::debug!(
            "Requesting completion from {} (model {})",
            self.generate_url(),
            self.config.model
        );
        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| MailError::GenerationError {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::GenerationError {
                message: format!("model server returned {}: {}", status, body),
            });
        }

        let body: GenerateResponse = response.json().await?;
        Ok(strip_reasoning(&body.response).trim().to_string())
    }
}

/// Drops a leading `<think>...</think>` block emitted by reasoning models.
fn strip_reasoning(text: &str) -> &str {
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<think>") {
        if let Some(end) = rest.find("</think>") {
            return &rest[end + "</think>".len()..];
        }
    }
    text
}
