//! Embedding providers (spec §4.7, §9 "Pluralistic embedding providers"):
//! ordered model fallback, 404/"not found" tries the next model, any other
//! error propagates. Dimension is whatever the active model emits and MUST
//! match the configured vector index width — checked at the call site via
//! [`crate::domain::NewsItem::validate_embedding_dimension`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::error::{FanViseError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed with the provider's default model.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    /// Embed with an explicit model name, for fallback-list iteration.
    async fn embed_with_model(&self, model: &str, text: &str) -> Result<Vec<f32>>;
}

/// Embed `text`, walking `models` in order; a 404/"not found" response
/// tries the next model, any other error propagates immediately (spec §6
/// "Embedding provider").
pub async fn embed_with_fallback(
    provider: &dyn EmbeddingProvider,
    models: &[String],
    text: &str,
) -> Result<Vec<f32>> {
    let mut last_err = None;
    for model in models {
        match provider.embed_with_model(model, text).await {
            Ok(vec) => return Ok(vec),
            Err(FanViseError::EmbeddingUnavailable(msg)) if is_not_found(&msg) => {
                warn!(model, "embedding model not found, trying next in fallback list");
                last_err = Some(FanViseError::EmbeddingUnavailable(msg));
                continue;
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        FanViseError::EmbeddingUnavailable("no embedding models configured".to_string())
    }))
}

fn is_not_found(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("404") || lower.contains("not found")
}

pub fn build_provider(config: &EmbeddingConfig) -> Box<dyn EmbeddingProvider> {
    match config.provider {
        EmbeddingProviderKind::Gemini => Box::new(GeminiEmbeddingProvider::new(config.clone())),
        EmbeddingProviderKind::Ollama => Box::new(OllamaEmbeddingProvider::new(config.clone())),
        EmbeddingProviderKind::Openai => Box::new(OpenAiEmbeddingProvider::new(config.clone())),
    }
}

/// The fallback model list for the active provider (spec §9): the
/// configured model first, then a conservative older model as a backstop.
pub fn fallback_models(config: &EmbeddingConfig) -> Vec<String> {
    match config.provider {
        EmbeddingProviderKind::Gemini => vec![
            config.gemini_embedding_model.clone(),
            "embedding-001".to_string(),
        ],
        EmbeddingProviderKind::Ollama => vec![config.ollama_embedding_model.clone()],
        EmbeddingProviderKind::Openai => vec!["text-embedding-3-small".to_string()],
    }
}

pub struct GeminiEmbeddingProvider {
    http: Client,
    api_key: String,
}

impl GeminiEmbeddingProvider {
    pub fn new(config: EmbeddingConfig) -> Self {
        let _ = config;
        Self {
            http: Client::builder().timeout(REQUEST_TIMEOUT).build().expect("client builds"),
            api_key: std::env::var("GOOGLE_API_KEY").unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct GeminiEmbedRequest {
    model: String,
    content: GeminiEmbedContent,
}

#[derive(Serialize)]
struct GeminiEmbedContent {
    parts: Vec<GeminiEmbedPart>,
}

#[derive(Serialize)]
struct GeminiEmbedPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiEmbedResponse {
    embedding: GeminiEmbedValues,
}

#[derive(Deserialize)]
struct GeminiEmbedValues {
    values: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_model("text-embedding-004", text).await
    }

    async fn embed_with_model(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{model}:embedContent?key={}",
            self.api_key
        );
        let request = GeminiEmbedRequest {
            model: format!("models/{model}"),
            content: GeminiEmbedContent {
                parts: vec![GeminiEmbedPart { text: text.to_string() }],
            },
        };
        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FanViseError::EmbeddingUnavailable(format!(
                "{model}: 404 not found"
            )));
        }
        if !status.is_success() {
            return Err(FanViseError::EmbeddingUnavailable(format!(
                "{model} returned {status}"
            )));
        }
        let parsed: GeminiEmbedResponse = response.json().await?;
        Ok(parsed.embedding.values)
    }
}

pub struct OllamaEmbeddingProvider {
    http: Client,
    base_url: String,
}

impl OllamaEmbeddingProvider {
    pub fn new(config: EmbeddingConfig) -> Self {
        let _ = config;
        Self {
            http: Client::builder().timeout(REQUEST_TIMEOUT).build().expect("client builds"),
            base_url: std::env::var("OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string()),
        }
    }
}

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_model("nomic-embed-text", text).await
    }

    async fn embed_with_model(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url.trim_end_matches('/'));
        let request = OllamaEmbedRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };
        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FanViseError::EmbeddingUnavailable(format!(
                "{model}: 404 not found"
            )));
        }
        if !status.is_success() {
            return Err(FanViseError::EmbeddingUnavailable(format!(
                "{model} returned {status}"
            )));
        }
        let parsed: OllamaEmbedResponse = response.json().await?;
        Ok(parsed.embedding)
    }
}

/// Minimal OpenAI-compatible embedding client, enrichment from the pack
/// (spec §6 lists `openai` as a recognized `EMBEDDING_PROVIDER` value).
pub struct OpenAiEmbeddingProvider {
    http: Client,
    api_key: String,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: EmbeddingConfig) -> Self {
        let _ = config;
        Self {
            http: Client::builder().timeout(REQUEST_TIMEOUT).build().expect("client builds"),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: String,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedDatum>,
}

#[derive(Deserialize)]
struct OpenAiEmbedDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_model("text-embedding-3-small", text).await
    }

    async fn embed_with_model(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let request = OpenAiEmbedRequest {
            model: model.to_string(),
            input: text.to_string(),
        };
        let response = self
            .http
            .post("https://api.openai.com/v1/embeddings")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FanViseError::EmbeddingUnavailable(format!(
                "{model}: 404 not found"
            )));
        }
        if !status.is_success() {
            return Err(FanViseError::EmbeddingUnavailable(format!(
                "{model} returned {status}"
            )));
        }
        let parsed: OpenAiEmbedResponse = response.json().await?;
        Ok(parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_detection_is_case_insensitive() {
        assert!(is_not_found("Model returned 404"));
        assert!(is_not_found("model Not Found"));
        assert!(!is_not_found("internal server error"));
    }

    #[test]
    fn fallback_models_include_configured_model_first() {
        let config = EmbeddingConfig {
            provider: EmbeddingProviderKind::Gemini,
            gemini_embedding_model: "custom-model".to_string(),
            ollama_embedding_model: "nomic-embed-text".to_string(),
            dimension: 768,
        };
        let models = fallback_models(&config);
        assert_eq!(models[0], "custom-model");
        assert!(models.len() > 1);
    }
}
