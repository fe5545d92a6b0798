use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{Embedder, EntityRecognizer, EntitySet};

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Format to return a response in
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Random seed for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    pub done: bool,
}

/// Delay before retry number `attempt` (1-based): base, 2x base, 4x base...
///
/// Saturates instead of overflowing for large bases or attempt counts.
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor))
}

/// Batch embedding request for the `/api/embed` endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// Embedding model
    model: String,
    /// Texts to embed
    input: Vec<String>,
    /// Truncate inputs that exceed the context length instead of failing
    #[serde(skip_serializing_if = "Option::is_none")]
    truncate: Option<bool>,
}

impl EmbedRequest {
    /// Create a new embedding request
    pub fn new(model: impl Into<String>, input: Vec<String>) -> Self {
        Self {
            model: model.into(),
            input,
            truncate: Some(true),
        }
    }
}

/// Batch embedding response
#[derive(Debug, Serialize, Deserialize)]
pub struct EmbedResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// One vector per input
    pub embeddings: Vec<Vec<f32>>,
}

/// Builder methods for GenerationRequest
impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: None,
            format: None,
            stream: Some(false),
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Set a fixed seed so the same prompt gives the same answer
    pub fn seed(mut self, seed: u64) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).seed = Some(seed);
        self
    }

    /// Set the format
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

impl Ollama {
    /// Create a new Ollama client with default timeouts and retries
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::new_with_config(endpoint, 60, 3, 1000)
    }

    /// Create a new Ollama client with configuration
    ///
    /// Uses connection pooling for better performance with concurrent requests.
    /// Note: Ollama typically uses HTTP/1.1, so we don't force HTTP/2.
    pub fn new_with_config(
        endpoint: impl Into<String>,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Self {
        let endpoint = endpoint.into();
        let base_url = endpoint.trim_end_matches('/').to_string();

        Self {
            base_url,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .pool_max_idle_per_host(20)
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            max_retries,
            backoff_base_ms,
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body, retrying network and server errors with exponential backoff
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            match self.client.post(&url).json(body).send().await {
                Ok(response) => {
                    let status = response.status();
                    let response_text = response.text().await
                        .map_err(|e| ProviderError::RequestFailed(format!("Failed to read response body: {}", e)))?;

                    if status.is_success() {
                        return serde_json::from_str::<R>(&response_text).map_err(|e| {
                            error!("Failed to parse Ollama API response: {}. Raw response (first 500 chars): {}",
                                e, response_text.chars().take(500).collect::<String>());
                            ProviderError::ParseError(e.to_string())
                        });
                    }

                    let api_error = ProviderError::ApiError {
                        status_code: status.as_u16(),
                        message: response_text,
                    };

                    if !status.is_server_error() {
                        // Client error - don't retry
                        error!("Ollama API error: {}", api_error);
                        return Err(api_error);
                    }

                    error!("Ollama API error: {} - attempt {}/{}", api_error, attempt + 1, self.max_retries + 1);
                    last_error = Some(api_error);
                }
                Err(e) => {
                    // Network error - can retry
                    error!("Ollama API network error: {} - attempt {}/{}", e, attempt + 1, self.max_retries + 1);
                    last_error = Some(ProviderError::ConnectionError(e.to_string()));
                }
            }

            attempt += 1;

            // If we have more retries left, wait with exponential backoff
            if attempt <= self.max_retries {
                tokio::time::sleep(backoff_delay(self.backoff_base_ms, attempt)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!("Ollama API request failed after {} attempts", self.max_retries + 1))
        }))
    }

    /// Generate text from the Ollama API with retry logic
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        self.post_json("/api/generate", request).await
    }

    /// Embed a batch of texts
    pub async fn embed(&self, request: &EmbedRequest) -> Result<EmbedResponse, ProviderError> {
        self.post_json("/api/embed", request).await
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response: serde_json::Value = self.client.get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to connect to Ollama: {}", e)))?
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Ollama version response: {}", e)))?;

        response["version"]
            .as_str()
            .map(|v| v.to_string())
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }
}

/// Sentence embeddings served by Ollama
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Arc<Ollama>,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: Arc<Ollama>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Embedding {} text(s) with {}", texts.len(), self.model);
        let request = EmbedRequest::new(self.model.clone(), texts.to_vec());
        let response = self.client.embed(&request).await?;

        if response.embeddings.iter().any(|v| v.is_empty()) {
            return Err(ProviderError::UnsupportedInput(format!(
                "Model {} returned an empty embedding",
                self.model
            )));
        }

        Ok(response.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Entity extraction by prompting an LLM served by Ollama
#[derive(Debug, Clone)]
pub struct OllamaEntityRecognizer {
    client: Arc<Ollama>,
    model: String,
    language_name: String,
}

impl OllamaEntityRecognizer {
    pub fn new(client: Arc<Ollama>, model: impl Into<String>, language_name: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            language_name: language_name.into(),
        }
    }

    /// Build the extraction prompt for one caption
    pub fn build_prompt(&self, text: &str) -> String {
        format!(
            r#"Extract the named entities from this {language} subtitle line: people, places, organizations, numbers, dates.
Copy each entity exactly as it is written in the line, without translating or normalizing it.

Line: "{text}"

Respond with JSON: {{"entities": ["..."]}}"#,
            language = self.language_name,
            text = text
        )
    }
}

#[async_trait]
impl EntityRecognizer for OllamaEntityRecognizer {
    async fn recognize(&self, text: &str) -> Result<EntitySet, ProviderError> {
        if text.trim().is_empty() {
            return Ok(EntitySet::new());
        }

        let request = GenerationRequest::new(self.model.clone(), self.build_prompt(text))
            .format("json")
            .temperature(0.0)
            .seed(0);
        let response = self.client.generate(&request).await?;

        let entities = parse_entity_response(&response.response)?;
        // The model may paraphrase; keep only spans that really occur in the line
        let (kept, dropped): (EntitySet, EntitySet) =
            entities.into_iter().partition(|entity| text.contains(entity.as_str()));
        if !dropped.is_empty() {
            warn!("Dropped {} entity span(s) not found verbatim in '{}'", dropped.len(), text);
        }

        Ok(kept)
    }
}

/// Parse an LLM entity answer: `{"entities": [...]}`, a bare array, or either inside a code block
pub fn parse_entity_response(response: &str) -> Result<EntitySet, ProviderError> {
    let json_str = extract_json(response)
        .ok_or_else(|| ProviderError::ParseError(format!("No JSON found in entity response: {}", response)))?;

    let value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| ProviderError::ParseError(format!("Invalid entity JSON: {}", e)))?;

    let items = match &value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => match map.get("entities") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Err(ProviderError::ParseError("Entity response has no 'entities' array".to_string())),
        },
        _ => return Err(ProviderError::ParseError("Entity response is not an array or object".to_string())),
    };

    Ok(items
        .iter()
        .filter_map(|item| match item {
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect())
}

fn extract_json(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    // Look for JSON in code block
    if let Some(start) = trimmed.find("```json") {
        if let Some(end) = trimmed[start + 7..].find("```") {
            return Some(trimmed[start + 7..start + 7 + end].trim());
        }
    }

    let first = trimmed.find(['{', '['])?;
    let closing = if trimmed[first..].starts_with('{') { '}' } else { ']' };
    let last = trimmed.rfind(closing)?;
    (last > first).then(|| &trimmed[first..=last])
}
