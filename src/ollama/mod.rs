// Ollama module
// HTTP client for the Ollama embedding and generation endpoints


use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::KgError;
use crate::config::OllamaConfig;
use crate::embeddings::EmbeddingModel;
use crate::extraction::{PromptTemplate, TripletExtractor};

const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// HTTP client for a local Ollama server, serving both embeddings and
/// triplet extraction
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    embedding_model: String,
    llm_model: String,
    batch_size: u32,
    agent: ureq::Agent,
    retry_attempts: u32,
    backoff_base_ms: u64,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: EmbedInput<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbedInput<'a> {
    Single(&'a str),
    Batch(&'a [String]),
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: Option<u64>,
    pub digest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let base_url = config
            .ollama_url()
            .context("Failed to generate Ollama URL from config")?;

        Ok(Self {
            base_url,
            embedding_model: config.embedding_model.clone(),
            llm_model: config.llm_model.clone(),
            batch_size: config.batch_size,
            agent: build_agent(Duration::from_secs(config.timeout_secs)),
            retry_attempts: config.retry_attempts,
            backoff_base_ms: 1000,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Delay before the first retry; doubles on each further attempt
    #[inline]
    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base_ms = base.as_millis() as u64;
        self
    }

    /// Test connection to Ollama server and verify both models are available
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        debug!("Performing health check for Ollama at {}", self.base_url);

        let models = self.list_models().context("Server ping failed")?;

        for model in [&self.embedding_model, &self.llm_model] {
            if !models.iter().any(|m| &m.name == model) {
                let available_models: Vec<&str> =
                    models.iter().map(|m| m.name.as_str()).collect();
                warn!(
                    "Model {} not found. Available models: {:?}",
                    model, available_models
                );
                return Err(anyhow::anyhow!(
                    "Model '{}' is not available. Available models: {:?}",
                    model,
                    available_models
                ));
            }
        }

        info!(
            "Health check passed for Ollama server at {} with models {} and {}",
            self.base_url, self.embedding_model, self.llm_model
        );
        Ok(())
    }

    /// List all available models
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self
            .base_url
            .join("/api/tags")
            .context("Failed to build models URL")?;

        debug!("Fetching available models from {}", url);

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .get(url.as_str())
                    .call()
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Failed to fetch models")?;

        let models_response: ModelsResponse =
            serde_json::from_str(&response_text).context("Failed to parse models response")?;

        debug!("Found {} models", models_response.models.len());
        Ok(models_response.models)
    }

    /// Generate an embedding for a single text input
    #[inline]
    pub fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let mut embeddings = self.post_embed(EmbedInput::Single(text))?;
        let embedding = embeddings
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedding response contained no vectors"))?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    /// Generate embeddings for multiple text inputs using batch processing
    #[inline]
    pub fn generate_embeddings_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut results = Vec::with_capacity(texts.len());

        // Process in batches to avoid overwhelming the server
        for batch in texts.chunks(self.batch_size.max(1) as usize) {
            let embeddings = self
                .post_embed(EmbedInput::Batch(batch))
                .with_context(|| format!("Failed to process batch of {} texts", batch.len()))?;

            if embeddings.len() != batch.len() {
                return Err(anyhow::anyhow!(
                    "Mismatch between request and response counts: {} vs {}",
                    batch.len(),
                    embeddings.len()
                ));
            }

            results.extend(embeddings);
        }

        debug!("Generated {} embeddings total", results.len());
        Ok(results)
    }

    /// Run a non-streaming completion with the extraction model
    #[inline]
    pub fn generate_completion(&self, prompt: &str) -> Result<String> {
        debug!(
            "Generating completion with {} (prompt length: {})",
            self.llm_model,
            prompt.len()
        );

        let request = GenerateRequest {
            model: &self.llm_model,
            prompt,
            stream: false,
        };

        let url = self
            .base_url
            .join("/api/generate")
            .context("Failed to build generate URL")?;

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize generate request")?;

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .post(url.as_str())
                    .header("Content-Type", "application/json")
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Failed to generate completion")?;

        let generate_response: GenerateResponse = serde_json::from_str(&response_text)
            .context("Failed to parse generate response")?;

        debug!(
            "Completion returned {} characters",
            generate_response.response.len()
        );
        Ok(generate_response.response)
    }

    fn post_embed(&self, input: EmbedInput<'_>) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.embedding_model,
            input,
        };

        let url = self
            .base_url
            .join("/api/embed")
            .context("Failed to build embedding URL")?;

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embedding request")?;

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .post(url.as_str())
                    .header("Content-Type", "application/json")
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Failed to generate embedding")?;

        let embed_response: EmbedResponse =
            serde_json::from_str(&response_text).context("Failed to parse embedding response")?;

        Ok(embed_response.embeddings)
    }

    fn make_request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true // Retry server errors
                            } else {
                                warn!("Client error (status {}), not retrying", status);
                                return Err(anyhow::anyhow!("Client error: HTTP {}", status));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true // Retry transport errors
                        }
                        _ => {
                            warn!("Non-retryable error: {}", error);
                            false // Don't retry other errors
                        }
                    };

                    if !should_retry {
                        return Err(anyhow::anyhow!("Non-retryable error: {}", error));
                    }

                    last_error = Some(anyhow::anyhow!("Request error: {}", error));

                    // Wait before retry (exponential backoff)
                    if attempt < self.retry_attempts {
                        let delay_ms =
                            EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * self.backoff_base_ms;
                        let delay = Duration::from_millis(delay_ms);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        error!("All retry attempts failed for request to {}", self.base_url);

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Request failed after retries")))
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

#[async_trait]
impl EmbeddingModel for OllamaClient {
    async fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
        let client = self.clone();
        let text = text.to_string();

        tokio::task::spawn_blocking(move || client.generate_embedding(&text))
            .await
            .map_err(|e| KgError::Embedding(format!("Embedding task failed: {}", e)))?
            .map_err(|e| KgError::Embedding(format!("{:#}", e)))
    }

    async fn embed_batch(&self, texts: &[String]) -> crate::Result<Vec<Vec<f32>>> {
        let client = self.clone();
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || client.generate_embeddings_batch(&texts))
            .await
            .map_err(|e| KgError::Embedding(format!("Embedding task failed: {}", e)))?
            .map_err(|e| KgError::Embedding(format!("{:#}", e)))
    }
}

#[async_trait]
impl TripletExtractor for OllamaClient {
    async fn extract(&self, prompt: &PromptTemplate, chunk_text: &str) -> crate::Result<String> {
        let client = self.clone();
        let rendered = prompt.render(chunk_text);

        tokio::task::spawn_blocking(move || client.generate_completion(&rendered))
            .await
            .map_err(|e| KgError::Extraction(format!("Extraction task failed: {}", e)))?
            .map_err(|e| KgError::Extraction(format!("{:#}", e)))
    }
}
