use anyhow::{anyhow, bail, Context, Result};
use async_openai::{
    config::OpenAIConfig as AsyncOpenAIConfig, types::CreateEmbeddingRequestArgs, Client,
};
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, info};

use super::provider::EmbeddingProvider;
use crate::config::EndpointsConfig;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const CUSTOM_API_BASE: &str = "http://localhost:1234/v1";
const OLLAMA_BASE: &str = "http://localhost:11434";

/// Which backend an OpenAI-compatible client is talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// OpenAI itself, or whatever `OPENAI_EMBEDDINGS_BASE_URL` points at
    OpenAI,
    /// Any OpenAI-compatible server at `OPENAI_BASE_URL`
    Custom,
    /// Ollama's `/v1` compatibility layer
    Ollama,
}

impl Routing {
    fn name(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Custom => "custom",
            Self::Ollama => "ollama",
        }
    }

    /// Base URL for this routing.
    ///
    /// The `openai` routing never uses `OPENAI_BASE_URL`: that one belongs to
    /// the LLM vendor.
    pub fn api_base(self, endpoints: &EndpointsConfig) -> String {
        match self {
            Self::OpenAI => endpoints
                .openai_embeddings_base_url
                .clone()
                .unwrap_or_else(|| OPENAI_API_BASE.to_string()),
            Self::Custom => endpoints
                .openai_base_url
                .clone()
                .unwrap_or_else(|| CUSTOM_API_BASE.to_string()),
            Self::Ollama => {
                let base = endpoints.ollama_base_url.as_deref().unwrap_or(OLLAMA_BASE);
                format!("{}/v1", base.trim_end_matches('/'))
            }
        }
    }

    /// API key for this routing.
    pub fn api_key(self, endpoints: &EndpointsConfig) -> Result<String> {
        match self {
            Self::OpenAI => endpoints
                .openai_embeddings_api_key
                .clone()
                .or_else(|| endpoints.openai_api_key.clone())
                .context(
                    "No API key configured: set OPENAI_EMBEDDINGS_API_KEY or OPENAI_API_KEY",
                ),
            // Local servers generally ignore the key but the header must be present
            Self::Custom => Ok(endpoints
                .openai_api_key
                .clone()
                .unwrap_or_else(|| "custom".to_string())),
            Self::Ollama => Ok("ollama".to_string()),
        }
    }
}

/// Embedding provider for anything that speaks the OpenAI embeddings API
pub struct OpenAIProvider {
    client: Client<AsyncOpenAIConfig>,
    routing: Routing,
    model: String,
}

impl OpenAIProvider {
    pub fn new(routing: Routing, model: &str, endpoints: &EndpointsConfig) -> Result<Self> {
        let api_key = routing
            .api_key(endpoints)
            .with_context(|| format!("Failed to load {} API key", routing.name()))?;
        let api_base = routing.api_base(endpoints);

        let openai_config = AsyncOpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&api_base);

        let client = Client::with_config(openai_config);

        info!(
            "Initialized {} embeddings client at {} with model: {}",
            routing.name(),
            api_base,
            model
        );

        Ok(Self {
            client,
            routing,
            model: model.to_string(),
        })
    }

    async fn request(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(input)
            .build()
            .context("Failed to build embeddings request")?;

        let start = Instant::now();
        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .with_context(|| format!("{} embeddings request failed", self.routing.name()))?;

        debug!(
            "Embedded {} texts in {:?} ({} prompt tokens)",
            expected,
            start.elapsed(),
            response.usage.prompt_tokens
        );

        let mut data = response.data;
        if data.len() != expected {
            bail!(
                "Expected {} embeddings, backend returned {}",
                expected,
                data.len()
            );
        }
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        self.request(texts.to_vec()).await
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.request(vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No embedding returned"))
    }

    fn provider_name(&self) -> &'static str {
        self.routing.name()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
