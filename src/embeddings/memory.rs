use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::debug;

use super::fastembed_provider::FastEmbedProvider;
use super::openai_provider::{OpenAIProvider, Routing};
use super::provider::EmbeddingProvider;
use crate::config::Config;

/// Embeddings client built from a provider name and a model id.
pub struct Memory {
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl Memory {
    /// Build the client for `provider`/`model`, taking endpoints and keys
    /// from `config`.
    pub fn new(provider: &str, model: &str, config: &Config) -> Result<Self> {
        debug!("Building embeddings client for {}:{}", provider, model);

        let embeddings: Arc<dyn EmbeddingProvider> = match provider {
            "openai" => Arc::new(OpenAIProvider::new(Routing::OpenAI, model, &config.endpoints)?),
            "custom" => Arc::new(OpenAIProvider::new(Routing::Custom, model, &config.endpoints)?),
            "ollama" => Arc::new(OpenAIProvider::new(Routing::Ollama, model, &config.endpoints)?),
            "fastembed" => Arc::new(FastEmbedProvider::new(
                model,
                config.endpoints.fastembed_cache_dir.as_deref(),
            )?),
            other => bail!("Embedding provider not found: {}", other),
        };

        Ok(Self { embeddings })
    }

    /// Wrap an already constructed provider
    pub fn from_provider(embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embeddings }
    }

    pub fn get_embeddings(&self) -> Arc<dyn EmbeddingProvider> {
        Arc::clone(&self.embeddings)
    }
}
