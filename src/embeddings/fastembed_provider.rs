use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::provider::EmbeddingProvider;

/// Local ONNX embeddings through fastembed
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    model_name: String,
}

impl FastEmbedProvider {
    /// Load `model_name`, downloading it into `cache_dir` on first use
    pub fn new(model_name: &str, cache_dir: Option<&Path>) -> Result<Self> {
        let model_type = Self::parse_model_name(model_name)?;

        info!("Loading embedding model: {}", model_name);

        let mut options = InitOptions::new(model_type).with_show_download_progress(true);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir.to_path_buf());
        }

        let model = TextEmbedding::try_new(options)
            .with_context(|| format!("Failed to initialize embedding model: {}", model_name))?;

        info!("Embedding model loaded successfully");

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.to_string(),
        })
    }

    /// Parse model name string to fastembed EmbeddingModel enum
    fn parse_model_name(name: &str) -> Result<EmbeddingModel> {
        match name {
            "nomic-embed-text-v1.5" | "nomic-embed-text" | "nomic-ai/nomic-embed-text-v1.5" => {
                Ok(EmbeddingModel::NomicEmbedTextV15)
            }
            "all-MiniLM-L6-v2" | "all-minilm-l6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
                Ok(EmbeddingModel::AllMiniLML6V2)
            }
            "bge-small-en-v1.5" | "bge-small" | "BAAI/bge-small-en-v1.5" => {
                Ok(EmbeddingModel::BGESmallENV15)
            }
            "bge-base-en-v1.5" | "bge-base" | "BAAI/bge-base-en-v1.5" => {
                Ok(EmbeddingModel::BGEBaseENV15)
            }
            "bge-large-en-v1.5" | "bge-large" | "BAAI/bge-large-en-v1.5" => {
                Ok(EmbeddingModel::BGELargeENV15)
            }
            _ => bail!("Unknown fastembed model '{}'", name),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // fastembed is synchronous
        let model = self.model.clone();
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            model
                .embed(texts, None)
                .with_context(|| "Failed to generate embeddings")
        })
        .await
        .context("FastEmbed processing task failed")?
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No embedding generated for query"))
    }

    fn provider_name(&self) -> &'static str {
        "fastembed"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
