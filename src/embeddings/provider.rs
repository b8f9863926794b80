use anyhow::Result;
use async_trait::async_trait;

/// Core trait for embedding providers
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for multiple texts
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate embedding for a single query
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>>;

    /// Provider name for logging
    fn provider_name(&self) -> &'static str;

    /// Model identifier as sent to the backend
    fn model_name(&self) -> &str;
}
