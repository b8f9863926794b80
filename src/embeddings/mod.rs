mod fastembed_provider;
mod memory;
mod openai_provider;
mod provider;

// Re-export public interfaces
pub use fastembed_provider::FastEmbedProvider;
pub use memory::Memory;
pub use openai_provider::{OpenAIProvider, Routing};
pub use provider::EmbeddingProvider;
