//! End-to-end check of the embeddings routing.
//!
//! Prints the routing environment, builds the configured embeddings client,
//! embeds one fixed sentence and reports what came back. Failures after the
//! configuration is loaded are reported, never propagated.

use anyhow::Result;
use std::io::Write;
use tracing::{debug, info, warn};

use crate::config::{Config, EnvSnapshot};
use crate::embeddings::Memory;

pub const TEST_TEXT: &str = "This is a test sentence to verify embeddings are working correctly.";

pub const START_BANNER: &str = "=== Testing OpenRouter + OpenAI Configuration ===";
pub const END_BANNER: &str = "=== Test Complete ===";

/// Number of leading vector components echoed on success
const PREVIEW_LEN: usize = 3;

/// What a run observed.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success {
        provider: String,
        model: String,
        dimension: usize,
        preview: Vec<f32>,
    },
    Failed {
        message: String,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Opening banner. Printed before the configuration is loaded, so it shows
/// even when loading fails.
pub fn print_banner<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", START_BANNER)?;
    writeln!(out)?;
    out.flush()
}

pub struct Harness<'a> {
    config: &'a Config,
    env: &'a EnvSnapshot,
}

impl<'a> Harness<'a> {
    pub fn new(config: &'a Config, env: &'a EnvSnapshot) -> Self {
        Self { config, env }
    }

    /// Run against the client described by the configuration.
    ///
    /// The opening banner is not part of the run; see [`print_banner`].
    pub async fn run<O: Write, E: Write>(&self, out: &mut O, err: &mut E) -> Result<Outcome> {
        self.run_with(out, err, |config| {
            Memory::new(&config.embedding_provider, &config.embedding_model, config)
        })
        .await
    }

    /// Run with a caller-supplied client factory.
    ///
    /// Only writes to `out`/`err` can make this return `Err`; anything the
    /// factory or the embeddings call raises becomes `Outcome::Failed`.
    pub async fn run_with<O, E, F>(&self, out: &mut O, err: &mut E, build: F) -> Result<Outcome>
    where
        O: Write,
        E: Write,
        F: FnOnce(&Config) -> Result<Memory>,
    {
        writeln!(out, "Current configuration:")?;
        for (name, value) in self.env.reported() {
            writeln!(out, "{}: {}", name, value.unwrap_or("None"))?;
        }

        let outcome = match self.embed_test_text(build).await {
            Ok(vector) => {
                if vector.is_empty() {
                    warn!("Embeddings backend returned an empty vector");
                }
                let preview: Vec<f32> = vector.iter().take(PREVIEW_LEN).copied().collect();

                writeln!(out)?;
                writeln!(
                    out,
                    "✅ SUCCESS: Generated embeddings using provider: {}",
                    self.config.embedding_provider
                )?;
                writeln!(out, "Model: {}", self.config.embedding_model)?;
                writeln!(out, "Embedding vector length: {}", vector.len())?;
                writeln!(out, "First few values: {:?}", preview)?;

                info!(dimension = vector.len(), "Embedding smoke test passed");

                Outcome::Success {
                    provider: self.config.embedding_provider.clone(),
                    model: self.config.embedding_model.clone(),
                    dimension: vector.len(),
                    preview,
                }
            }
            Err(e) => {
                debug!("Embedding smoke test failed: {:#}", e);

                writeln!(out)?;
                writeln!(out, "❌ ERROR testing embeddings: {:#}", e)?;
                out.flush()?;
                // Full chain, plus a backtrace when RUST_BACKTRACE is set
                writeln!(err, "Error: {:?}", e)?;

                Outcome::Failed {
                    message: format!("{:#}", e),
                }
            }
        };

        writeln!(out)?;
        writeln!(out, "{}", END_BANNER)?;
        out.flush()?;

        Ok(outcome)
    }

    async fn embed_test_text<F>(&self, build: F) -> Result<Vec<f32>>
    where
        F: FnOnce(&Config) -> Result<Memory>,
    {
        let memory = build(self.config)?;
        let embeddings = memory.get_embeddings();
        embeddings.embed_query(TEST_TEXT).await
    }
}
