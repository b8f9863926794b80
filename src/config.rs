use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

const CONFIG_DIR: &str = ".embedprobe";
const CONFIG_FILE: &str = "config.toml";

/// Environment variables echoed by the harness, in print order.
pub const REPORTED_VARS: [&str; 5] = [
    "OPENAI_BASE_URL",
    "OPENAI_EMBEDDINGS_BASE_URL",
    "EMBEDDING",
    "FAST_LLM",
    "SMART_LLM",
];

const CAPTURED_VARS: [&str; 5] = [
    "OPENAI_API_KEY",
    "OPENAI_EMBEDDINGS_API_KEY",
    "OLLAMA_BASE_URL",
    "FASTEMBED_CACHE_DIR",
    "EMBEDPROBE_CONFIG",
];

/// Embedding providers the client factory knows how to build.
pub const SUPPORTED_EMBEDDING_PROVIDERS: [&str; 4] = ["openai", "custom", "ollama", "fastembed"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be set as '<provider>:<model>', got '{value}'")]
    InvalidSelector { var: String, value: String },

    #[error("unsupported embedding provider '{0}' (expected one of: openai, custom, ollama, fastembed)")]
    UnsupportedEmbeddingProvider(String),
}

/// Read-only copy of the process environment, taken once at startup.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture every variable this tool cares about
    pub fn capture() -> Self {
        let vars = REPORTED_VARS
            .iter()
            .chain(CAPTURED_VARS.iter())
            .filter_map(|name| std::env::var(name).ok().map(|v| (name.to_string(), v)))
            .collect();
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `name`, with empty strings treated as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The five routing variables in report order, exactly as set.
    ///
    /// Unlike [`EnvSnapshot::get`], a set-but-empty variable is `Some("")`.
    pub fn reported(&self) -> impl Iterator<Item = (&'static str, Option<&str>)> + '_ {
        REPORTED_VARS
            .iter()
            .map(move |name| (*name, self.vars.get(*name).map(String::as_str)))
    }
}

/// A `provider:model` pair such as `openai:text-embedding-3-small`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct ModelSelector {
    pub provider: String,
    pub model: String,
}

impl ModelSelector {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }

    fn parse_var(var: &str, value: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidSelector {
            var: var.to_string(),
            value: value.to_string(),
        };

        // Model ids may carry their own colons (ollama tags), so split once.
        let (provider, model) = value.split_once(':').ok_or_else(invalid)?;
        let (provider, model) = (provider.trim(), model.trim());
        if provider.is_empty() || model.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(provider, model))
    }
}

impl FromStr for ModelSelector {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_var("selector", s)
    }
}

impl TryFrom<String> for ModelSelector {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

/// Shape of `.embedprobe/config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub embedding: Option<ModelSelector>,

    #[serde(default)]
    pub fast_llm: Option<ModelSelector>,

    #[serde(default)]
    pub smart_llm: Option<ModelSelector>,

    #[serde(default)]
    pub endpoints: FileEndpoints,

    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEndpoints {
    pub openai_base_url: Option<String>,
    pub openai_embeddings_base_url: Option<String>,
    pub ollama_base_url: Option<String>,
    pub fastembed_cache_dir: Option<PathBuf>,
}

/// Where each embeddings backend lives and how it authenticates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointsConfig {
    /// General API base, normally the LLM vendor (e.g. OpenRouter)
    pub openai_base_url: Option<String>,
    /// Base URL used only for embeddings
    pub openai_embeddings_base_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_embeddings_api_key: Option<String>,
    pub ollama_base_url: Option<String>,
    pub fastembed_cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Write logs to rolling files
    #[serde(default)]
    pub enabled: bool,

    /// Write logs to stderr
    #[serde(default = "default_true")]
    pub stderr: bool,

    /// Level for the file log
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory; relative paths resolve against the working directory
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    /// hourly, daily, minutely or never
    #[serde(default = "default_rotation")]
    pub rotation: String,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stderr: default_true(),
            level: default_log_level(),
            directory: default_log_directory(),
            rotation: default_rotation(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("logs")
}

fn default_rotation() -> String {
    "daily".to_string()
}

fn default_file_prefix() -> String {
    "embedprobe.log".to_string()
}

fn default_embedding() -> ModelSelector {
    ModelSelector::new("openai", "text-embedding-3-small")
}

fn default_fast_llm() -> ModelSelector {
    ModelSelector::new("openai", "gpt-4o-mini")
}

fn default_smart_llm() -> ModelSelector {
    ModelSelector::new("openai", "gpt-4.1")
}

/// Resolved configuration: defaults, then config file, then environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub embedding_provider: String,
    pub embedding_model: String,
    pub fast_llm: ModelSelector,
    pub smart_llm: ModelSelector,
    pub endpoints: EndpointsConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        let embedding = default_embedding();
        Self {
            embedding_provider: embedding.provider,
            embedding_model: embedding.model,
            fast_llm: default_fast_llm(),
            smart_llm: default_smart_llm(),
            endpoints: EndpointsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration for this process.
    ///
    /// `explicit_path` (the `--config` flag) takes priority over
    /// `EMBEDPROBE_CONFIG`; both must point at an existing file. Without
    /// either, `.embedprobe/config.toml` under `root` is used when present.
    pub fn load(env: &EnvSnapshot, explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let file = match explicit_path
            .map(Path::to_path_buf)
            .or_else(|| env.get("EMBEDPROBE_CONFIG").map(PathBuf::from))
        {
            Some(path) => Some(FileConfig::read(&path)?),
            None => {
                let default_path = Self::default_path(root);
                if default_path.exists() {
                    Some(FileConfig::read(&default_path)?)
                } else {
                    None
                }
            }
        };

        Self::resolve(file.unwrap_or_default(), env)
    }

    /// Merge a parsed file with the environment and validate the result.
    pub fn resolve(file: FileConfig, env: &EnvSnapshot) -> Result<Self> {
        let embedding = Self::selector(env, "EMBEDDING", file.embedding, default_embedding)?;
        if !SUPPORTED_EMBEDDING_PROVIDERS.contains(&embedding.provider.as_str()) {
            return Err(ConfigError::UnsupportedEmbeddingProvider(embedding.provider).into());
        }

        let fast_llm = Self::selector(env, "FAST_LLM", file.fast_llm, default_fast_llm)?;
        let smart_llm = Self::selector(env, "SMART_LLM", file.smart_llm, default_smart_llm)?;

        let endpoints = EndpointsConfig {
            openai_base_url: env
                .get("OPENAI_BASE_URL")
                .map(str::to_string)
                .or(file.endpoints.openai_base_url),
            openai_embeddings_base_url: env
                .get("OPENAI_EMBEDDINGS_BASE_URL")
                .map(str::to_string)
                .or(file.endpoints.openai_embeddings_base_url),
            openai_api_key: env.get("OPENAI_API_KEY").map(str::to_string),
            openai_embeddings_api_key: env.get("OPENAI_EMBEDDINGS_API_KEY").map(str::to_string),
            ollama_base_url: env
                .get("OLLAMA_BASE_URL")
                .map(str::to_string)
                .or(file.endpoints.ollama_base_url),
            fastembed_cache_dir: env
                .get("FASTEMBED_CACHE_DIR")
                .map(PathBuf::from)
                .or(file.endpoints.fastembed_cache_dir),
        };

        Ok(Self {
            embedding_provider: embedding.provider,
            embedding_model: embedding.model,
            fast_llm,
            smart_llm,
            endpoints,
            logging: file.logging.unwrap_or_default(),
        })
    }

    fn selector(
        env: &EnvSnapshot,
        var: &str,
        from_file: Option<ModelSelector>,
        default: fn() -> ModelSelector,
    ) -> Result<ModelSelector, ConfigError> {
        match env.get(var) {
            Some(value) => ModelSelector::parse_var(var, value),
            None => Ok(from_file.unwrap_or_else(default)),
        }
    }

    /// Path of the per-directory config file
    pub fn default_path(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE)
    }
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse config from {:?}", path))
    }
}
