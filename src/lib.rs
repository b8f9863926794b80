pub mod cli;
pub mod config;
pub mod embeddings;
pub mod harness;
pub mod logging;

pub use config::{Config, EnvSnapshot};
pub use harness::{Harness, Outcome};
