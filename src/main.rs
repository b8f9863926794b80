use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use embedprobe::cli::Cli;
use embedprobe::harness::print_banner;
use embedprobe::logging::init_logging;
use embedprobe::{Config, EnvSnapshot, Harness};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let env = EnvSnapshot::capture();

    print_banner(&mut std::io::stdout())?;

    // Configuration errors are fatal; everything after this point is reported instead
    let config = Config::load(&env, cli.config.as_deref(), &root)?;

    // The guard MUST be held until program exit to ensure logs are flushed
    let _logging_guard = init_logging(&config.logging, &root, cli.stderr_filter())?;

    tracing::debug!(
        embedding_provider = %config.embedding_provider,
        embedding_model = %config.embedding_model,
        fast_llm = %config.fast_llm,
        smart_llm = %config.smart_llm,
        "Configuration loaded"
    );

    let outcome = Harness::new(&config, &env)
        .run(&mut std::io::stdout(), &mut std::io::stderr())
        .await?;

    tracing::debug!(success = outcome.is_success(), "Run finished");

    Ok(())
}
