use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "embedprobe")]
#[command(
    author,
    version,
    about = "Check that the configured embeddings provider answers, independently of the LLM provider"
)]
pub struct Cli {
    /// Config file (defaults to $EMBEDPROBE_CONFIG, then .embedprobe/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Default stderr filter for the chosen verbosity
    pub fn stderr_filter(&self) -> &'static str {
        match self.verbose {
            0 => "embedprobe=warn",
            1 => "embedprobe=info",
            _ => "embedprobe=debug",
        }
    }
}
