use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "hn-probe")]
#[command(about = "Fetch the current top stories and check them against the story contract")]
pub struct ProbeArgs {
    #[arg(long, help = "Config document (defaults to $HN_CONFIG or config/config.toml)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Environment block to use (defaults to $ENV or STAGE)")]
    pub env: Option<String>,

    #[arg(long, default_value = "10")]
    pub limit: i64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl ProbeArgs {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(super::config_path_from_env)
    }

    pub fn environment(&self) -> String {
        self.env
            .as_deref()
            .map(|e| e.trim().to_uppercase())
            .unwrap_or_else(super::environment_name_from_env)
    }
}
