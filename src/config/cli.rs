use crate::config::RunConfig;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "bank-etl")]
#[command(about = "Extract the largest banks table, convert market caps and load them into SQLite")]
pub struct CliArgs {
    /// Path to a TOML configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override source.url
    #[arg(long)]
    pub url: Option<String>,

    /// Read the page from a saved HTML file instead of fetching it
    #[arg(long)]
    pub source_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit diagnostics as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Validate configuration and show the planned run without executing it
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// 載入設定檔（若有）並套用命令列覆蓋
    pub fn resolve_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(url) = &self.url {
            config.source.url = url.clone();
        }
        if let Some(file) = &self.source_file {
            config.source.file = Some(file.clone());
        }

        Ok(config)
    }
}
