pub mod toml_config;

use crate::adapters::ankiconnect::DEFAULT_ENDPOINT;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Args;
use std::path::PathBuf;

pub use toml_config::TomlConfig;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct CliConfig {
    /// AnkiConnect listen address
    #[arg(long, global = true, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Directory holding the preset slot file (defaults to the user data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Request timeout for AnkiConnect calls, in seconds
    #[arg(long, global = true, default_value = "10")]
    pub timeout_seconds: u64,

    /// Optional TOML configuration file; its values take precedence
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// 套用設定檔的值（檔案值優先於 CLI 預設值）
    pub fn apply_file(&mut self, file: &TomlConfig) {
        if let Some(connection) = &file.connection {
            if let Some(endpoint) = &connection.endpoint {
                self.endpoint = endpoint.clone();
            }
            if let Some(timeout) = connection.timeout_seconds {
                self.timeout_seconds = timeout;
            }
        }
        if let Some(storage) = &file.storage {
            if let Some(data_dir) = &storage.data_dir {
                self.data_dir = Some(PathBuf::from(data_dir));
            }
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("endpoint", &self.endpoint)?;
        validation::validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        Ok(())
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("anki-courier")
}
