use std::path::PathBuf;

use clap::Parser;
use shelf_core::config::{ConfigOverrides, LoadOptions, StartupMode};

#[derive(Debug, Parser)]
#[command(name = "shelf-server", about = "Serve the shelf product catalog over HTTP")]
pub struct ServerArgs {
    /// Config file to load; it must exist when given.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,
    /// `fail_fast` or `degraded`.
    #[arg(long, value_name = "MODE")]
    pub startup: Option<StartupMode>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl ServerArgs {
    pub fn into_load_options(self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config,
            overrides: ConfigOverrides {
                database_url: self.database_url,
                database_startup: self.startup,
                server_port: self.port,
                log_level: self.log_level,
            },
        }
    }
}
