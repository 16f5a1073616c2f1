mod file_config;

pub use file_config::FileConfig;

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be overridden by the TOML config file.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub page_size: u32,
    pub utc_offset_minutes: Option<i32>,
    pub token_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub page_size: u32,
    pub utc_offset_minutes: i32,
    pub token_secret: Option<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let page_size = file.page_size.unwrap_or(cli.page_size);
        if page_size == 0 {
            bail!("page_size must be at least 1");
        }

        let utc_offset_minutes = file
            .utc_offset_minutes
            .or(cli.utc_offset_minutes)
            .unwrap_or_else(local_utc_offset_minutes);
        if utc_offset_minutes.abs() >= 24 * 60 {
            bail!(
                "utc_offset_minutes must be within a day of UTC, got {}",
                utc_offset_minutes
            );
        }

        let token_secret = file.token_secret.or_else(|| cli.token_secret.clone());
        if let Some(secret) = &token_secret {
            if secret.len() < 16 {
                bail!("token_secret must be at least 16 characters");
            }
        }

        Ok(AppConfig {
            db_dir,
            port,
            logging_level,
            page_size,
            utc_offset_minutes,
            token_secret,
        })
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

fn local_utc_offset_minutes() -> i32 {
    chrono::Local::now().offset().local_minus_utc() / 60
}
