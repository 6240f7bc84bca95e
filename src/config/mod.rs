mod file_config;

pub use file_config::{AnalysisConfig, FileConfig};

use crate::server::config::MAX_PAGE_SIZE;
use crate::server::{RequestsLoggingLevel, ServerConfig};
use crate::soil::CropCatalog;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

const DB_FILE_NAME: &str = "soil.db";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub rng_seed: Option<u64>,
    pub default_crop_matches: usize,
    pub history_page_size: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        let server = ServerConfig::default();
        CliConfig {
            db_dir: None,
            port: server.port,
            metrics_port: server.metrics_port,
            logging_level: server.requests_logging_level,
            frontend_dir_path: None,
            rng_seed: None,
            default_crop_matches: server.default_crop_matches,
            history_page_size: server.history_page_size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    /// Seed of the generator used for gap filling. Unseeded runs draw from the OS.
    pub rng_seed: Option<u64>,
    pub default_crop_matches: usize,
    pub history_page_size: usize,
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
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port {
            bail!("port and metrics_port must differ, both are {}", port);
        }

        let logging_level = match file.logging_level {
            Some(level) => match parse_logging_level(&level) {
                Some(level) => level,
                None => bail!("Unknown logging_level in config file: {}", level),
            },
            None => cli.logging_level.clone(),
        };

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());
        let rng_seed = file.rng_seed.or(cli.rng_seed);

        let analysis = file.analysis.unwrap_or_default();
        let default_crop_matches = analysis
            .default_crop_matches
            .unwrap_or(cli.default_crop_matches);
        let catalog_size = CropCatalog::builtin().len();
        if default_crop_matches < 1 || default_crop_matches > catalog_size {
            bail!(
                "default_crop_matches must be between 1 and {}, got {}",
                catalog_size,
                default_crop_matches
            );
        }

        let history_page_size = analysis
            .history_page_size
            .unwrap_or(cli.history_page_size);
        if history_page_size < 1 || history_page_size > MAX_PAGE_SIZE {
            bail!(
                "history_page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                history_page_size
            );
        }

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            frontend_dir_path,
            rng_seed,
            default_crop_matches,
            history_page_size,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_dir.join(DB_FILE_NAME)
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            frontend_dir_path: self.frontend_dir_path.clone(),
            default_crop_matches: self.default_crop_matches,
            history_page_size: self.history_page_size,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
