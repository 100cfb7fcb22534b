//! Configuration Loader
//!
//! Environment-aware configuration loading. Sources are merged in order, later
//! sources winning:
//!
//! 1. `<config_dir>/feedback.toml`
//! 2. `<config_dir>/feedback.<environment>.toml`
//! 3. `FEEDBACK__SECTION__KEY` environment variables
//!
//! `DATABASE_URL` is honoured when `FEEDBACK__DATABASE__URL` is not set.

use super::error::{ConfigResult, ConfigurationError};
use super::FeedbackConfig;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const BASE_FILE: &str = "feedback.toml";
const ENV_PREFIX: &str = "FEEDBACK";

pub struct ConfigManager {
    config: FeedbackConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration with an explicit environment; useful in tests that
    /// must not mutate process-wide variables
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(|| PathBuf::from("config"));

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading configuration"
        );

        let mut config = Self::load_and_merge(&config_directory, environment)?;
        config.environment = environment.to_string();

        if env::var("FEEDBACK__DATABASE__URL").is_err() {
            if let Ok(database_url) = env::var("DATABASE_URL") {
                config.database.url = database_url;
            }
        }

        config.validate()?;

        info!(
            environment = %environment,
            backend = ?config.database.backend,
            oracle_enabled = config.oracle.enabled,
            bind_address = %config.web.bind_address,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Wrap an already-built configuration (tests, embedded use)
    pub fn from_config(config: FeedbackConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        let environment = config.environment.clone();
        Ok(Arc::new(ConfigManager {
            config,
            environment,
            config_directory: PathBuf::from("config"),
        }))
    }

    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    pub fn detect_environment() -> String {
        crate::logging::get_environment()
    }

    fn load_and_merge(directory: &Path, environment: &str) -> ConfigResult<FeedbackConfig> {
        let base_path = directory.join(BASE_FILE);
        let env_path = directory.join(format!("feedback.{environment}.toml"));

        let merged = Config::builder()
            .add_source(File::from(base_path.clone()).required(false))
            .add_source(File::from(env_path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigurationError::LoadError {
                source_path: base_path.display().to_string(),
                error: e.to_string(),
            })?;

        merged
            .try_deserialize::<FeedbackConfig>()
            .map_err(|e| ConfigurationError::ParseError {
                error: e.to_string(),
            })
    }
}
