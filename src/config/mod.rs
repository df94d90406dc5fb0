//! Model configuration document.
//!
//! The document is a flat JSON object read once at startup. Individual keys
//! may be overridden from the environment with the `LOCALLM_` prefix.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{fs, io};

use crate::pipeline::GenerationParams;

pub const DEFAULT_CONFIG_PATH: &str = "model_config.json";
pub const ENV_PREFIX: &str = "LOCALLM";

const TEMPLATE: &str = include_str!("model_config.template.json");

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Config file already exists at {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] config::ConfigError),
}

/// Generation settings for one model, loaded once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_name: String,
    pub max_length: usize,
    pub temperature: f64,
    pub top_p: f64,
    pub repetition_penalty: f32,
}

impl ModelConfig {
    /// Reads the document at `path`, applying `LOCALLM_*` overrides.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    pub fn load_with_env(path: &Path, env: Environment) -> ConfigResult<Self> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Json).required(true))
            .add_source(env.prefix_separator("_").try_parsing(true))
            .build()?
            .try_deserialize::<Self>()?;

        tracing::info!(
            model = %config.model_name,
            path = %path.display(),
            "Loaded model configuration"
        );
        Ok(config)
    }

    #[must_use]
    pub const fn generation_params(
        &self,
        max_new_tokens: Option<usize>,
        seed: u64,
    ) -> GenerationParams {
        GenerationParams {
            max_length: self.max_length,
            max_new_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            repetition_penalty: self.repetition_penalty,
            seed,
        }
    }

    /// Writes a template document to `path`, refusing to overwrite.
    pub fn init_template(path: &Path) -> ConfigResult<PathBuf> {
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, TEMPLATE)?;
        Ok(path.to_path_buf())
    }

    pub fn resolve_path(path: &Path) -> ConfigResult<PathBuf> {
        Ok(std::path::absolute(path)?)
    }
}
