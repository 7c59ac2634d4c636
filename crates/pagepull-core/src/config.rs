use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::url_model::{ResourceTemplate, TemplateError};

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per resource (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 10,
        }
    }
}

/// What the batch does after a resource fails for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureMode {
    /// Stop admitting new resources; let in-flight ones settle; fail the run.
    #[default]
    FailFast,
    /// Attempt every resource, then fail with the list of ids that failed.
    Continue,
}

/// Global configuration loaded from `~/.config/pagepull/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagepullConfig {
    /// Number of resources; ids run from 1 to this value inclusive.
    pub total_count: u32,
    /// Maximum number of unsettled fetch operations at any instant.
    pub concurrency_limit: usize,
    /// Directory the files are written to (created if missing).
    pub output_dir: PathBuf,
    /// Remote URL per id, e.g. `https://cdn.example.com/pages/{id}.png`.
    pub url_template: String,
    /// Local filename per id, e.g. `{id}.png` or `page-{id:03}.png`.
    pub file_template: String,
    /// A local file counts as already downloaded only if strictly larger than this.
    pub min_valid_bytes: u64,
    /// Emit a progress line after every this many completed resources.
    pub progress_every: u64,
    /// Connect timeout per transfer, in seconds.
    pub connect_timeout_secs: u64,
    /// Hard timeout per transfer, in seconds.
    pub timeout_secs: u64,
    #[serde(default)]
    pub failure_mode: FailureMode,
    /// Optional retry policy; if missing, each resource is attempted once.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for PagepullConfig {
    fn default() -> Self {
        Self {
            total_count: 604,
            concurrency_limit: 15,
            output_dir: PathBuf::from("pages"),
            url_template: "https://cdn.example.com/pages/{id}.png".to_string(),
            file_template: "{id}.png".to_string(),
            min_valid_bytes: 1000,
            progress_every: 50,
            connect_timeout_secs: 30,
            timeout_secs: 300,
            failure_mode: FailureMode::FailFast,
            retry: None,
        }
    }
}

/// Invalid configuration values, reported before any network or disk I/O.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("concurrency_limit must be at least 1")]
    ZeroConcurrency,
    #[error("progress_every must be at least 1")]
    ZeroProgressInterval,
    #[error("retry.max_attempts must be at least 1")]
    ZeroAttempts,
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl PagepullConfig {
    /// Checks value ranges and that both templates parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.progress_every == 0 {
            return Err(ConfigError::ZeroProgressInterval);
        }
        if matches!(&self.retry, Some(r) if r.max_attempts == 0) {
            return Err(ConfigError::ZeroAttempts);
        }
        self.resource_template()?;
        Ok(())
    }

    /// Builds the id → (url, path) mapping from the two templates and the output dir.
    pub fn resource_template(&self) -> Result<ResourceTemplate, TemplateError> {
        ResourceTemplate::new(&self.url_template, &self.file_template, &self.output_dir)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialize config")
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pagepull")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PagepullConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PagepullConfig::default();
        let toml = default_cfg.to_toml_string()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path (e.g. `--config`). The file must exist.
pub fn load_from_path(path: &Path) -> Result<PagepullConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: PagepullConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
