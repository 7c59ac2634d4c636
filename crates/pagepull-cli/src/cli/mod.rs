//! CLI for pagepull.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use pagepull_core::config::{self, FailureMode, PagepullConfig};
use std::path::PathBuf;

use commands::{run_check, run_completions, run_config, run_fetch};

/// Top-level CLI for pagepull.
#[derive(Debug, Parser)]
#[command(name = "pagepull")]
#[command(about = "pagepull: fetch a numbered set of remote files with bounded concurrency", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/pagepull/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Per-run overrides for values from the config file.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Number of resources (ids 1..=N).
    #[arg(long, value_name = "N")]
    pub count: Option<u32>,
    /// Maximum concurrent fetches.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
    /// Output directory.
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,
    /// Remote URL template, e.g. https://host/pages/{id}.png
    #[arg(long, value_name = "TEMPLATE")]
    pub url_template: Option<String>,
    /// Local filename template, e.g. page-{id:03}.png
    #[arg(long, value_name = "TEMPLATE")]
    pub file_template: Option<String>,
    /// Files of this size or smaller count as missing.
    #[arg(long, value_name = "BYTES")]
    pub min_bytes: Option<u64>,
    /// Print progress after every N completions.
    #[arg(long, value_name = "N")]
    pub progress_every: Option<u64>,
    /// Attempt every resource even after a failure.
    #[arg(long)]
    pub keep_going: bool,
    /// Retry transient failures up to N times per resource (0 disables).
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,
}

impl Overrides {
    pub fn apply(&self, cfg: &mut PagepullConfig) {
        if let Some(n) = self.count {
            cfg.total_count = n;
        }
        if let Some(n) = self.concurrency {
            cfg.concurrency_limit = n;
        }
        if let Some(dir) = &self.output {
            cfg.output_dir = dir.clone();
        }
        if let Some(t) = &self.url_template {
            cfg.url_template = t.clone();
        }
        if let Some(t) = &self.file_template {
            cfg.file_template = t.clone();
        }
        if let Some(n) = self.min_bytes {
            cfg.min_valid_bytes = n;
        }
        if let Some(n) = self.progress_every {
            cfg.progress_every = n;
        }
        if self.keep_going {
            cfg.failure_mode = FailureMode::Continue;
        }
        match self.retries {
            Some(0) => cfg.retry = None,
            Some(n) => {
                let mut retry = cfg.retry.clone().unwrap_or_default();
                retry.max_attempts = n.saturating_add(1);
                cfg.retry = Some(retry);
            }
            None => {}
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every resource that is not already valid on disk.
    Fetch {
        #[command(flatten)]
        overrides: Overrides,
        /// Write the run report as JSON to this path.
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },

    /// List resources whose file is missing or too small (no network). Exits 1 if any.
    Check {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Show the config file path and the effective configuration.
    Config {
        /// Print the built-in defaults instead of the loaded file.
        #[arg(long)]
        defaults: bool,
    },

    /// Generate shell completions on stdout.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = &cli.command {
            run_completions(*shell);
            return Ok(());
        }

        let (config_path, mut cfg) = match &cli.config {
            Some(path) => (path.clone(), config::load_from_path(path)?),
            None => (config::config_path()?, config::load_or_init()?),
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch { overrides, report } => {
                overrides.apply(&mut cfg);
                run_fetch(&cfg, report.as_deref()).await?;
            }
            CliCommand::Check { overrides } => {
                overrides.apply(&mut cfg);
                run_check(&cfg)?;
            }
            CliCommand::Config { defaults } => {
                if defaults {
                    cfg = PagepullConfig::default();
                }
                run_config(&config_path, &cfg)?;
            }
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
