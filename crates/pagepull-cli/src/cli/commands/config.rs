//! `pagepull config` – show where the config lives and what it resolves to.

use anyhow::Result;
use pagepull_core::config::PagepullConfig;
use std::path::Path;

pub fn run_config(path: &Path, cfg: &PagepullConfig) -> Result<()> {
    println!("# {}", path.display());
    print!("{}", cfg.to_toml_string()?);
    Ok(())
}
