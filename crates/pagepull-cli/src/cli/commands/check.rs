//! `pagepull check` – list resources whose file is missing or too small.

use anyhow::{bail, Context, Result};
use pagepull_core::config::PagepullConfig;
use pagepull_core::scheduler;

pub fn run_check(cfg: &PagepullConfig) -> Result<()> {
    cfg.validate().context("invalid configuration")?;
    let locator = cfg.resource_template()?;
    let missing = scheduler::find_incomplete(&locator, cfg.total_count, cfg.min_valid_bytes);
    if missing.is_empty() {
        println!(
            "All {} resources present in {}",
            cfg.total_count,
            locator.output_dir().display()
        );
        return Ok(());
    }

    println!("{:<8} {:<10} {}", "ID", "SIZE", "PATH");
    for m in &missing {
        let size = if m.check.exists {
            m.check.size_bytes.to_string()
        } else {
            "missing".to_string()
        };
        println!("{:<8} {:<10} {}", m.resource.id, size, m.resource.path.display());
    }
    bail!(
        "{} of {} resources missing or incomplete",
        missing.len(),
        cfg.total_count
    )
}
