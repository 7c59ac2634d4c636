//! `pagepull fetch` – download every resource not already valid on disk.

use anyhow::{Context, Result};
use pagepull_core::config::PagepullConfig;
use pagepull_core::control::RunControl;
use pagepull_core::downloader::{CurlFetcher, CurlOptions};
use pagepull_core::scheduler::{self, BatchOptions, BatchProgress, RunReport};
use std::path::Path;
use std::sync::Arc;

pub async fn run_fetch(cfg: &PagepullConfig, report_path: Option<&Path>) -> Result<()> {
    cfg.validate().context("invalid configuration")?;
    let locator = cfg.resource_template()?;
    let opts = BatchOptions::from_config(cfg);
    let fetcher = Arc::new(CurlFetcher::new(CurlOptions::from_config(cfg)));

    let control = RunControl::new();
    let signal_handle = {
        let control = control.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\ninterrupted, stopping in-flight downloads...");
                control.request_abort();
            }
        })
    };

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<BatchProgress>(16);
    let progress_handle = tokio::spawn(async move {
        while let Some(p) = progress_rx.recv().await {
            println!("{}", progress_line(&p));
        }
    });

    println!(
        "Fetching {} resources into {} ({} at a time)",
        cfg.total_count,
        locator.output_dir().display(),
        opts.concurrency_limit
    );
    let result =
        scheduler::run_batch(&opts, &locator, fetcher, &control, Some(&progress_tx)).await;
    drop(progress_tx);
    let _ = progress_handle.await;
    signal_handle.abort();

    let report = match &result {
        Ok(report) => Some(report),
        Err(err) => err.report(),
    };
    if let (Some(path), Some(report)) = (report_path, report) {
        write_report(path, report)?;
    }

    let report = result?;
    println!(
        "{} of {} complete ({} downloaded, {} already present, {:.1} MiB in {:.1}s)",
        report.completed(),
        report.total,
        report.downloaded,
        report.skipped,
        report.bytes as f64 / 1_048_576.0,
        report.elapsed_secs
    );
    Ok(())
}

fn progress_line(p: &BatchProgress) -> String {
    let eta = p
        .eta_secs()
        .map(|s| format!("{:.0}s", s))
        .unwrap_or_else(|| "?".to_string());
    format!(
        "  {}/{} ({:.1}%)  {:.1}/s  ETA {}",
        p.completed,
        p.total,
        p.fraction() * 100.0,
        p.per_sec(),
        eta
    )
}

fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("write report: {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote run report");
    Ok(())
}
