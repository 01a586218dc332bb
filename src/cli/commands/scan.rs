//! Page scan commands.

use std::path::PathBuf;
use std::sync::Arc;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use super::feeds::refresh_theme;
use crate::cli::helpers::{http_client, open_db, truncate};
use crate::config::Settings;
use crate::services::{BatchService, HarvestEvent, HarvestService};
use crate::utils::format_size;

fn harvest_service(
    settings: &Settings,
    ctx: &crate::repository::DieselDbContext,
) -> anyhow::Result<HarvestService> {
    Ok(HarvestService::new(http_client(settings)?, ctx.harvests())
        .with_min_pdf_size(settings.min_pdf_size))
}

/// Scan one page and download its PDFs.
pub async fn cmd_scan(
    settings: &Settings,
    url: &str,
    title: &str,
    dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let service = harvest_service(settings, &ctx)?;
    let download_dir = dir.unwrap_or_else(|| settings.downloads_dir.clone());

    tracing::info!("Strategies: {}", service.registry().names().join(", "));
    println!("{} Scanning {}", style("→").cyan(), url);
    let report = service.scan(url, title, &download_dir).await?;

    for failure in &report.strategy_failures {
        println!(
            "  {} {} strategy failed: {}",
            style("!").yellow(),
            failure.strategy,
            failure.error
        );
    }
    for saved in &report.saved {
        println!(
            "  {} {} ({})",
            style("✓").green(),
            saved.filename,
            format_size(saved.bytes)
        );
    }
    for error in &report.errors {
        println!("  {} {}", style("✗").red(), error);
    }

    println!(
        "{} {} candidate(s), {} new PDF(s), {} already known, {} failed",
        style("✓").green(),
        report.candidates,
        report.saved.len(),
        report.skipped,
        report.errors.len()
    );
    if !report.saved.is_empty() {
        println!("  {} Saved to {}", style("→").dim(), download_dir.display());
    }

    Ok(())
}

/// Record a page's candidates as detected, without downloading.
pub async fn cmd_detect(settings: &Settings, url: &str, title: &str) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let service = harvest_service(settings, &ctx)?;

    println!("{} Detecting PDFs on {}", style("→").cyan(), url);
    let report = service.detect(url, title).await?;

    for candidate in &report.candidates {
        println!("  {} {}", style("•").cyan(), candidate);
    }
    for error in &report.errors {
        println!("  {} {}", style("✗").red(), error);
    }
    println!(
        "{} {} candidate(s), {} newly recorded",
        style("✓").green(),
        report.candidates.len(),
        report.recorded
    );

    Ok(())
}

/// Refresh a theme's feed, then scan every active article page.
pub async fn cmd_scan_theme(
    settings: &Settings,
    theme: &str,
    limit: Option<i64>,
) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    refresh_theme(settings, &ctx, theme).await?;

    let articles = ctx.articles().list_active(theme, limit).await?;
    if articles.is_empty() {
        println!("{} No articles to scan for {}", style("!").yellow(), theme);
        return Ok(());
    }

    println!(
        "{} Scanning {} page(s) with {} worker(s)",
        style("→").cyan(),
        articles.len(),
        settings.workers
    );

    let service = BatchService::new(
        Arc::new(harvest_service(settings, &ctx)?),
        settings.downloads_dir.clone(),
    );

    let cancel = service.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, std::sync::atomic::Ordering::Relaxed);
        }
    });

    let pb = ProgressBar::new(articles.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")?
            .progress_chars("█▓░"),
    );

    let (event_tx, mut event_rx) = mpsc::channel::<HarvestEvent>(100);

    let pb_events = pb.clone();
    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                HarvestEvent::PageStarted { title, .. } => {
                    pb_events.set_message(truncate(&title, 50));
                }
                HarvestEvent::PdfSaved {
                    filename, bytes, ..
                } => {
                    pb_events.println(format!(
                        "  {} {} ({})",
                        style("✓").green(),
                        filename,
                        format_size(bytes)
                    ));
                }
                HarvestEvent::PdfRejected { error, .. } => {
                    pb_events.println(format!("  {} {}", style("✗").red(), error));
                }
                HarvestEvent::PageFailed { error, .. } => {
                    pb_events.println(format!("{} {}", style("✗").red(), error));
                    pb_events.inc(1);
                }
                HarvestEvent::PageFinished { .. } => {
                    pb_events.inc(1);
                }
            }
        }
    });

    let result = service.scan_all(articles, settings.workers, event_tx).await;

    if let Err(e) = event_handler.await {
        tracing::warn!("Event handler task failed: {}", e);
    }
    pb.finish_and_clear();

    println!(
        "{} Scanned {} page(s): {} new PDF(s)",
        style("✓").green(),
        result.pages,
        result.pdfs
    );
    if result.failed_pages > 0 {
        println!(
            "  {} {} page(s) could not be fetched",
            style("!").yellow(),
            result.failed_pages
        );
    }

    Ok(())
}
