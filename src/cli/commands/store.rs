//! Stats, listing, and export commands.

use std::path::PathBuf;

use console::style;

use crate::cli::helpers::{open_db, truncate};
use crate::config::Settings;
use crate::models::HarvestStatus;
use crate::repository::HarvestFilter;
use crate::utils::format_size;

/// Show harvest statistics.
pub async fn cmd_stats(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let stats = ctx.harvests().stats().await?;
    let articles = ctx.articles().count_active().await?;

    println!("{} Harvest statistics", style("→").cyan());
    for status in [
        HarvestStatus::Success,
        HarvestStatus::Failed,
        HarvestStatus::Detected,
    ] {
        println!("  {:<10} {}", status.as_str(), stats.count(status));
    }
    println!("  {:<10} {}", "articles", articles);
    println!(
        "  {} {} article page(s) with at least one PDF",
        style("→").dim(),
        stats.articles_with_pdfs
    );
    Ok(())
}

/// List harvested records, newest first.
pub async fn cmd_list(
    settings: &Settings,
    status: Option<HarvestStatus>,
    limit: i64,
) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let filter = HarvestFilter {
        status,
        limit: Some(limit),
        ..Default::default()
    };
    let records = ctx.harvests().list(&filter).await?;

    if records.is_empty() {
        println!("{} No records", style("!").yellow());
        return Ok(());
    }

    for record in records {
        let marker = match record.status {
            HarvestStatus::Success => style("✓").green(),
            HarvestStatus::Failed => style("✗").red(),
            HarvestStatus::Detected => style("•").cyan(),
        };
        let detail = match (record.status, record.failure_reason) {
            (HarvestStatus::Success, _) => format_size(record.file_size),
            (_, Some(reason)) => reason.to_string(),
            _ => record.status.to_string(),
        };
        println!(
            "{} {} {}",
            marker,
            record.url,
            style(format!("[{}]", detail)).dim()
        );
        println!(
            "  {} {}",
            style(record.harvest_date.format("%Y-%m-%d %H:%M")).dim(),
            truncate(&record.article_title, 80)
        );
    }
    Ok(())
}

/// Export successful harvests as a JSON array.
pub async fn cmd_export(settings: &Settings, output: Option<PathBuf>) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let json = ctx.harvests().export_json().await?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, &json).await?;
            println!(
                "{} Exported to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}
