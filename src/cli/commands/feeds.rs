//! Feed and article commands.

use console::style;

use crate::cli::helpers::{http_client, open_db, truncate};
use crate::config::Settings;
use crate::repository::DieselDbContext;
use crate::services::FeedClient;

/// List configured feeds.
pub async fn cmd_feeds(settings: &Settings) -> anyhow::Result<()> {
    let feeds = FeedClient::new(http_client(settings)?, settings.feeds.clone());
    if feeds.themes().next().is_none() {
        println!("{} No feeds configured", style("!").yellow());
        return Ok(());
    }

    println!("{} {} feed(s)", style("→").cyan(), settings.feeds.len());
    for (theme, url) in feeds.themes() {
        println!("  {:<48} {}", style(theme).bold(), style(url).dim());
    }
    Ok(())
}

/// Show stored articles for a theme, optionally refreshing the feed first.
pub async fn cmd_articles(
    settings: &Settings,
    theme: &str,
    refresh: bool,
    limit: Option<i64>,
) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;

    if refresh {
        refresh_theme(settings, &ctx, theme).await?;
    }

    let articles = ctx.articles().list_active(theme, limit).await?;
    if articles.is_empty() {
        println!("{} No articles stored for {}", style("!").yellow(), theme);
        println!(
            "  {} Run 'harvest articles \"{}\" --refresh' to fetch the feed",
            style("→").dim(),
            theme
        );
        return Ok(());
    }

    for article in articles {
        println!("{} {}", style("•").cyan(), style(&article.title).bold());
        println!("  {} {}", style(&article.published).dim(), article.link);
        println!("  {}", truncate(&article.description, 160));
    }
    Ok(())
}

/// Fetch a theme's feed and replace its stored articles. Returns the count.
pub async fn refresh_theme(
    settings: &Settings,
    ctx: &DieselDbContext,
    theme: &str,
) -> anyhow::Result<usize> {
    let feeds = FeedClient::new(http_client(settings)?, settings.feeds.clone());
    let articles = feeds.fetch(theme).await?;
    let stored = ctx.articles().refresh_theme(theme, &articles).await?;
    println!(
        "{} Refreshed {}: {} article(s)",
        style("✓").green(),
        theme,
        stored
    );
    Ok(stored)
}
