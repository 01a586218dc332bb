//! Initialize command.

use console::style;

use crate::cli::helpers::open_db;
use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    ctx.test_connection().await?;

    println!(
        "{} Initialized ademe-harvest in {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    println!(
        "  {} Database: {}",
        style("→").dim(),
        settings.database_path().display()
    );
    println!(
        "  {} Downloads: {}",
        style("→").dim(),
        settings.downloads_dir.display()
    );
    println!(
        "  {} {} feed(s) configured",
        style("→").dim(),
        settings.feeds.len()
    );

    Ok(())
}
