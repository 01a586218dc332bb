//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod carbon;
mod feeds;
mod init;
mod scan;
mod store;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};
use crate::models::HarvestStatus;

#[derive(Parser)]
#[command(name = "harvest")]
#[command(about = "Harvest PDF publications from ADEME thematic feeds")]
#[command(version)]
pub struct Cli {
    /// Data directory (overrides config file)
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// List configured feeds
    Feeds,

    /// Show stored articles for a theme
    Articles {
        /// Theme name, as listed by `feeds`
        theme: String,
        /// Fetch the feed before listing
        #[arg(short, long)]
        refresh: bool,
        /// Maximum number of articles to show
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Scan one publication page for PDFs
    Scan {
        /// Page URL
        url: String,
        /// Title used for file naming and provenance
        #[arg(long, default_value = "")]
        title: String,
        /// Download directory (defaults to the configured downloads dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
        /// Record candidates as detected without downloading
        #[arg(long)]
        detect_only: bool,
    },

    /// Refresh a theme's feed and scan every article page
    ScanTheme {
        /// Theme name, as listed by `feeds`
        theme: String,
        /// Concurrent page scans
        #[arg(short, long)]
        workers: Option<usize>,
        /// Scan at most this many articles
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Show harvest statistics
    Stats,

    /// List harvested records, newest first
    List {
        /// Only records with this status (success, failed, detected)
        #[arg(short, long, value_parser = parse_status)]
        status: Option<HarvestStatus>,
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },

    /// Export successful harvests as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Emission-factor lookup and calculation
    Carbon {
        #[command(subcommand)]
        command: CarbonCommands,
    },
}

#[derive(Subcommand)]
enum CarbonCommands {
    /// Search emission factors
    Search {
        query: String,
        #[arg(long, default_value = "20")]
        size: u32,
        #[arg(long, default_value = "1")]
        page: u32,
    },
    /// Published greenhouse-gas reports for a SIREN
    Bilans {
        siren: String,
        #[arg(long, default_value = "20")]
        size: u32,
        #[arg(long, default_value = "1")]
        page: u32,
    },
    /// Compute emissions: amount (in unit) times factor (per factor unit)
    Compute {
        amount: f64,
        unit: String,
        factor: f64,
        factor_unit: String,
    },
}

fn parse_status(s: &str) -> Result<HarvestStatus, String> {
    HarvestStatus::from_str(s)
        .ok_or_else(|| format!("unknown status '{}' (success, failed, detected)", s))
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let workers = match &cli.command {
        Commands::ScanTheme { workers, .. } => *workers,
        _ => None,
    };
    let options = LoadOptions {
        config_path: cli.config,
        target: cli.target,
        workers,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Feeds => feeds::cmd_feeds(&settings).await,
        Commands::Articles {
            theme,
            refresh,
            limit,
        } => feeds::cmd_articles(&settings, &theme, refresh, limit).await,
        Commands::Scan {
            url,
            title,
            dir,
            detect_only,
        } => {
            if detect_only {
                scan::cmd_detect(&settings, &url, &title).await
            } else {
                scan::cmd_scan(&settings, &url, &title, dir).await
            }
        }
        Commands::ScanTheme { theme, limit, .. } => {
            scan::cmd_scan_theme(&settings, &theme, limit).await
        }
        Commands::Stats => store::cmd_stats(&settings).await,
        Commands::List { status, limit } => store::cmd_list(&settings, status, limit).await,
        Commands::Export { output } => store::cmd_export(&settings, output).await,
        Commands::Carbon { command } => match command {
            CarbonCommands::Search { query, size, page } => {
                carbon::cmd_search(&settings, &query, size, page).await
            }
            CarbonCommands::Bilans { siren, size, page } => {
                carbon::cmd_bilans(&settings, &siren, size, page).await
            }
            CarbonCommands::Compute {
                amount,
                unit,
                factor,
                factor_unit,
            } => carbon::cmd_compute(amount, &unit, factor, &factor_unit),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan_command() {
        let cli = Cli::try_parse_from([
            "harvest",
            "-v",
            "scan",
            "https://librairie.ademe.fr/air/123-guide.html",
            "--title",
            "Guide",
            "--detect-only",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Scan {
                detect_only: true,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_list_status() {
        let cli = Cli::try_parse_from(["harvest", "list", "--status", "failed"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List {
                status: Some(HarvestStatus::Failed),
                limit: 50
            }
        ));
        assert!(Cli::try_parse_from(["harvest", "list", "--status", "bogus"]).is_err());
    }

    #[test]
    fn test_clap_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
