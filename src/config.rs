//! Configuration management using the prefer crate.
//!
//! `Config` is the on-disk model (every field optional); `Settings` holds the
//! resolved runtime values. Precedence, lowest first: built-in defaults,
//! discovered or explicit config file, environment, command-line flags.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http_client::{DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_PAGE_TIMEOUT};
use crate::repository::DieselDbContext;
use crate::services::carbon::DEFAULT_DATAFAIR_BASE;
use crate::services::default_feeds;
use crate::services::harvest::MIN_PDF_SIZE;

/// Name used for config discovery (`ademe-harvest.toml`, `.yaml`, …).
pub const CONFIG_NAME: &str = "ademe-harvest";

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "harvester.db";

/// Default downloads subdirectory name.
const DOWNLOADS_SUBDIR: &str = "downloads";

/// Default number of concurrent page scans in a batch.
pub const DEFAULT_WORKERS: usize = 3;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// Root directory for downloaded PDFs.
    pub downloads_dir: PathBuf,
    /// User agent (`None` = browser default, `"impersonate"` = random browser).
    pub user_agent: Option<String>,
    pub page_timeout: Duration,
    pub download_timeout: Duration,
    /// Concurrent page scans in a batch.
    pub workers: usize,
    /// Smallest body accepted as a PDF.
    pub min_pdf_size: usize,
    /// Theme → RSS URL.
    pub feeds: BTreeMap<String, String>,
    /// Data Fair datasets endpoint.
    pub carbon_api_base: String,
}

impl Default for Settings {
    fn default() -> Self {
        // Documents dir -> Home dir -> Current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_NAME);

        Self {
            downloads_dir: data_dir.join(DOWNLOADS_SUBDIR),
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            user_agent: None,
            page_timeout: DEFAULT_PAGE_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            workers: DEFAULT_WORKERS,
            min_pdf_size: MIN_PDF_SIZE,
            feeds: default_feeds(),
            carbon_api_base: DEFAULT_DATAFAIR_BASE.to_string(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            downloads_dir: data_dir.join(DOWNLOADS_SUBDIR),
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        match self.database_url {
            Some(ref url) => url.clone(),
            None => format!("sqlite:{}", self.database_path().display()),
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Check if the database appears to be initialized.
    pub fn database_exists(&self) -> bool {
        self.database_url.is_some() || self.database_path().exists()
    }

    /// Ensure the data and downloads directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (dir, label) in [(&self.data_dir, "data"), (&self.downloads_dir, "downloads")] {
            fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create {} directory '{}': {}",
                        label,
                        dir.display(),
                        e
                    ),
                )
            })?;
        }
        Ok(())
    }

    /// Create a database context for the configured database.
    pub fn create_db_context(&self) -> DieselDbContext {
        DieselDbContext::from_url(&self.database_url())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "target")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Downloads directory (relative paths resolve against the config file).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads_dir: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Page fetch timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_timeout: Option<u64>,
    /// PDF download timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_pdf_size: Option<u64>,
    /// Extra or replacement feeds, merged over the defaults.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    #[prefer(default)]
    pub feeds: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_api_base: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer for discovery.
    /// Falls back to defaults when no file is found or it does not parse.
    pub async fn load() -> Self {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// TOML and YAML by extension, JSON otherwise.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// `~` is expanded; absolute paths are returned as-is.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
            settings.downloads_dir = settings.data_dir.join(DOWNLOADS_SUBDIR);
        }
        if let Some(ref downloads_dir) = self.downloads_dir {
            settings.downloads_dir = self.resolve_path(downloads_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(secs) = self.page_timeout {
            settings.page_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.download_timeout {
            settings.download_timeout = Duration::from_secs(secs);
        }
        if let Some(workers) = self.workers {
            settings.workers = (workers as usize).max(1);
        }
        if let Some(min_pdf_size) = self.min_pdf_size {
            settings.min_pdf_size = min_pdf_size as usize;
        }
        for (theme, url) in &self.feeds {
            settings.feeds.insert(theme.clone(), url.clone());
        }
        if let Some(ref base) = self.carbon_api_base {
            settings.carbon_api_base = base.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory (`--target`).
    pub target: Option<PathBuf>,
    /// Worker count (`--workers`).
    pub workers: Option<usize>,
}

/// Look for `ademe-harvest.{ext}` or `config.{ext}` inside a data directory.
fn find_config_in_dir(data_dir: &Path) -> Option<PathBuf> {
    let extensions = ["toml", "yaml", "yml", "json"];
    let basenames = [CONFIG_NAME, "config"];

    for basename in basenames {
        for ext in extensions {
            let path = data_dir.join(format!("{}.{}", basename, ext));
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

/// Load config from file sources.
async fn load_file_config(options: &LoadOptions, target: Option<&PathBuf>) -> Config {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("{}", e);
                Config::default()
            });
    }

    // Priority 2: Config inside the target directory
    if let Some(dir) = target {
        if let Some(config_path) = find_config_in_dir(dir) {
            tracing::debug!("Found config in target dir: {}", config_path.display());
            return Config::load_from_path(&config_path)
                .await
                .unwrap_or_else(|_| Config::default());
        }
    }

    // Priority 3: Auto-discover via prefer
    Config::load().await
}

fn absolute(path: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let path = PathBuf::from(expanded);
    if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    }
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let target = options.target.as_deref().map(absolute);
    let config = load_file_config(&options, target.as_ref()).await;

    let mut settings = Settings::default();
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    // --target takes precedence for data_dir, and moves downloads along
    // unless the config placed them explicitly
    if let Some(dir) = target {
        settings.data_dir = dir;
        if config.downloads_dir.is_none() {
            settings.downloads_dir = settings.data_dir.join(DOWNLOADS_SUBDIR);
        }
    }

    if let Some(database_url) = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
        tracing::debug!("Using DATABASE_URL from environment: {}", database_url);
        settings.database_url = Some(database_url);
    }

    if let Some(user_agent) = std::env::var("ADEME_HARVEST_USER_AGENT")
        .ok()
        .filter(|s| !s.is_empty())
    {
        settings.user_agent = Some(user_agent);
    }

    if let Some(workers) = options.workers {
        settings.workers = workers.max(1);
    }

    (settings, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::with_data_dir(PathBuf::from("/data"));
        assert_eq!(settings.downloads_dir, PathBuf::from("/data/downloads"));
        assert_eq!(settings.database_path(), PathBuf::from("/data/harvester.db"));
        assert_eq!(settings.database_url(), "sqlite:/data/harvester.db");
        assert_eq!(settings.page_timeout, Duration::from_secs(20));
        assert_eq!(settings.download_timeout, Duration::from_secs(30));
        assert_eq!(settings.workers, 3);
        assert_eq!(settings.min_pdf_size, 1000);
        assert_eq!(settings.feeds.len(), 13);
    }

    #[tokio::test]
    async fn test_load_toml_and_apply() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ademe-harvest.toml");
        std::fs::write(
            &path,
            r#"
target = "data"
downloads_dir = "/srv/pdfs"
workers = 0
page_timeout = 5

[feeds]
Test = "https://x.test/rss.xml"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.base_dir().as_deref(), Some(dir.path()));

        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, dir.path());
        assert_eq!(settings.data_dir, dir.path().join("data"));
        assert_eq!(settings.downloads_dir, PathBuf::from("/srv/pdfs"));
        assert_eq!(settings.workers, 1);
        assert_eq!(settings.page_timeout, Duration::from_secs(5));
        assert_eq!(settings.feeds.len(), 14);
        assert_eq!(settings.feeds["Test"], "https://x.test/rss.xml");
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let dir = tempdir().unwrap();

        let yaml = dir.path().join("c.yaml");
        std::fs::write(&yaml, "min_pdf_size: 2048\nuser_agent: impersonate\n").unwrap();
        let config = Config::load_from_path(&yaml).await.unwrap();
        assert_eq!(config.min_pdf_size, Some(2048));
        assert_eq!(config.user_agent.as_deref(), Some("impersonate"));

        let json = dir.path().join("c.json");
        std::fs::write(&json, r#"{"database": "other.db"}"#).unwrap();
        let config = Config::load_from_path(&json).await.unwrap();
        assert_eq!(config.database.as_deref(), Some("other.db"));
    }

    #[tokio::test]
    async fn test_invalid_config_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "workers = [").unwrap();
        assert!(Config::load_from_path(&path).await.is_err());
    }

    #[test]
    fn test_find_config_in_dir() {
        let dir = tempdir().unwrap();
        assert!(find_config_in_dir(dir.path()).is_none());
        std::fs::write(dir.path().join("config.yaml"), "workers: 2\n").unwrap();
        assert_eq!(
            find_config_in_dir(dir.path()),
            Some(dir.path().join("config.yaml"))
        );
    }

    #[test]
    fn test_resolve_path() {
        let config = Config::default();
        let base = Path::new("/base");
        assert_eq!(config.resolve_path("/abs", base), PathBuf::from("/abs"));
        assert_eq!(config.resolve_path("rel", base), PathBuf::from("/base/rel"));
    }
}
