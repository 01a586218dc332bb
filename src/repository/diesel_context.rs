//! Diesel database context for managing connections and repository access.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::diesel_article::DieselArticleRepository;
use super::diesel_harvest::DieselHarvestRepository;
use super::pool::{AsyncSqlitePool, DieselError};

/// Entry point for database operations.
///
/// Create one context per command or service and hand out repositories from
/// it. Repositories from the same context share one write lock.
///
/// # Example
/// ```ignore
/// let ctx = DieselDbContext::new(&db_path);
/// ctx.init_schema().await?;
/// let record = ctx.harvests().get("https://x.test/a.pdf").await?;
/// ```
#[derive(Clone)]
pub struct DieselDbContext {
    pool: AsyncSqlitePool,
}

impl DieselDbContext {
    /// Create a new database context from a file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: AsyncSqlitePool::from_path(db_path),
        }
    }

    /// Create a new database context from a `sqlite:` URL or bare path.
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: AsyncSqlitePool::new(database_url),
        }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &AsyncSqlitePool {
        &self.pool
    }

    /// Get a harvested-PDF repository.
    pub fn harvests(&self) -> DieselHarvestRepository {
        DieselHarvestRepository::new(self.pool.clone())
    }

    /// Get a feed-article repository.
    pub fn articles(&self) -> DieselArticleRepository {
        DieselArticleRepository::new(self.pool.clone())
    }

    /// Verify that the database can be opened.
    pub async fn test_connection(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute("SELECT 1").await
    }

    /// Create tables and indexes if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let _guard = self.pool.write_lock().lock().await;
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS harvested_pdfs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL UNIQUE,
                filename TEXT NOT NULL DEFAULT '',
                file_size BIGINT NOT NULL DEFAULT 0,
                content_hash TEXT NOT NULL DEFAULT '',
                source_feed TEXT NOT NULL DEFAULT '',
                harvest_date TEXT NOT NULL,
                status TEXT NOT NULL,
                failure_reason TEXT,
                article_title TEXT NOT NULL DEFAULT '',
                article_url TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_harvested_pdfs_status ON harvested_pdfs(status);
            CREATE INDEX IF NOT EXISTS idx_harvested_pdfs_date ON harvested_pdfs(harvest_date);
            CREATE INDEX IF NOT EXISTS idx_harvested_pdfs_article ON harvested_pdfs(article_url);

            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                theme TEXT NOT NULL,
                link TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                published TEXT NOT NULL DEFAULT '',
                last_updated TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_articles_theme ON articles(theme, is_active);
            "#,
        )
        .await
    }
}
