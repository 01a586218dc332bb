//! Diesel-based repository for harvested PDF records.
//!
//! Records are keyed by URL. Every mutation goes through the pool's shared
//! write lock so concurrent scans serialize their upserts.

use std::collections::HashMap;

use chrono::SecondsFormat;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use serde::Serialize;

use super::diesel_models::{HarvestedPdfRecord, NewHarvestedPdf};
use super::parse_datetime;
use super::pool::{AsyncSqlitePool, DieselError};
use crate::models::{FailureReason, HarvestStatus, HarvestedPdf};
use crate::schema::harvested_pdfs;

impl From<HarvestedPdfRecord> for HarvestedPdf {
    fn from(record: HarvestedPdfRecord) -> Self {
        HarvestedPdf {
            url: record.url,
            filename: record.filename,
            file_size: record.file_size.max(0) as u64,
            content_hash: record.content_hash,
            source_feed: record.source_feed,
            harvest_date: parse_datetime(&record.harvest_date),
            status: HarvestStatus::from_str(&record.status).unwrap_or(HarvestStatus::Failed),
            failure_reason: record
                .failure_reason
                .as_deref()
                .and_then(FailureReason::from_str),
            article_title: record.article_title,
            article_url: record.article_url,
        }
    }
}

/// Filter for listing harvested records.
#[derive(Debug, Clone, Default)]
pub struct HarvestFilter {
    pub status: Option<HarvestStatus>,
    pub article_url: Option<String>,
    pub limit: Option<i64>,
}

impl HarvestFilter {
    /// Only successfully downloaded records.
    pub fn successes() -> Self {
        Self {
            status: Some(HarvestStatus::Success),
            ..Default::default()
        }
    }
}

/// Aggregate counts over the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HarvestStats {
    pub by_status: HashMap<String, u64>,
    /// Distinct article pages with at least one successful PDF.
    pub articles_with_pdfs: u64,
}

impl HarvestStats {
    pub fn count(&self, status: HarvestStatus) -> u64 {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

/// One entry of the JSON export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportEntry {
    pub pdf_url: String,
    pub filename: String,
    pub article_title: String,
    pub article_url: String,
    pub harvest_date: String,
}

/// Diesel-based harvested PDF repository.
#[derive(Clone)]
pub struct DieselHarvestRepository {
    pool: AsyncSqlitePool,
}

impl DieselHarvestRepository {
    /// Create a new harvested PDF repository.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a record, or replace every field of the existing record with
    /// the same URL.
    pub async fn upsert(&self, record: &HarvestedPdf) -> Result<(), DieselError> {
        let harvest_date = record
            .harvest_date
            .to_rfc3339_opts(SecondsFormat::Micros, true);
        let new_record = NewHarvestedPdf {
            url: &record.url,
            filename: &record.filename,
            file_size: record.file_size as i64,
            content_hash: &record.content_hash,
            source_feed: &record.source_feed,
            harvest_date: &harvest_date,
            status: record.status.as_str(),
            failure_reason: record.failure_reason.map(|r| r.as_str()),
            article_title: &record.article_title,
            article_url: &record.article_url,
        };

        let _guard = self.pool.write_lock().lock().await;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(harvested_pdfs::table)
            .values(&new_record)
            .on_conflict(harvested_pdfs::url)
            .do_update()
            .set((
                harvested_pdfs::filename.eq(excluded(harvested_pdfs::filename)),
                harvested_pdfs::file_size.eq(excluded(harvested_pdfs::file_size)),
                harvested_pdfs::content_hash.eq(excluded(harvested_pdfs::content_hash)),
                harvested_pdfs::source_feed.eq(excluded(harvested_pdfs::source_feed)),
                harvested_pdfs::harvest_date.eq(excluded(harvested_pdfs::harvest_date)),
                harvested_pdfs::status.eq(excluded(harvested_pdfs::status)),
                harvested_pdfs::failure_reason.eq(excluded(harvested_pdfs::failure_reason)),
                harvested_pdfs::article_title.eq(excluded(harvested_pdfs::article_title)),
                harvested_pdfs::article_url.eq(excluded(harvested_pdfs::article_url)),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Get the record for a URL.
    pub async fn get(&self, url: &str) -> Result<Option<HarvestedPdf>, DieselError> {
        let mut conn = self.pool.get().await?;

        harvested_pdfs::table
            .filter(harvested_pdfs::url.eq(url))
            .select(HarvestedPdfRecord::as_select())
            .first::<HarvestedPdfRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(HarvestedPdf::from))
    }

    /// List records, newest harvest first.
    pub async fn list(&self, filter: &HarvestFilter) -> Result<Vec<HarvestedPdf>, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query = harvested_pdfs::table
            .select(HarvestedPdfRecord::as_select())
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(harvested_pdfs::status.eq(status.as_str()));
        }
        if let Some(ref article_url) = filter.article_url {
            query = query.filter(harvested_pdfs::article_url.eq(article_url.clone()));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        let records: Vec<HarvestedPdfRecord> = query
            .order((harvested_pdfs::harvest_date.desc(), harvested_pdfs::id.desc()))
            .load(&mut conn)
            .await?;

        Ok(records.into_iter().map(HarvestedPdf::from).collect())
    }

    /// Count records per status and articles with at least one PDF.
    pub async fn stats(&self) -> Result<HarvestStats, DieselError> {
        use diesel::dsl::{count_distinct, count_star};

        let mut conn = self.pool.get().await?;

        let rows: Vec<(String, i64)> = harvested_pdfs::table
            .group_by(harvested_pdfs::status)
            .select((harvested_pdfs::status, count_star()))
            .load(&mut conn)
            .await?;

        let articles_with_pdfs: i64 = harvested_pdfs::table
            .filter(harvested_pdfs::status.eq(HarvestStatus::Success.as_str()))
            .select(count_distinct(harvested_pdfs::article_url))
            .first(&mut conn)
            .await?;

        Ok(HarvestStats {
            by_status: rows
                .into_iter()
                .map(|(status, count)| (status, count as u64))
                .collect(),
            articles_with_pdfs: articles_with_pdfs as u64,
        })
    }

    /// Read-only projection of successful records for export.
    pub async fn export_entries(&self) -> Result<Vec<ExportEntry>, DieselError> {
        let records = self.list(&HarvestFilter::successes()).await?;
        Ok(records
            .into_iter()
            .map(|r| ExportEntry {
                pdf_url: r.url,
                filename: r.filename,
                article_title: r.article_title,
                article_url: r.article_url,
                harvest_date: r.harvest_date.to_rfc3339_opts(SecondsFormat::Secs, true),
            })
            .collect())
    }

    /// Export successful records as a pretty-printed JSON array.
    pub async fn export_json(&self) -> anyhow::Result<String> {
        let entries = self.export_entries().await?;
        Ok(serde_json::to_string_pretty(&entries)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DieselDbContext;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    async fn setup_test_db() -> (DieselHarvestRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DieselDbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx.harvests(), dir)
    }

    fn success(url: &str, article: &str) -> HarvestedPdf {
        HarvestedPdf::success(url, "report.pdf", b"%PDF-1.4", "Air", "Report", article)
    }

    #[tokio::test]
    async fn test_upsert_then_get() {
        let (repo, _dir) = setup_test_db().await;
        let record = success("https://x.test/a.pdf", "https://x.test/article");

        repo.upsert(&record).await.unwrap();

        let stored = repo.get("https://x.test/a.pdf").await.unwrap().unwrap();
        assert_eq!(stored.url, record.url);
        assert_eq!(stored.status, HarvestStatus::Success);
        assert_eq!(stored.file_size, 8);
        assert_eq!(stored.content_hash, record.content_hash);
        assert!(repo.get("https://x.test/missing.pdf").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_upsert_replaces_first() {
        let (repo, _dir) = setup_test_db().await;
        let url = "https://x.test/a.pdf";

        repo.upsert(&HarvestedPdf::detected(url, "Air", "Old", "https://x.test/1"))
            .await
            .unwrap();
        let second = HarvestedPdf::failed(
            url,
            FailureReason::SignatureMismatch,
            "Énergies",
            "New",
            "https://x.test/2",
        );
        repo.upsert(&second).await.unwrap();

        let all = repo.list(&HarvestFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        let stored = &all[0];
        assert_eq!(stored.status, HarvestStatus::Failed);
        assert_eq!(stored.failure_reason, Some(FailureReason::SignatureMismatch));
        assert_eq!(stored.source_feed, "Énergies");
        assert_eq!(stored.article_title, "New");
        assert_eq!(stored.article_url, "https://x.test/2");
    }

    #[tokio::test]
    async fn test_urls_are_not_canonicalized() {
        let (repo, _dir) = setup_test_db().await;
        repo.upsert(&success("https://x.test/a.pdf", "p")).await.unwrap();
        repo.upsert(&success("https://x.test/A.pdf", "p")).await.unwrap();
        repo.upsert(&success("https://x.test/a.pdf/", "p")).await.unwrap();

        assert_eq!(repo.list(&HarvestFilter::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let (repo, _dir) = setup_test_db().await;

        let mut older = success("https://x.test/old.pdf", "https://x.test/1");
        older.harvest_date = Utc::now() - Duration::hours(1);
        repo.upsert(&older).await.unwrap();
        repo.upsert(&success("https://x.test/new.pdf", "https://x.test/2"))
            .await
            .unwrap();
        repo.upsert(&HarvestedPdf::failed(
            "https://x.test/bad.pdf",
            FailureReason::DownloadError,
            "Air",
            "Bad",
            "https://x.test/2",
        ))
        .await
        .unwrap();

        let successes = repo.list(&HarvestFilter::successes()).await.unwrap();
        let urls: Vec<_> = successes.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://x.test/new.pdf", "https://x.test/old.pdf"]);

        let for_article = repo
            .list(&HarvestFilter {
                article_url: Some("https://x.test/2".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_article.len(), 2);

        let limited = repo
            .list(&HarvestFilter {
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_stats_and_export() {
        let (repo, _dir) = setup_test_db().await;
        repo.upsert(&success("https://x.test/a.pdf", "https://x.test/1"))
            .await
            .unwrap();
        repo.upsert(&success("https://x.test/b.pdf", "https://x.test/1"))
            .await
            .unwrap();
        repo.upsert(&HarvestedPdf::failed(
            "https://x.test/c.pdf",
            FailureReason::TooSmall,
            "Air",
            "C",
            "https://x.test/2",
        ))
        .await
        .unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.count(HarvestStatus::Success), 2);
        assert_eq!(stats.count(HarvestStatus::Failed), 1);
        assert_eq!(stats.count(HarvestStatus::Detected), 0);
        assert_eq!(stats.articles_with_pdfs, 1);

        let json = repo.export_json().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entries = parsed.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].get("pdf_url").is_some());
        assert!(entries[0].get("harvest_date").is_some());
        assert!(entries[0].get("status").is_none());
    }

    #[tokio::test]
    async fn test_concurrent_upserts_leave_one_record() {
        let (repo, _dir) = setup_test_db().await;
        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let record = HarvestedPdf::detected(
                    "https://x.test/shared.pdf",
                    "Air",
                    &format!("title {}", i),
                    "https://x.test/page",
                );
                repo.upsert(&record).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let all = repo.list(&HarvestFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }
}
