//! Diesel-based repository for feed articles.

use chrono::{SecondsFormat, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use super::diesel_models::{ArticleRecord, NewArticle};
use super::parse_datetime;
use super::pool::{AsyncSqlitePool, DieselError};
use crate::models::FeedArticle;
use crate::schema::articles;

impl From<ArticleRecord> for FeedArticle {
    fn from(record: ArticleRecord) -> Self {
        FeedArticle {
            title: record.title,
            theme: record.theme,
            link: record.link,
            description: record.description,
            published: record.published,
            last_updated: parse_datetime(&record.last_updated),
        }
    }
}

/// Diesel-based feed article repository.
#[derive(Clone)]
pub struct DieselArticleRepository {
    pool: AsyncSqlitePool,
}

impl DieselArticleRepository {
    /// Create a new article repository.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Replace the active article set of a theme.
    ///
    /// Previous rows for the theme are deactivated, then each fresh article is
    /// upserted by link and marked active. Returns the number of articles
    /// written.
    pub async fn refresh_theme(
        &self,
        theme: &str,
        fresh: &[FeedArticle],
    ) -> Result<usize, DieselError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let _guard = self.pool.write_lock().lock().await;
        let mut conn = self.pool.get().await?;

        diesel::update(articles::table.filter(articles::theme.eq(theme)))
            .set(articles::is_active.eq(0))
            .execute(&mut conn)
            .await?;

        for article in fresh {
            let new_article = NewArticle {
                title: &article.title,
                theme,
                link: &article.link,
                description: &article.description,
                published: &article.published,
                last_updated: &now,
                is_active: 1,
            };

            diesel::insert_into(articles::table)
                .values(&new_article)
                .on_conflict(articles::link)
                .do_update()
                .set((
                    articles::title.eq(excluded(articles::title)),
                    articles::theme.eq(excluded(articles::theme)),
                    articles::description.eq(excluded(articles::description)),
                    articles::published.eq(excluded(articles::published)),
                    articles::last_updated.eq(excluded(articles::last_updated)),
                    articles::is_active.eq(excluded(articles::is_active)),
                ))
                .execute(&mut conn)
                .await?;
        }

        Ok(fresh.len())
    }

    /// Active articles of a theme, in feed order.
    pub async fn list_active(
        &self,
        theme: &str,
        limit: Option<i64>,
    ) -> Result<Vec<FeedArticle>, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query = articles::table
            .filter(articles::theme.eq(theme.to_string()))
            .filter(articles::is_active.eq(1))
            .select(ArticleRecord::as_select())
            .order(articles::id.asc())
            .into_boxed();
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let records: Vec<ArticleRecord> = query.load(&mut conn).await?;
        Ok(records.into_iter().map(FeedArticle::from).collect())
    }

    /// Number of active articles across all themes.
    pub async fn count_active(&self) -> Result<u64, DieselError> {
        use diesel::dsl::count_star;

        let mut conn = self.pool.get().await?;
        let count: i64 = articles::table
            .filter(articles::is_active.eq(1))
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count as u64)
    }
}
