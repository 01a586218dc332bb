//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// Harvested PDF row.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::harvested_pdfs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HarvestedPdfRecord {
    pub id: i32,
    pub url: String,
    pub filename: String,
    pub file_size: i64,
    pub content_hash: String,
    pub source_feed: String,
    pub harvest_date: String,
    pub status: String,
    pub failure_reason: Option<String>,
    pub article_title: String,
    pub article_url: String,
}

/// Harvested PDF for insertion or upsert.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::harvested_pdfs)]
pub struct NewHarvestedPdf<'a> {
    pub url: &'a str,
    pub filename: &'a str,
    pub file_size: i64,
    pub content_hash: &'a str,
    pub source_feed: &'a str,
    pub harvest_date: &'a str,
    pub status: &'a str,
    pub failure_reason: Option<&'a str>,
    pub article_title: &'a str,
    pub article_url: &'a str,
}

/// Feed article row.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::articles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ArticleRecord {
    pub id: i32,
    pub title: String,
    pub theme: String,
    pub link: String,
    pub description: String,
    pub published: String,
    pub last_updated: String,
    pub is_active: i32,
}

/// Feed article for insertion or upsert.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::articles)]
pub struct NewArticle<'a> {
    pub title: &'a str,
    pub theme: &'a str,
    pub link: &'a str,
    pub description: &'a str,
    pub published: &'a str,
    pub last_updated: &'a str,
    pub is_active: i32,
}
