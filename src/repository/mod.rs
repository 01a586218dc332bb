//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM over SQLite, wrapped for async use.

pub mod diesel_article;
pub mod diesel_context;
pub mod diesel_harvest;
pub mod diesel_models;
pub mod pool;
pub mod util;

pub use diesel_article::DieselArticleRepository;
pub use diesel_context::DieselDbContext;
pub use diesel_harvest::{DieselHarvestRepository, ExportEntry, HarvestFilter, HarvestStats};
pub use pool::{AsyncSqlitePool, DieselError};

use chrono::{DateTime, Utc};

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_datetime_handles_zulu_and_garbage() {
        let dt = parse_datetime("2025-09-01T10:00:00.000000Z");
        assert_eq!(dt.to_rfc3339(), "2025-09-01T10:00:00+00:00");
        assert_eq!(parse_datetime("yesterday"), DateTime::UNIX_EPOCH);
    }
}
