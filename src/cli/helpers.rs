//! Shared helper functions for CLI commands.

use crate::config::Settings;
use crate::http_client::HttpClient;
use crate::repository::DieselDbContext;

/// Truncate to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// HTTP client built from settings.
pub fn http_client(settings: &Settings) -> anyhow::Result<HttpClient> {
    Ok(HttpClient::with_user_agent(
        settings.user_agent.as_deref(),
        settings.page_timeout,
        settings.download_timeout,
    )?)
}

/// Database context with the schema in place.
pub async fn open_db(settings: &Settings) -> anyhow::Result<DieselDbContext> {
    settings.ensure_directories()?;
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("court", 10), "court");
        assert_eq!(truncate("Économie circulaire", 10), "Économi...");
    }
}
