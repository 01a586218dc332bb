//! Articles read from thematic RSS feeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One `<item>` of a thematic feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedArticle {
    pub title: String,
    pub theme: String,
    /// Publication page URL, the input to a harvest scan.
    pub link: String,
    /// Description with HTML tags stripped.
    pub description: String,
    /// `pubDate` as published by the feed, unparsed.
    pub published: String,
    pub last_updated: DateTime<Utc>,
}

impl FeedArticle {
    pub fn new(title: &str, theme: &str, link: &str, description: &str, published: &str) -> Self {
        Self {
            title: title.to_string(),
            theme: theme.to_string(),
            link: link.to_string(),
            description: description.to_string(),
            published: published.to_string(),
            last_updated: Utc::now(),
        }
    }
}
