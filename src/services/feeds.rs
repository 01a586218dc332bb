//! Thematic RSS feeds.
//!
//! Feeds are plain RSS 2.0; items are pulled out with a handful of regexes
//! rather than a full XML parser.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info};

use crate::http_client::HttpClient;
use crate::models::FeedArticle;
use crate::utils::strip_html_tags;

/// The agency's thematic feeds, theme name → RSS URL.
pub const DEFAULT_FEEDS: &[(&str, &str)] = &[
    (
        "Agriculture, alimentation, forêt, bioéconomie",
        "https://librairie.ademe.fr/rss/3516-thematique-agriculture-alimentation-foret-bioeconomie.xml",
    ),
    ("Air", "https://librairie.ademe.fr/rss/3145-thematique-air.xml"),
    ("Bâtiment", "https://librairie.ademe.fr/rss/3153-thematique-batiment.xml"),
    (
        "Changement climatique",
        "https://librairie.ademe.fr/rss/3147-thematique-changement-climatique.xml",
    ),
    (
        "Consommer autrement",
        "https://librairie.ademe.fr/rss/2906-thematique-consommer-autrement.xml",
    ),
    (
        "Économie circulaire et Déchets",
        "https://librairie.ademe.fr/rss/3426-thematique-economie-circulaire-et-dechets.xml",
    ),
    ("Énergies", "https://librairie.ademe.fr/rss/3149-thematique-energies.xml"),
    (
        "Industrie et production durable",
        "https://librairie.ademe.fr/rss/3503-thematique-industrie-et-production-durable.xml",
    ),
    (
        "Institutionnel",
        "https://librairie.ademe.fr/rss/3157-thematique-institutionnel.xml",
    ),
    (
        "Mobilité et transports",
        "https://librairie.ademe.fr/rss/2901-thematique-mobilite-et-transports.xml",
    ),
    (
        "Recherche et innovation",
        "https://librairie.ademe.fr/rss/2930-thematique-recherche-et-innovation.xml",
    ),
    (
        "Société et politiques publiques",
        "https://librairie.ademe.fr/rss/3544-thematique-societe-et-politiques-publiques.xml",
    ),
    (
        "Urbanisme, territoires et sols",
        "https://librairie.ademe.fr/rss/3509-thematique-urbanisme-territoires-et-sols.xml",
    ),
];

const UNTITLED: &str = "Sans titre";
const NO_DESCRIPTION: &str = "Pas de description disponible.";
const UNKNOWN_DATE: &str = "Date inconnue";

/// [`DEFAULT_FEEDS`] as an owned map.
pub fn default_feeds() -> BTreeMap<String, String> {
    DEFAULT_FEEDS
        .iter()
        .map(|(theme, url)| (theme.to_string(), url.to_string()))
        .collect()
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown theme: {0}")]
    UnknownTheme(String),

    #[error("failed to fetch feed {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("feed {url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },
}

static ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<item\b[^>]*>(.*?)</item>").expect("rss item regex should compile")
});

static TITLE: LazyLock<Regex> = LazyLock::new(|| field_regex("title"));
static LINK: LazyLock<Regex> = LazyLock::new(|| field_regex("link"));
static DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| field_regex("description"));
static PUB_DATE: LazyLock<Regex> = LazyLock::new(|| field_regex("pubDate"));

static CDATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*<!\[CDATA\[(.*?)\]\]>\s*$").expect("cdata regex should compile")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity regex should compile")
});

fn field_regex(tag: &str) -> Regex {
    Regex::new(&format!(r"(?s)<{tag}\b[^>]*>(.*?)</{tag}>", tag = tag))
        .expect("rss field regex should compile")
}

/// Fetches and parses the configured feeds.
#[derive(Clone)]
pub struct FeedClient {
    client: HttpClient,
    feeds: BTreeMap<String, String>,
}

impl FeedClient {
    pub fn new(client: HttpClient, feeds: BTreeMap<String, String>) -> Self {
        Self { client, feeds }
    }

    /// Configured themes, sorted.
    pub fn themes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.feeds.iter().map(|(t, u)| (t.as_str(), u.as_str()))
    }

    pub fn feed_url(&self, theme: &str) -> Option<&str> {
        self.feeds.get(theme).map(String::as_str)
    }

    /// Fetch one theme's feed.
    pub async fn fetch(&self, theme: &str) -> Result<Vec<FeedArticle>, FeedError> {
        let url = self
            .feed_url(theme)
            .ok_or_else(|| FeedError::UnknownTheme(theme.to_string()))?;

        let response = self
            .client
            .get_page(url)
            .await
            .map_err(|source| FeedError::Fetch {
                url: url.to_string(),
                source,
            })?;
        if !response.is_success() {
            return Err(FeedError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        let xml = response.text().await.map_err(|source| FeedError::Fetch {
            url: url.to_string(),
            source,
        })?;

        let articles = parse_rss(&xml, theme);
        info!("Feed {} has {} item(s)", theme, articles.len());
        Ok(articles)
    }
}

/// Parse RSS 2.0 `<item>`s. Items without a title or link element are skipped.
pub fn parse_rss(xml: &str, theme: &str) -> Vec<FeedArticle> {
    ITEM.captures_iter(xml)
        .filter_map(|item| {
            let body = item.get(1)?.as_str();
            let title = field(&TITLE, body)?;
            let link = field(&LINK, body)?;

            let description = field(&DESCRIPTION, body)
                .map(|d| strip_html_tags(&d))
                .unwrap_or_else(|| NO_DESCRIPTION.to_string());
            let published = field(&PUB_DATE, body).unwrap_or_else(|| UNKNOWN_DATE.to_string());
            let title = if title.is_empty() {
                UNTITLED.to_string()
            } else {
                title
            };

            debug!("Feed item: {}", link);
            Some(FeedArticle::new(&title, theme, &link, &description, &published))
        })
        .collect()
}

/// Text of the first `<tag>` element, CDATA-unwrapped or entity-decoded.
fn field(pattern: &Regex, body: &str) -> Option<String> {
    let raw = pattern.captures(body)?.get(1)?.as_str();
    let text = match CDATA.captures(raw) {
        Some(cdata) => cdata.get(1).map_or("", |m| m.as_str()).to_string(),
        None => unescape_entities(raw),
    };
    Some(text.trim().to_string())
}

fn unescape_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <title>ADEME - Air</title>
  <item>
    <title><![CDATA[Guide de la qualité de l'air]]></title>
    <link>https://librairie.ademe.fr/air/123-guide.html</link>
    <description>&lt;p&gt;Un guide &amp;amp; des &lt;b&gt;conseils&lt;/b&gt;&lt;/p&gt;</description>
    <pubDate>Mon, 01 Sep 2025 10:00:00 +0200</pubDate>
  </item>
  <item>
    <title></title>
    <link>https://librairie.ademe.fr/air/124-etude.html</link>
  </item>
  <item>
    <title>Sans lien</title>
  </item>
</channel></rss>"#;

    #[test]
    fn test_parse_items() {
        let articles = parse_rss(FEED, "Air");
        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.title, "Guide de la qualité de l'air");
        assert_eq!(first.theme, "Air");
        assert_eq!(first.link, "https://librairie.ademe.fr/air/123-guide.html");
        assert_eq!(first.description, "Un guide &amp; des conseils");
        assert_eq!(first.published, "Mon, 01 Sep 2025 10:00:00 +0200");

        let second = &articles[1];
        assert_eq!(second.title, UNTITLED);
        assert_eq!(second.description, NO_DESCRIPTION);
        assert_eq!(second.published, UNKNOWN_DATE);
    }

    #[test]
    fn test_unescape_entities() {
        assert_eq!(unescape_entities("&#233;t&#xE9; &lt;3 &bogus;"), "été <3 &bogus;");
    }

    #[test]
    fn test_default_feeds() {
        let feeds = default_feeds();
        assert_eq!(feeds.len(), 13);
        assert!(feeds["Air"].ends_with("3145-thematique-air.xml"));
    }
}
