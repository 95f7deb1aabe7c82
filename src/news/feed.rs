//! RSS feed configuration and fetching (spec §4.7 step 1-2). Grounded on
//! the reqwest-client idiom used throughout the ESPN/LLM clients; parsing
//! uses the `rss` crate already in the dependency stack.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use rss::Channel;
use tracing::warn;

use crate::error::{FanViseError, Result};

const FEED_TIMEOUT: Duration = Duration::from_secs(15);

/// One configured RSS source (spec §4.7: "for each configured RSS feed
/// `(source, url, trustLevel)`").
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub source: String,
    pub url: String,
    pub trust_level: u8,
    /// Whitelisted feeds skip the NBA-keyword early-reject (spec §4.7 step 2).
    pub whitelisted: bool,
}

/// A parsed feed entry before extraction/embedding.
#[derive(Debug, Clone)]
pub struct RawFeedItem {
    pub source: String,
    pub trust_level: u8,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

static NBA_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(nba|fantasy basketball|points guard|shooting guard|small forward|power forward|center|triple[- ]double|injury report|day[- ]to[- ]day|questionable|out for the season)\b",
    )
    .unwrap()
});

/// Early-reject by NBA keyword match against title+summary, unless the
/// feed is whitelisted (spec §4.7 step 2).
pub fn matches_nba_keyword(title: &str, summary: &str) -> bool {
    NBA_KEYWORD.is_match(title) || NBA_KEYWORD.is_match(summary)
}

pub async fn fetch_feed(http: &Client, feed: &FeedConfig) -> Result<Vec<RawFeedItem>> {
    let response = http
        .get(&feed.url)
        .timeout(FEED_TIMEOUT)
        .send()
        .await
        .map_err(|e| FanViseError::RssUnavailable(e.to_string()))?;
    if !response.status().is_success() {
        return Err(FanViseError::RssUnavailable(format!(
            "{}: status {}",
            feed.source,
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| FanViseError::RssUnavailable(e.to_string()))?;
    let channel = Channel::read_from(&bytes[..])
        .map_err(|e| FanViseError::RssUnavailable(format!("{}: {e}", feed.source)))?;

    let mut items = Vec::new();
    for item in channel.items() {
        let Some(link) = item.link() else { continue };
        let title = item.title().unwrap_or_default().to_string();
        let summary = item.description().unwrap_or_default().to_string();
        if !feed.whitelisted && !matches_nba_keyword(&title, &summary) {
            continue;
        }
        let published_at = item
            .pub_date()
            .and_then(|d| chrono::DateTime::parse_from_rfc2822(d).ok())
            .map(|d| d.with_timezone(&chrono::Utc))
            .unwrap_or_else(chrono::Utc::now);
        items.push(RawFeedItem {
            source: feed.source.clone(),
            trust_level: feed.trust_level,
            url: link.to_string(),
            title,
            summary,
            published_at,
        });
    }
    Ok(items)
}

/// Fetch all configured feeds, logging (not failing) individual feed
/// errors — one bad feed must not block the rest of the ingestion run.
pub async fn fetch_all_feeds(http: &Client, feeds: &[FeedConfig]) -> Vec<RawFeedItem> {
    let mut all = Vec::new();
    for feed in feeds {
        match fetch_feed(http, feed).await {
            Ok(mut items) => all.append(&mut items),
            Err(err) => warn!(source = %feed.source, %err, "feed fetch failed, skipping"),
        }
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nba_keyword_matches_injury_vocabulary() {
        assert!(matches_nba_keyword("Player ruled out, day-to-day", ""));
        assert!(matches_nba_keyword("", "NBA trade deadline approaches"));
        assert!(!matches_nba_keyword("Local weather forecast", "Rain expected tomorrow"));
    }
}
