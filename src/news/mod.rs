//! News/Status Pipeline (spec §4.7 / C11): RSS ingestion, LLM-based
//! extraction, semantic search, player-scoped refresh, and the scheduled
//! player-status-snapshot job.

pub mod embedding;
pub mod extract;
pub mod feed;
pub mod ingest;

pub use feed::FeedConfig;
pub use ingest::NewsPipeline;

/// The default feed list; trust levels follow the source's editorial
/// reputation (spec §4.7: "recording `trustLevel` from the feed").
pub fn default_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig {
            source: "ESPN NBA".to_string(),
            url: "https://www.espn.com/espn/rss/nba/news".to_string(),
            trust_level: 9,
            whitelisted: true,
        },
        FeedConfig {
            source: "Rotowire NBA".to_string(),
            url: "https://www.rotowire.com/rss/news.php?sport=NBA".to_string(),
            trust_level: 8,
            whitelisted: true,
        },
        FeedConfig {
            source: "Yahoo Sports NBA".to_string(),
            url: "https://sports.yahoo.com/nba/rss/".to_string(),
            trust_level: 6,
            whitelisted: false,
        },
    ]
}
