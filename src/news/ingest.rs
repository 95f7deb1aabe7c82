//! News/Status Pipeline (spec §4.7 / C11): RSS ingestion, semantic search,
//! player-scoped live refresh, and the scheduled status-snapshot job.
//! Grounded on the teacher's `Arc<..>`-held-service idiom (see
//! `snapshot_builder::SnapshotBuilder`) and the bounded-concurrency pattern
//! named in spec §5 ("ingestion fans out with a bounded parallelism of 5").

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::agent::llm::LlmProvider;
use crate::config::{EmbeddingConfig, NewsConfig};
use crate::domain::{Category, NewsItem, PlayerStatusSnapshot};
use crate::error::{FanViseError, Result};
use crate::espn::EspnClient;
use crate::store::Store;

use super::embedding::{self, EmbeddingProvider};
use super::extract::{self, ExtractedFields};
use super::feed::{self, FeedConfig, RawFeedItem};

/// Ties feeds, the LLM extractor, the embedding provider and the News/Status
/// Store together (spec §4.7).
pub struct NewsPipeline {
    http: Client,
    store: Arc<Store>,
    espn: Arc<EspnClient>,
    llm: Arc<dyn LlmProvider>,
    embedder: Box<dyn EmbeddingProvider>,
    embedding_models: Vec<String>,
    embedding_dimension: usize,
    feeds: Vec<FeedConfig>,
    config: NewsConfig,
}

impl NewsPipeline {
    pub fn new(
        store: Arc<Store>,
        espn: Arc<EspnClient>,
        llm: Arc<dyn LlmProvider>,
        embedding_config: &EmbeddingConfig,
        feeds: Vec<FeedConfig>,
        config: NewsConfig,
    ) -> Self {
        Self {
            http: Client::new(),
            store,
            espn,
            llm,
            embedder: embedding::build_provider(embedding_config),
            embedding_models: embedding::fallback_models(embedding_config),
            embedding_dimension: embedding_config.dimension,
            feeds,
            config,
        }
    }

    /// Run a full ingestion pass over every configured feed (spec §4.7
    /// steps 1-6).
    #[instrument(skip(self))]
    pub async fn ingest_all(&self) -> Result<usize> {
        let raw_items = feed::fetch_all_feeds(&self.http, &self.feeds).await;
        self.ingest_items(raw_items).await
    }

    async fn ingest_items(&self, raw_items: Vec<RawFeedItem>) -> Result<usize> {
        let mut deduped = Vec::new();
        for item in raw_items {
            if self.store.get_news_item_by_url(&item.url).await?.is_some() {
                continue;
            }
            deduped.push(item);
        }

        let concurrency = self.config.ingest_concurrency.max(1);
        let results: Vec<Result<Option<NewsItem>>> = stream::iter(deduped)
            .map(|item| self.process_one(item))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut ingested = 0;
        for result in results {
            if let Some(news_item) = result? {
                self.store.upsert_news_item(&news_item).await?;
                ingested += 1;
            }
        }
        info!(ingested, "news ingestion pass complete");
        Ok(ingested)
    }

    /// Transient per-item failures (extraction, embedding provider) are
    /// logged and skip the item; an embedding-dimension mismatch is a
    /// programmer error (spec §3.2, §7) and propagates instead.
    async fn process_one(&self, item: RawFeedItem) -> Result<Option<NewsItem>> {
        let fields = match extract::extract(self.llm.as_ref(), &item).await {
            Ok(fields) => fields,
            Err(err) => {
                warn!(url = %item.url, %err, "extraction failed, skipping item");
                return Ok(None);
            }
        };

        let nba_keyword_matched = feed::matches_nba_keyword(&item.title, &item.summary);
        if matches!(fields.category, Category::Other) && !nba_keyword_matched {
            return Ok(None);
        }

        let embed_text = format!("{}\n{}", item.title, item.summary);
        let embedding = match embedding::embed_with_fallback(
            self.embedder.as_ref(),
            &self.embedding_models,
            &embed_text,
        )
        .await
        {
            Ok(vec) => vec,
            Err(err) => {
                warn!(url = %item.url, %err, "embedding failed, skipping item");
                return Ok(None);
            }
        };

        let news_item = build_news_item(item, fields, embedding);
        news_item.validate_embedding_dimension(self.embedding_dimension)?;
        Ok(Some(news_item))
    }

    /// `searchNews(query, limit, daysBack=14)` (spec §4.7 "Search").
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: i64, days_back: Option<i64>) -> Result<Vec<(NewsItem, f32)>> {
        let embedding = embedding::embed_with_fallback(
            self.embedder.as_ref(),
            &self.embedding_models,
            query,
        )
        .await?;
        self.store
            .match_news_documents(
                &embedding,
                self.config.match_threshold as f32,
                limit,
                days_back.unwrap_or(self.config.search_days_back),
            )
            .await
    }

    /// `fetchPlayerSpecificNews(name)` (spec §4.7 "Live player refresh"):
    /// strip diacritics, fuzzy-match every feed now, ingest new items.
    #[instrument(skip(self))]
    pub async fn fetch_player_specific_news(&self, player_name: &str) -> Result<Vec<NewsItem>> {
        let needle = normalize_name(player_name);
        let raw_items = feed::fetch_all_feeds(&self.http, &self.feeds).await;
        let matching: Vec<RawFeedItem> = raw_items
            .into_iter()
            .filter(|item| {
                normalize_name(&item.title).contains(&needle)
                    || normalize_name(&item.summary).contains(&needle)
            })
            .collect();

        let before = self.search(player_name, 50, None).await?;
        let before_urls: HashSet<String> = before.into_iter().map(|(n, _)| n.url).collect();

        self.ingest_items(matching.clone()).await?;

        let mut refreshed = Vec::new();
        for url in matching.iter().map(|i| &i.url) {
            if !before_urls.contains(url) {
                if let Some(item) = self.store.get_news_item_by_url(url).await? {
                    refreshed.push(item);
                }
            }
        }
        Ok(refreshed)
    }

    /// Scheduled status-snapshot job (spec §4.7 "Status snapshot"): fetch
    /// the league, collect up to 200 roster player IDs, fetch each card,
    /// upsert, throttling between calls to respect ESPN rate limits.
    #[instrument(skip(self))]
    pub async fn sync_status_snapshots(&self, league_id: &str) -> Result<usize> {
        let league = self
            .store
            .get_league(league_id)
            .await?
            .ok_or_else(|| FanViseError::LeagueNotFound(league_id.to_string()))?;

        let mut player_ids: Vec<i64> = league
            .teams
            .iter()
            .flat_map(|t| t.roster.iter().flatten())
            .map(|p| p.player_id)
            .collect();
        player_ids.sort_unstable();
        player_ids.dedup();
        player_ids.truncate(200);

        let throttle = Duration::from_millis(self.config.status_card_throttle_ms);
        let mut synced = 0;
        for (i, player_id) in player_ids.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(throttle).await;
            }
            match self.espn.fetch_player_card(*player_id).await {
                Ok(raw) => {
                    if let Some(snapshot) = parse_status_snapshot(&raw, *player_id) {
                        self.store.upsert_player_status_snapshot(&snapshot).await?;
                        synced += 1;
                    }
                }
                Err(err) => {
                    warn!(player_id, %err, "player card fetch failed, skipping");
                }
            }
        }
        info!(synced, league_id, "status snapshot sync complete");
        Ok(synced)
    }
}

fn build_news_item(item: RawFeedItem, fields: ExtractedFields, embedding: Vec<f32>) -> NewsItem {
    NewsItem {
        id: Uuid::new_v4().to_string(),
        url: item.url,
        title: item.title.clone(),
        content: item.summary.clone(),
        summary: item.summary,
        published_at: item.published_at,
        source: item.source,
        source_trust_level: item.trust_level,
        embedding,
        player_name: fields.player_name,
        sentiment: fields.sentiment,
        category: fields.category,
        is_injury_report: fields.is_injury_report,
        injury_status: fields.injury_status,
        expected_return_date: fields.expected_return_date,
        impacted_player_ids: fields.impacted_player_ids,
    }
}

/// Strip common Latin diacritics and lowercase, for fuzzy player-name
/// matching against feed text (spec §4.7 "strip diacritics"). Folds the
/// accented letters our ESPN/RSS sources actually emit rather than
/// pulling in a full Unicode normalization dependency for this one use.
fn normalize_name(name: &str) -> String {
    name.chars()
        .map(fold_diacritic)
        .collect::<String>()
        .to_lowercase()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ñ' | 'Ñ' => 'n',
        'ç' | 'Ç' => 'c',
        'ý' | 'ÿ' | 'Ý' => 'y',
        other => other,
    }
}

/// Parse one `kona_player_info` card response into a status snapshot row
/// (spec §4.7 "Status snapshot"). Returns `None` if the envelope is empty.
fn parse_status_snapshot(raw: &serde_json::Value, player_id: i64) -> Option<PlayerStatusSnapshot> {
    let player = raw
        .get("players")?
        .as_array()?
        .iter()
        .find_map(|entry| entry.get("player"))?;

    let name = player.get("fullName")?.as_str()?.to_string();
    let pro_team_id = player.get("proTeamId").and_then(|v| v.as_i64()).unwrap_or(0);
    let injury_status = player
        .get("injuryStatus")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    let injured = matches!(
        injury_status.as_deref(),
        Some("OUT") | Some("INJURY_RESERVE") | Some("DAY_TO_DAY") | Some("QUESTIONABLE") | Some("DOUBTFUL")
    );
    let out_for_season = injury_status.as_deref() == Some("INJURY_RESERVE");

    Some(PlayerStatusSnapshot {
        player_id: player_id.to_string(),
        player_name: name,
        pro_team_id,
        fantasy_team_id: None,
        injured,
        injury_status,
        injury_type: None,
        out_for_season,
        expected_return_date: None,
        last_news_date: None,
        droppable: None,
        lineup_locked: None,
        trade_locked: None,
        last_synced_at: chrono::Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_name_strips_diacritics_and_lowercases() {
        assert_eq!(normalize_name("Nikola Jokić"), "nikola jokic");
    }

    #[test]
    fn parse_status_snapshot_reads_injury_fields() {
        let raw = serde_json::json!({
            "players": [{
                "player": {
                    "fullName": "Test Player",
                    "proTeamId": 14,
                    "injuryStatus": "OUT"
                }
            }]
        });
        let snapshot = parse_status_snapshot(&raw, 42).expect("parses");
        assert_eq!(snapshot.player_name, "Test Player");
        assert!(snapshot.injured);
        assert!(!snapshot.out_for_season);
    }

    #[test]
    fn parse_status_snapshot_absent_without_players() {
        let raw = serde_json::json!({"players": []});
        assert!(parse_status_snapshot(&raw, 1).is_none());
    }
}
