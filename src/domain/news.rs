use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FanViseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Injury,
    Trade,
    Lineup,
    Performance,
    Other,
}

/// News Item (spec §3.1). `url` is unique; `embedding` dimensionality is
/// fixed per deployment (spec §3.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub source_trust_level: u8,
    pub embedding: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    pub sentiment: Sentiment,
    pub category: Category,
    pub is_injury_report: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injury_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_return_date: Option<String>,
    pub impacted_player_ids: Vec<String>,
}

impl NewsItem {
    /// Validate embedding dimension against the deployment-pinned width
    /// (spec §3.2: "mismatched dimensionality fails ingestion loudly").
    pub fn validate_embedding_dimension(&self, expected: usize) -> Result<(), FanViseError> {
        if self.embedding.len() != expected {
            Err(FanViseError::EmbeddingDimensionMismatch {
                expected,
                got: self.embedding.len(),
            })
        } else {
            Ok(())
        }
    }
}

/// Player Status Snapshot (spec §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStatusSnapshot {
    pub player_id: String,
    pub player_name: String,
    pub pro_team_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fantasy_team_id: Option<String>,
    pub injured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injury_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injury_type: Option<String>,
    pub out_for_season: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_return_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_news_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub droppable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineup_locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_locked: Option<bool>,
    pub last_synced_at: DateTime<Utc>,
}
