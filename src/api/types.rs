//! HTTP request/response DTOs for the chat endpoint (spec §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Language;

/// One entry in the chat request's `messages` array (spec §6).
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessageDto {
    pub role: String,
    pub content: String,
}

/// Chat endpoint request body (spec §6): `{messages, activeTeamId?,
/// activeLeagueId?, teamName?, language}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatMessageDto>,
    #[serde(default)]
    pub active_team_id: Option<String>,
    #[serde(default)]
    pub active_league_id: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub db: String,
    pub uptime_secs: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// The `[[FV_MOVES:...]]` sentinel's decoded payload (spec §6), used by
/// tests and any consumer that wants to decode the stream server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovesSentinelPayload {
    pub moves: Vec<crate::domain::MoveRecommendation>,
    pub fetched_at: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}
