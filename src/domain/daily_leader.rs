use serde::{Deserialize, Serialize};

/// Daily Leaders Store row (spec §6 "optional enrichment"): one player's
/// box score for one scoring period, keyed by
/// `(league_id, season_id, scoring_period_id, player_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLeader {
    pub league_id: String,
    pub season_id: String,
    pub scoring_period_id: i64,
    pub period_date: String,
    pub player_id: i64,
    pub player_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pro_team_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fantasy_points: Option<f64>,
    pub stats: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ownership_percent: Option<f64>,
}
