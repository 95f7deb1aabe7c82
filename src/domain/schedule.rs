use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// NBA Game (spec §3.1): unique by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NbaGame {
    pub id: String,
    pub date: DateTime<Utc>,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub season_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring_period_id: Option<i64>,
}

impl NbaGame {
    pub fn involves(&self, pro_team_id: i64) -> bool {
        self.home_team_id == pro_team_id || self.away_team_id == pro_team_id
    }

    /// Date key in `YYYY-MM-DD` form (spec §4.3: "date keys are YYYY-MM-DD").
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}
