use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::matchup::Matchup;
use super::player::{FreeAgent, Player};
use super::schedule::NbaGame;
use super::team::{League, Team};

/// Schedule density for a single roster player over the lookahead window
/// (spec §4.5 step 6): games in `[today00:00, today+6d 23:59:59]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDensity {
    pub player_id: i64,
    pub games_remaining: u32,
}

/// Intelligence Snapshot (spec §3.1): immutable composition, created per
/// `(leagueId, teamId)` query and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelligenceSnapshot {
    pub league: League,
    pub my_team: Team,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent: Option<Team>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matchup: Option<Matchup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<ScheduleDensity>>,
    pub free_agents: Vec<FreeAgent>,
    pub transactions: Vec<String>,
    pub built_at: DateTime<Utc>,
}

impl IntelligenceSnapshot {
    pub fn my_roster(&self) -> &[Player] {
        self.my_team.roster.as_deref().unwrap_or(&[])
    }
}
