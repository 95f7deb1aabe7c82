use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::player::Player;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

/// Team (spec §3.1): `id` unique within a League.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub abbrev: String,
    pub manager: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<TeamRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roster: Option<Vec<Player>>,
}

/// Roster slot labels accepted in `League.roster_slots` (spec §3.1).
pub const VALID_ROSTER_SLOT_LABELS: &[&str] = &[
    "PG", "SG", "SF", "PF", "C", "G", "F", "GF", "FC", "UTIL", "BE", "IR",
];

/// League (spec §3.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: String,
    pub season_id: String,
    pub name: String,
    pub scoring_settings: HashMap<String, f64>,
    pub roster_slots: HashMap<String, u32>,
    pub teams: Vec<Team>,
}

impl League {
    /// Locate a team within the league by stringified id (spec §4.5 step 2).
    pub fn find_team(&self, team_id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == team_id)
    }
}
