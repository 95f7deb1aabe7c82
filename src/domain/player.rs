use serde::{Deserialize, Serialize};

/// Injury status enum (spec §3.1 Player).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InjuryStatus {
    Active,
    Gtd,
    Dtd,
    Questionable,
    Out,
    Suspended,
    Ir,
}

impl InjuryStatus {
    /// Confidence-tier-relevant uncertainty flag (spec §4.3 Confidence tier).
    pub fn is_uncertain(&self) -> bool {
        matches!(self, Self::Dtd | Self::Gtd | Self::Questionable)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Out | Self::Ir)
    }
}

/// A roster player (spec §3.1 Player).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: i64,
    pub player_name: String,
    pub position: String,
    pub eligible_slots: Vec<String>,
    pub pro_team_id: i64,
    pub injury_status: InjuryStatus,
    pub avg_fpts: f64,
    pub total_fpts: f64,
    pub games_played: u32,
}

/// Alias used at optimizer call sites where "the roster player under
/// consideration" reads more naturally than `Player` (spec §4.3).
pub type RosterPlayer = Player;

impl Player {
    /// Confidence tier for any score derived from this player (spec §4.3
    /// "Confidence tier"): uncertain injury status always wins, otherwise
    /// graded by sample size.
    pub fn confidence_tier(&self) -> ConfidenceTier {
        if self.injury_status.is_uncertain() {
            return ConfidenceTier::Low;
        }
        if self.games_played >= 15 {
            ConfidenceTier::High
        } else if self.games_played >= 7 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

/// A free agent candidate (spec §3.1 Free Agent): a Player minus season
/// totals, plus ownership percentage and an optional schedule annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeAgent {
    pub player_id: i64,
    pub player_name: String,
    pub position: String,
    pub eligible_slots: Vec<String>,
    pub pro_team_id: i64,
    pub injury_status: InjuryStatus,
    pub avg_fpts: f64,
    pub games_played: u32,
    pub percent_owned: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<FreeAgentSchedule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeAgentSchedule {
    pub games_remaining: u32,
    pub games_remaining_dates: Vec<String>,
    pub stream_score: f64,
    pub confidence: ConfidenceTier,
}

impl FreeAgent {
    pub fn confidence_tier(&self) -> ConfidenceTier {
        if self.injury_status.is_uncertain() {
            return ConfidenceTier::Low;
        }
        if self.games_played >= 15 {
            ConfidenceTier::High
        } else if self.games_played >= 7 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    /// Synthesize a `Player` as it would look immediately after being added
    /// to a roster (spec §4.3.5 step 4: `totalFpts=0, gamesPlayed=0`).
    pub fn as_newly_added_roster_player(&self) -> Player {
        Player {
            player_id: self.player_id,
            player_name: self.player_name.clone(),
            position: self.position.clone(),
            eligible_slots: self.eligible_slots.clone(),
            pro_team_id: self.pro_team_id,
            injury_status: self.injury_status,
            avg_fpts: self.avg_fpts,
            total_fpts: 0.0,
            games_played: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_player() -> Player {
        Player {
            player_id: 1,
            player_name: "Test Player".to_string(),
            position: "PG".to_string(),
            eligible_slots: vec!["PG".to_string(), "G".to_string()],
            pro_team_id: 10,
            injury_status: InjuryStatus::Active,
            avg_fpts: 30.0,
            total_fpts: 300.0,
            games_played: 10,
        }
    }

    #[test]
    fn confidence_tier_uncertain_wins_regardless_of_sample_size() {
        let mut p = base_player();
        p.games_played = 50;
        p.injury_status = InjuryStatus::Gtd;
        assert_eq!(p.confidence_tier(), ConfidenceTier::Low);
    }

    #[test]
    fn confidence_tier_zero_games_is_low() {
        let mut p = base_player();
        p.games_played = 0;
        p.avg_fpts = 40.0;
        assert_eq!(p.confidence_tier(), ConfidenceTier::Low);
    }

    #[test]
    fn confidence_tier_high_sample() {
        let mut p = base_player();
        p.games_played = 20;
        assert_eq!(p.confidence_tier(), ConfidenceTier::High);
    }
}
