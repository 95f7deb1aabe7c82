use serde::{Deserialize, Serialize};

use super::player::ConfidenceTier;

/// Drop Score (spec §3.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropScore {
    pub player_id: i64,
    pub player_name: String,
    pub score: f64,
    pub games_remaining: u32,
    pub projected_window_fpts: f64,
    pub reasons: Vec<String>,
}

/// Stream Score (spec §3.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamScore {
    pub player_id: i64,
    pub player_name: String,
    pub score: f64,
    pub games_remaining: u32,
    pub game_dates: Vec<String>,
    pub projected_window_fpts: f64,
    pub confidence: ConfidenceTier,
}

/// A single day's slot assignment, produced by `buildDailyLineup` (spec §4.3.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub date: String,
    pub slots_used: Vec<String>,
}

/// Simulate Move Result (spec §3.1 / §4.3.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulateMoveResult {
    pub is_legal: bool,
    pub drop_id: i64,
    pub drop_name: String,
    pub add_id: i64,
    pub add_name: String,
    pub baseline_window_fpts: f64,
    pub projected_window_fpts: f64,
    pub net_gain: f64,
    pub daily_breakdown: Vec<SlotAssignment>,
    pub confidence: ConfidenceTier,
    pub warnings: Vec<String>,
}

/// Move Recommendation (spec §3.1): the ranked, user-facing projection of a
/// `SimulateMoveResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecommendation {
    pub rank: u32,
    pub drop_player_name: String,
    pub add_player_name: String,
    pub drop_score: f64,
    pub stream_score: f64,
    pub baseline_window_fpts: f64,
    pub projected_window_fpts: f64,
    pub net_gain: f64,
    pub confidence: ConfidenceTier,
    pub warnings: Vec<String>,
}

/// Round to the nearest 0.1, matching spec §3.2's rounding rule for
/// `netGain`.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_to_tenth_basic() {
        assert_eq!(round_to_tenth(1.24), 1.2);
        assert_eq!(round_to_tenth(1.25), 1.3);
        assert_eq!(round_to_tenth(-0.05), -0.1);
    }
}
