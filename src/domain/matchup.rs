use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchupStatus {
    InProgress,
    Completed,
}

/// Matchup (spec §3.1): fantasy points, never NBA game scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub my_score: f64,
    pub opponent_score: f64,
    pub differential: f64,
    pub status: MatchupStatus,
    pub scoring_period: i64,
}

impl Matchup {
    /// Construct a matchup, enforcing the invariant from spec §3.2:
    /// `differential == myScore - opponentScore`.
    pub fn new(
        my_score: f64,
        opponent_score: f64,
        status: MatchupStatus,
        scoring_period: i64,
    ) -> Self {
        Self {
            my_score,
            opponent_score,
            differential: my_score - opponent_score,
            status,
            scoring_period,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn differential_invariant_holds() {
        let m = Matchup::new(120.5, 98.25, MatchupStatus::InProgress, 7);
        assert_eq!(m.differential, m.my_score - m.opponent_score);
    }
}
