//! Optimizer Engine (spec §4.3 / C4): a pure, deterministic math kernel.
//! No I/O occurs in this module — schedules are passed in by reference,
//! pre-loaded exactly once per run (spec §9 "Optimizer determinism under
//! concurrency").

pub mod graph;
pub mod lineup;
pub mod scoring;
pub mod simulate;
pub mod slots;
pub mod window;

pub use graph::{build_ranked_moves, template_recommendation};
pub use lineup::{build_daily_lineup, validate_lineup_legality, LineupAssignment, LineupLegalityResult};
pub use scoring::{games_remaining, score_dropping_candidate, score_streaming_candidate};
pub use simulate::simulate_move;
pub use slots::{can_fill_slot, SLOT_HIERARCHY, STARTING_SLOT_ORDER};
pub use window::Window;

/// Default league-average fpts fallback when fewer than 3 roster players
/// have a positive average (spec §4.4 step 2).
pub const DEFAULT_LEAGUE_AVG_FPTS: f64 = 25.0;

/// Mean of positive roster averages, falling back to
/// [`DEFAULT_LEAGUE_AVG_FPTS`] when fewer than three qualify (spec §4.4).
pub fn league_avg_fpts(roster: &[crate::domain::Player]) -> f64 {
    let positives: Vec<f64> = roster
        .iter()
        .map(|p| p.avg_fpts)
        .filter(|v| *v > 0.0)
        .collect();
    if positives.len() < 3 {
        return DEFAULT_LEAGUE_AVG_FPTS;
    }
    positives.iter().sum::<f64>() / positives.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InjuryStatus, Player};

    fn player(fpts: f64) -> Player {
        Player {
            player_id: 1,
            player_name: "P".to_string(),
            position: "PG".to_string(),
            eligible_slots: vec!["PG".to_string()],
            pro_team_id: 1,
            injury_status: InjuryStatus::Active,
            avg_fpts: fpts,
            total_fpts: fpts * 10.0,
            games_played: 10,
        }
    }

    #[test]
    fn league_avg_falls_back_with_fewer_than_three_players() {
        let roster = vec![player(40.0), player(20.0)];
        assert_eq!(league_avg_fpts(&roster), DEFAULT_LEAGUE_AVG_FPTS);
    }

    #[test]
    fn league_avg_is_mean_of_positive_averages() {
        let roster = vec![player(30.0), player(20.0), player(10.0)];
        assert_eq!(league_avg_fpts(&roster), 20.0);
    }

    #[test]
    fn league_avg_ignores_non_positive_averages() {
        let roster = vec![player(30.0), player(0.0), player(20.0), player(10.0)];
        assert_eq!(league_avg_fpts(&roster), 20.0);
    }
}
