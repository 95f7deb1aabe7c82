//! Optimizer Graph (spec §4.4 / C9): the deterministic pipeline that runs
//! the C4 scoring/simulation kernel end-to-end and produces ranked moves.
//! The single optional LLM call mentioned in the spec lives one layer up,
//! in the agent orchestrator — this module stays pure and synchronous.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{FreeAgent, MoveRecommendation, NbaGame, Player};

use super::scoring::{score_dropping_candidate, score_streaming_candidate};
use super::simulate::simulate_move;
use super::slots::can_fill_slot;
use super::window::Window;
use super::{league_avg_fpts, DEFAULT_LEAGUE_AVG_FPTS};

const MAX_DROP_CANDIDATES: usize = 5;
const MAX_STREAM_CANDIDATES: usize = 10;
const TOP_N_MOVES: usize = 3;

fn share_a_slot(a: &[String], b: &[String]) -> bool {
    a.iter().any(|s| b.contains(s))
        || (can_fill_slot(a, "UTIL") && can_fill_slot(b, "UTIL"))
}

/// Build the ranked-moves list for `(roster, free_agents)` over `window`
/// (spec §4.4 steps 2-8). Pure and deterministic given `games`.
pub fn build_ranked_moves(
    roster: &[Player],
    roster_slots: &HashMap<String, u32>,
    free_agents: &[FreeAgent],
    now: DateTime<Utc>,
    games: &[NbaGame],
) -> Vec<MoveRecommendation> {
    let window = Window::default_from(now);
    let league_avg = {
        let avg = league_avg_fpts(roster);
        if avg <= 0.0 {
            DEFAULT_LEAGUE_AVG_FPTS
        } else {
            avg
        }
    };

    let mut drops: Vec<_> = roster
        .iter()
        .map(|p| (p, score_dropping_candidate(p, &window, league_avg, games)))
        .collect();
    drops.sort_by(|a, b| b.1.score.partial_cmp(&a.1.score).unwrap_or(Ordering::Equal));

    let mut streams: Vec<_> = free_agents
        .iter()
        .map(|fa| (fa, score_streaming_candidate(fa, &window, games)))
        .collect();
    streams.sort_by(|a, b| b.1.score.partial_cmp(&a.1.score).unwrap_or(Ordering::Equal));

    let drop_k = drops.len().min(MAX_DROP_CANDIDATES);
    let stream_k = streams.len().min(MAX_STREAM_CANDIDATES);

    let mut simulated = Vec::new();
    for (drop_player, drop_score) in drops.iter().take(drop_k) {
        for (add_fa, stream_score) in streams.iter().take(stream_k) {
            if !share_a_slot(&drop_player.eligible_slots, &add_fa.eligible_slots) {
                continue;
            }
            let sim = simulate_move(drop_player, add_fa, roster, roster_slots, &window, games);
            simulated.push((
                sim,
                drop_score.score,
                stream_score.score,
                add_fa.avg_fpts,
                add_fa.percent_owned,
            ));
        }
    }

    let any_legal = simulated.iter().any(|(sim, ..)| sim.is_legal);
    let mut candidates: Vec<_> = if any_legal {
        simulated.into_iter().filter(|(sim, ..)| sim.is_legal).collect()
    } else {
        simulated
    };

    // Sort by netGain desc, tie-break by add.avgFpts desc then add.percentOwned asc.
    candidates.sort_by(|a, b| {
        b.0.net_gain
            .partial_cmp(&a.0.net_gain)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.3.partial_cmp(&a.3).unwrap_or(Ordering::Equal))
            .then_with(|| a.4.partial_cmp(&b.4).unwrap_or(Ordering::Equal))
    });

    candidates
        .into_iter()
        .take(TOP_N_MOVES)
        .enumerate()
        .map(|(i, (sim, drop_score, stream_score, _, _))| MoveRecommendation {
            rank: i as u32 + 1,
            drop_player_name: sim.drop_name,
            add_player_name: sim.add_name,
            drop_score,
            stream_score,
            baseline_window_fpts: sim.baseline_window_fpts,
            projected_window_fpts: sim.projected_window_fpts,
            net_gain: sim.net_gain,
            confidence: sim.confidence,
            warnings: sim.warnings,
        })
        .collect()
}

/// Templated fallback narrative used when the optional LLM call fails or
/// is skipped (spec §4.4 step 9).
pub fn template_recommendation(ranked: &[MoveRecommendation]) -> String {
    if ranked.is_empty() {
        return "No legal moves available in the current window.".to_string();
    }
    let top = &ranked[0];
    format!(
        "Drop {} for {} — projected net gain of {:.1} fantasy points over the current window.",
        top.drop_player_name, top.add_player_name, top.net_gain
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InjuryStatus;
    use chrono::TimeZone;

    fn roster_player(id: i64, name: &str, team: i64, fpts: f64, games_played: u32) -> Player {
        Player {
            player_id: id,
            player_name: name.to_string(),
            position: "PG".to_string(),
            eligible_slots: vec!["PG".to_string(), "G".to_string()],
            pro_team_id: team,
            injury_status: InjuryStatus::Active,
            avg_fpts: fpts,
            total_fpts: fpts * games_played as f64,
            games_played,
        }
    }

    fn free_agent(id: i64, name: &str, team: i64, fpts: f64, owned: f64) -> FreeAgent {
        FreeAgent {
            player_id: id,
            player_name: name.to_string(),
            position: "PG".to_string(),
            eligible_slots: vec!["PG".to_string(), "G".to_string()],
            pro_team_id: team,
            injury_status: InjuryStatus::Active,
            avg_fpts: fpts,
            games_played: 10,
            percent_owned: owned,
            schedule: None,
        }
    }

    fn slots() -> HashMap<String, u32> {
        let mut m = HashMap::new();
        m.insert("PG".to_string(), 1);
        m.insert("BE".to_string(), 3);
        m
    }

    #[test]
    fn illegal_top_pair_is_skipped_for_legal_runner_up() {
        // A corrupt free-agent record carries a slot *label* ("G") instead of a
        // real position in `eligible_slots`, which literally overlaps the
        // drop candidate's own label-carrying entry but satisfies no real
        // starting slot in the hierarchy — simulateMove marks it illegal.
        let mut drop_a = roster_player(1, "A", 50, 10.0, 10);
        drop_a.eligible_slots = vec!["PG".to_string(), "G".to_string()];
        let roster = vec![drop_a.clone()];
        let mut illegal_fa = free_agent(2, "Illegal", 60, 40.0, 1.0);
        illegal_fa.eligible_slots = vec!["G".to_string()];
        let legal_fa = free_agent(3, "Legal", 60, 20.0, 5.0);
        let now = Utc.with_ymd_and_hms(2026, 7, 27, 10, 0, 0).unwrap();
        let games = vec![NbaGame {
            id: "g1".to_string(),
            date: Utc.with_ymd_and_hms(2026, 7, 28, 19, 0, 0).unwrap(),
            home_team_id: 60,
            away_team_id: 70,
            season_id: "2026".to_string(),
            scoring_period_id: None,
        }];
        let ranked = build_ranked_moves(
            &roster,
            &slots(),
            &[illegal_fa, legal_fa],
            now,
            &games,
        );
        assert!(!ranked.is_empty());
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].add_player_name, "Legal");
    }

    #[test]
    fn empty_free_agent_pool_yields_no_moves() {
        let roster = vec![roster_player(1, "A", 50, 10.0, 10)];
        let now = Utc.with_ymd_and_hms(2026, 7, 27, 10, 0, 0).unwrap();
        let ranked = build_ranked_moves(&roster, &slots(), &[], now, &[]);
        assert!(ranked.is_empty());
        assert_eq!(
            template_recommendation(&ranked),
            "No legal moves available in the current window."
        );
    }

    #[test]
    fn ranked_moves_sorted_by_net_gain_descending() {
        let roster = vec![roster_player(1, "A", 50, 10.0, 10)];
        let fa_low = free_agent(2, "Low", 60, 12.0, 5.0);
        let fa_high = free_agent(3, "High", 60, 28.0, 5.0);
        let now = Utc.with_ymd_and_hms(2026, 7, 27, 10, 0, 0).unwrap();
        let games = vec![NbaGame {
            id: "g1".to_string(),
            date: Utc.with_ymd_and_hms(2026, 7, 28, 19, 0, 0).unwrap(),
            home_team_id: 60,
            away_team_id: 70,
            season_id: "2026".to_string(),
            scoring_period_id: None,
        }];
        let ranked = build_ranked_moves(&roster, &slots(), &[fa_low, fa_high], now, &games);
        assert_eq!(ranked[0].add_player_name, "High");
    }
}
