use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::{InjuryStatus, Player};

use super::slots::{can_fill_slot, STARTING_SLOT_ORDER};

/// A single player assigned to a single starting slot, produced by
/// `buildDailyLineup` (spec §4.3.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupAssignment {
    pub slot: String,
    pub player_id: i64,
    pub player_name: String,
}

/// buildDailyLineup (spec §4.3.3). `roster_slots` maps slot label to its
/// starting-lineup count; `playing_pro_team_ids` are the pro teams with a
/// game on `game_date`.
pub fn build_daily_lineup(
    roster: &[Player],
    roster_slots: &HashMap<String, u32>,
    playing_pro_team_ids: &HashSet<i64>,
) -> Vec<LineupAssignment> {
    let mut eligible: Vec<&Player> = roster
        .iter()
        .filter(|p| playing_pro_team_ids.contains(&p.pro_team_id))
        .filter(|p| !matches!(p.injury_status, InjuryStatus::Out | InjuryStatus::Ir))
        .collect();
    eligible.sort_by(|a, b| {
        b.avg_fpts
            .partial_cmp(&a.avg_fpts)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut assigned: HashSet<i64> = HashSet::new();
    let mut out = Vec::new();

    for slot in STARTING_SLOT_ORDER {
        let count = roster_slots.get(*slot).copied().unwrap_or(0);
        let mut filled = 0;
        for p in eligible.iter() {
            if filled >= count {
                break;
            }
            if assigned.contains(&p.player_id) {
                continue;
            }
            if can_fill_slot(&p.eligible_slots, slot) {
                assigned.insert(p.player_id);
                out.push(LineupAssignment {
                    slot: slot.to_string(),
                    player_id: p.player_id,
                    player_name: p.player_name.clone(),
                });
                filled += 1;
            }
        }
    }

    let bench_count = roster_slots.get("BE").copied().unwrap_or(0);
    let mut benched = 0;
    for p in eligible.iter() {
        if benched >= bench_count {
            break;
        }
        if assigned.contains(&p.player_id) {
            continue;
        }
        assigned.insert(p.player_id);
        out.push(LineupAssignment {
            slot: "BE".to_string(),
            player_id: p.player_id,
            player_name: p.player_name.clone(),
        });
        benched += 1;
    }

    out
}

/// validateLineupLegality (spec §4.3.4) result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupLegalityResult {
    pub is_legal: bool,
    pub unfilled_starting_slots: Vec<String>,
    pub benched_with_games: Vec<LineupAssignment>,
    pub warnings: Vec<String>,
}

/// validateLineupLegality (spec §4.3.4). `playing_player_ids` restricts the
/// same greedy assignment to players actually playing that day.
pub fn validate_lineup_legality(
    roster: &[Player],
    roster_slots: &HashMap<String, u32>,
    playing_player_ids: &HashSet<i64>,
) -> LineupLegalityResult {
    let playing_teams: HashSet<i64> = roster
        .iter()
        .filter(|p| playing_player_ids.contains(&p.player_id))
        .map(|p| p.pro_team_id)
        .collect();
    let restricted_roster: Vec<Player> = roster
        .iter()
        .filter(|p| playing_player_ids.contains(&p.player_id))
        .cloned()
        .collect();

    let assignments = build_daily_lineup(&restricted_roster, roster_slots, &playing_teams);
    let assigned_ids: HashSet<i64> = assignments.iter().map(|a| a.player_id).collect();

    let mut unfilled = Vec::new();
    for slot in STARTING_SLOT_ORDER {
        let count = roster_slots.get(*slot).copied().unwrap_or(0);
        let filled = assignments.iter().filter(|a| a.slot == *slot).count() as u32;
        if filled < count {
            unfilled.push(slot.to_string());
        }
    }

    let benched_with_games: Vec<LineupAssignment> = restricted_roster
        .iter()
        .filter(|p| !assigned_ids.contains(&p.player_id))
        .map(|p| LineupAssignment {
            slot: "BE".to_string(),
            player_id: p.player_id,
            player_name: p.player_name.clone(),
        })
        .collect();

    let mut warnings = Vec::new();
    if !unfilled.is_empty() {
        warnings.push(format!(
            "unfilled starting slots: {}",
            unfilled.join(", ")
        ));
    }
    if !benched_with_games.is_empty() {
        warnings.push(format!(
            "{} playing player(s) could not be started",
            benched_with_games.len()
        ));
    }

    LineupLegalityResult {
        is_legal: unfilled.is_empty(),
        unfilled_starting_slots: unfilled,
        benched_with_games,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: i64, name: &str, team: i64, slots: &[&str], fpts: f64) -> Player {
        Player {
            player_id: id,
            player_name: name.to_string(),
            position: slots[0].to_string(),
            eligible_slots: slots.iter().map(|s| s.to_string()).collect(),
            pro_team_id: team,
            injury_status: InjuryStatus::Active,
            avg_fpts: fpts,
            total_fpts: fpts * 10.0,
            games_played: 10,
        }
    }

    fn standard_slots() -> HashMap<String, u32> {
        let mut m = HashMap::new();
        for s in ["PG", "SG", "SF", "PF", "C"] {
            m.insert(s.to_string(), 1);
        }
        m.insert("UTIL".to_string(), 1);
        m.insert("BE".to_string(), 3);
        m
    }

    #[test]
    fn fills_specific_slots_before_flex() {
        let roster = vec![
            player(1, "Point Guard", 10, &["PG", "G"], 30.0),
            player(2, "Shooting Guard", 10, &["SG", "G"], 25.0),
            player(3, "Small Forward", 10, &["SF", "F"], 20.0),
            player(4, "Power Forward", 10, &["PF", "F"], 18.0),
            player(5, "Center", 10, &["C"], 22.0),
        ];
        let playing: HashSet<i64> = [10].into_iter().collect();
        let out = build_daily_lineup(&roster, &standard_slots(), &playing);
        assert_eq!(out.len(), 5);
        assert!(out.iter().any(|a| a.slot == "PG" && a.player_id == 1));
        assert!(out.iter().any(|a| a.slot == "UTIL"));
    }

    #[test]
    fn empty_roster_returns_empty_lineup() {
        let out = build_daily_lineup(&[], &standard_slots(), &HashSet::new());
        assert!(out.is_empty());
    }

    #[test]
    fn empty_roster_with_required_slots_is_illegal() {
        let result = validate_lineup_legality(&[], &standard_slots(), &HashSet::new());
        assert!(!result.is_legal);
        assert!(!result.unfilled_starting_slots.is_empty());
    }

    #[test]
    fn legal_lineup_has_no_unfilled_slots_or_warnings() {
        let roster = vec![
            player(1, "Point Guard", 10, &["PG", "G"], 30.0),
            player(2, "Shooting Guard", 10, &["SG", "G"], 25.0),
            player(3, "Small Forward", 10, &["SF", "F"], 20.0),
            player(4, "Power Forward", 10, &["PF", "F"], 18.0),
            player(5, "Center", 10, &["C"], 22.0),
            player(6, "Sixth Man", 10, &["SG", "G"], 15.0),
        ];
        let playing: HashSet<i64> = roster.iter().map(|p| p.player_id).collect();
        let result = validate_lineup_legality(&roster, &standard_slots(), &playing);
        assert!(result.is_legal);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn benched_player_with_a_game_is_flagged() {
        let roster = vec![
            player(1, "PG1", 10, &["PG", "G"], 30.0),
            player(2, "PG2", 10, &["PG", "G"], 28.0),
        ];
        let playing: HashSet<i64> = roster.iter().map(|p| p.player_id).collect();
        let mut slots = HashMap::new();
        slots.insert("PG".to_string(), 1);
        let result = validate_lineup_legality(&roster, &slots, &playing);
        assert_eq!(result.benched_with_games.len(), 1);
        assert_eq!(result.benched_with_games[0].player_id, 2);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn out_players_are_excluded_from_assignment() {
        let mut injured = player(1, "Hurt Guard", 10, &["PG", "G"], 35.0);
        injured.injury_status = InjuryStatus::Out;
        let healthy = player(2, "Healthy Guard", 10, &["PG", "G"], 20.0);
        let roster = vec![injured, healthy];
        let playing: HashSet<i64> = [10].into_iter().collect();
        let out = build_daily_lineup(&roster, &standard_slots(), &playing);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].player_id, 2);
    }
}
