use std::collections::{HashMap, HashSet};

use crate::domain::{round_to_tenth, FreeAgent, InjuryStatus, NbaGame, Player, SimulateMoveResult, SlotAssignment};

use super::lineup::build_daily_lineup;
use super::slots::can_fill_slot;
use super::window::Window;

fn starters_fpts(
    roster: &[Player],
    roster_slots: &HashMap<String, u32>,
    playing_pro_team_ids: &HashSet<i64>,
) -> (f64, Vec<String>) {
    let assignments = build_daily_lineup(roster, roster_slots, playing_pro_team_ids);
    let by_id: HashMap<i64, &Player> = roster.iter().map(|p| (p.player_id, p)).collect();
    let mut total = 0.0;
    let mut starting_slots_used = Vec::new();
    for a in &assignments {
        if a.slot == "BE" {
            continue;
        }
        if let Some(p) = by_id.get(&a.player_id) {
            total += p.avg_fpts;
        }
        starting_slots_used.push(a.slot.clone());
    }
    (total, starting_slots_used)
}

/// simulateMove (spec §4.3.5): project the net fantasy-point effect of
/// dropping `drop` for `add` across every game date in `window`.
pub fn simulate_move(
    drop: &Player,
    add: &FreeAgent,
    current_roster: &[Player],
    roster_slots: &HashMap<String, u32>,
    window: &Window,
    games: &[NbaGame],
) -> SimulateMoveResult {
    let mut dates: Vec<String> = games
        .iter()
        .filter(|g| window.contains(g.date))
        .map(|g| g.date_key())
        .collect();
    dates.sort();
    dates.dedup();

    let projected_add = add.as_newly_added_roster_player();
    let projected_roster: Vec<Player> = current_roster
        .iter()
        .filter(|p| p.player_id != drop.player_id)
        .cloned()
        .chain(std::iter::once(projected_add))
        .collect();

    let mut baseline_total = 0.0;
    let mut projected_total = 0.0;
    let mut daily_breakdown = Vec::new();

    for date_key in &dates {
        let playing_teams: HashSet<i64> = games
            .iter()
            .filter(|g| &g.date_key() == date_key)
            .flat_map(|g| [g.home_team_id, g.away_team_id])
            .collect();

        let (baseline_day, _) = starters_fpts(current_roster, roster_slots, &playing_teams);
        let (projected_day, projected_slots) =
            starters_fpts(&projected_roster, roster_slots, &playing_teams);

        baseline_total += baseline_day;
        projected_total += projected_day;

        if !projected_slots.is_empty() {
            daily_breakdown.push(SlotAssignment {
                date: date_key.clone(),
                slots_used: projected_slots,
            });
        }
    }

    let net_gain = round_to_tenth(projected_total - baseline_total);

    let is_legal = super::slots::STARTING_SLOT_ORDER
        .iter()
        .any(|slot| *slot != "BE" && *slot != "IR" && can_fill_slot(&add.eligible_slots, slot));

    let mut warnings = Vec::new();
    if matches!(add.injury_status, InjuryStatus::Dtd | InjuryStatus::Gtd) {
        warnings.push(format!(
            "{}'s availability is uncertain",
            add.player_name
        ));
    }
    if !is_legal {
        warnings.push(format!(
            "{} has no eligible starting slot on this roster",
            add.player_name
        ));
    }

    SimulateMoveResult {
        is_legal,
        drop_id: drop.player_id,
        drop_name: drop.player_name.clone(),
        add_id: add.player_id,
        add_name: add.player_name.clone(),
        baseline_window_fpts: baseline_total,
        projected_window_fpts: projected_total,
        net_gain,
        daily_breakdown,
        confidence: add.confidence_tier(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn roster_player(id: i64, name: &str, team: i64, fpts: f64) -> Player {
        Player {
            player_id: id,
            player_name: name.to_string(),
            position: "PG".to_string(),
            eligible_slots: vec!["PG".to_string(), "G".to_string()],
            pro_team_id: team,
            injury_status: InjuryStatus::Active,
            avg_fpts: fpts,
            total_fpts: fpts * 10.0,
            games_played: 10,
        }
    }

    fn free_agent(id: i64, name: &str, team: i64, fpts: f64) -> FreeAgent {
        FreeAgent {
            player_id: id,
            player_name: name.to_string(),
            position: "PG".to_string(),
            eligible_slots: vec!["PG".to_string(), "G".to_string()],
            pro_team_id: team,
            injury_status: InjuryStatus::Active,
            avg_fpts: fpts,
            games_played: 10,
            percent_owned: 10.0,
            schedule: None,
        }
    }

    fn slots() -> HashMap<String, u32> {
        let mut m = HashMap::new();
        m.insert("PG".to_string(), 1);
        m.insert("BE".to_string(), 2);
        m
    }

    fn window() -> Window {
        Window::new(
            Utc.with_ymd_and_hms(2026, 7, 27, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 8, 2, 23, 59, 59).unwrap(),
        )
    }

    #[test]
    fn net_gain_matches_optimizer_fast_path_scenario() {
        let drop = roster_player(1, "A", 50, 10.0);
        let roster = vec![drop.clone()];
        let add = free_agent(2, "B", 60, 25.0);
        let games = vec![
            NbaGame {
                id: "g1".to_string(),
                date: Utc.with_ymd_and_hms(2026, 7, 28, 19, 0, 0).unwrap(),
                home_team_id: 60,
                away_team_id: 70,
                season_id: "2026".to_string(),
                scoring_period_id: None,
            },
            NbaGame {
                id: "g2".to_string(),
                date: Utc.with_ymd_and_hms(2026, 7, 30, 19, 0, 0).unwrap(),
                home_team_id: 60,
                away_team_id: 71,
                season_id: "2026".to_string(),
                scoring_period_id: None,
            },
        ];
        let result = simulate_move(&drop, &add, &roster, &slots(), &window(), &games);
        assert!(result.net_gain > 0.0);
        assert_eq!(result.drop_name, "A");
        assert_eq!(result.add_name, "B");
        assert!(result.is_legal);
    }

    #[test]
    fn uncertain_add_gets_availability_warning() {
        let drop = roster_player(1, "A", 50, 10.0);
        let roster = vec![drop.clone()];
        let mut add = free_agent(2, "B", 60, 25.0);
        add.injury_status = InjuryStatus::Gtd;
        let result = simulate_move(&drop, &add, &roster, &slots(), &window(), &[]);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("availability is uncertain")));
    }

    #[test]
    fn add_with_no_eligible_slot_is_illegal() {
        let drop = roster_player(1, "A", 50, 10.0);
        let roster = vec![drop.clone()];
        let mut add = free_agent(2, "B", 60, 25.0);
        add.eligible_slots = vec!["IR".to_string()];
        let mut narrow_slots = HashMap::new();
        narrow_slots.insert("BE".to_string(), 2);
        let result = simulate_move(&drop, &add, &roster, &narrow_slots, &window(), &[]);
        assert!(!result.is_legal);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("no eligible starting slot")));
    }
}
