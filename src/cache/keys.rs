//! Tenant-qualified cache key builders (spec §3.2, §4.5, §9). Every
//! per-league/per-team cache MUST construct its key through one of these
//! functions rather than formatting ad hoc — an unkeyed cache wrapper is a
//! critical bug regardless of call-site correctness at the time of writing.

/// League cache key (spec §4.5 step 1, TTL 60s).
pub fn league_key(league_id: &str) -> String {
    format!("league:{league_id}")
}

/// Matchup cache key (spec §4.5 step 3, TTL 45s): keyed on
/// `(leagueId, teamId, seasonId)`.
pub fn matchup_key(league_id: &str, team_id: &str, season_id: &str) -> String {
    format!("matchup:{league_id}:{team_id}:{season_id}")
}

/// Schedule density cache key (spec §4.5 step 6, TTL 6h): keyed on the
/// query range.
pub fn schedule_density_key(league_id: &str, team_id: &str, range_start: &str, range_end: &str) -> String {
    format!("schedule:{league_id}:{team_id}:{range_start}:{range_end}")
}

/// Free-agent pool cache key (spec §4.5 step 7, TTL 5m): keyed on league,
/// season, and both rosters' sorted player ids.
pub fn free_agents_key(
    league_id: &str,
    season_id: &str,
    my_roster_ids: &[i64],
    opponent_roster_ids: &[i64],
) -> String {
    let mut my_ids = my_roster_ids.to_vec();
    my_ids.sort_unstable();
    let mut opp_ids = opponent_roster_ids.to_vec();
    opp_ids.sort_unstable();
    format!(
        "free_agents:{league_id}:{season_id}:{}:{}",
        ids_csv(&my_ids),
        ids_csv(&opp_ids)
    )
}

fn ids_csv(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn league_keys_differ_across_tenants() {
        assert_ne!(league_key("L1"), league_key("L2"));
    }

    #[test]
    fn matchup_keys_differ_across_teams_in_same_league() {
        assert_ne!(
            matchup_key("L1", "T1", "2026"),
            matchup_key("L1", "T2", "2026")
        );
    }

    #[test]
    fn matchup_keys_differ_across_leagues_for_same_team() {
        assert_ne!(
            matchup_key("L1", "T1", "2026"),
            matchup_key("L2", "T1", "2026")
        );
    }

    #[test]
    fn free_agents_key_is_order_independent_for_roster_ids() {
        let a = free_agents_key("L1", "2026", &[3, 1, 2], &[9, 8]);
        let b = free_agents_key("L1", "2026", &[1, 2, 3], &[8, 9]);
        assert_eq!(a, b);
    }

    #[test]
    fn free_agents_key_differs_across_leagues() {
        let a = free_agents_key("L1", "2026", &[1, 2], &[3]);
        let b = free_agents_key("L2", "2026", &[1, 2], &[3]);
        assert_ne!(a, b);
    }
}
