use crate::domain::{DropScore, FreeAgent, InjuryStatus, NbaGame, Player, StreamScore};

use super::window::Window;

/// Distinct game dates for `pro_team_id` within `window`, as `YYYY-MM-DD`
/// keys, sorted ascending.
pub fn games_remaining(pro_team_id: i64, window: &Window, games: &[NbaGame]) -> Vec<String> {
    let mut dates: Vec<String> = games
        .iter()
        .filter(|g| g.involves(pro_team_id) && window.contains(g.date))
        .map(|g| g.date_key())
        .collect();
    dates.sort();
    dates.dedup();
    dates
}

/// scoreDroppingCandidate (spec §4.3.1). Score accumulates penalties for a
/// roster player, clamped to `[0, 100]`.
pub fn score_dropping_candidate(
    player: &Player,
    window: &Window,
    league_avg_fpts: f64,
    games: &[NbaGame],
) -> DropScore {
    let dates = games_remaining(player.pro_team_id, window, games);
    let games_remaining_count = dates.len() as u32;
    let projected_window_fpts = player.avg_fpts * games_remaining_count as f64;

    let mut score = 0.0;
    let mut reasons = Vec::new();

    if player.avg_fpts < 0.6 * league_avg_fpts {
        score += 40.0;
        reasons.push("well below league avg".to_string());
    } else if player.avg_fpts < 0.8 * league_avg_fpts {
        score += 20.0;
        reasons.push("below league avg".to_string());
    }

    if games_remaining_count == 0 {
        score += 40.0;
        reasons.push("No games remaining".to_string());
    } else if games_remaining_count == 1 {
        score += 20.0;
        reasons.push("Only 1 game remaining".to_string());
    }

    if player.injury_status == InjuryStatus::Out {
        score += 30.0;
        reasons.push("Currently OUT".to_string());
    } else if matches!(
        player.injury_status,
        InjuryStatus::Dtd | InjuryStatus::Gtd | InjuryStatus::Questionable
    ) {
        score += 15.0;
        reasons.push("Injury uncertainty".to_string());
    }

    if player.games_played < 5 {
        score += 10.0;
        reasons.push("Low sample size".to_string());
    }

    DropScore {
        player_id: player.player_id,
        player_name: player.player_name.clone(),
        score: score.clamp(0.0, 100.0),
        games_remaining: games_remaining_count,
        projected_window_fpts,
        reasons,
    }
}

const STREAM_MAX_SCORE: f64 = 3.0 * 30.0;

/// scoreStreamingCandidate (spec §4.3.2).
pub fn score_streaming_candidate(
    fa: &FreeAgent,
    window: &Window,
    games: &[NbaGame],
) -> StreamScore {
    let dates = games_remaining(fa.pro_team_id, window, games);
    let games_remaining_count = dates.len() as u32;
    let projected_window_fpts = fa.avg_fpts * games_remaining_count as f64;
    let score = (projected_window_fpts.min(STREAM_MAX_SCORE) / STREAM_MAX_SCORE * 100.0).round();

    StreamScore {
        player_id: fa.player_id,
        player_name: fa.player_name.clone(),
        score,
        games_remaining: games_remaining_count,
        game_dates: dates,
        projected_window_fpts,
        confidence: fa.confidence_tier(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn game(pro_team_id: i64, date: chrono::DateTime<Utc>) -> NbaGame {
        NbaGame {
            id: format!("g-{pro_team_id}-{date}"),
            date,
            home_team_id: pro_team_id,
            away_team_id: 999,
            season_id: "2026".to_string(),
            scoring_period_id: None,
        }
    }

    fn window() -> Window {
        Window::new(
            Utc.with_ymd_and_hms(2026, 7, 27, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 8, 2, 23, 59, 59).unwrap(),
        )
    }

    #[test]
    fn drop_score_ceiling_scenario() {
        let player = Player {
            player_id: 1,
            player_name: "Benchwarmer".to_string(),
            position: "C".to_string(),
            eligible_slots: vec!["C".to_string()],
            pro_team_id: 55,
            injury_status: InjuryStatus::Out,
            avg_fpts: 5.0,
            total_fpts: 10.0,
            games_played: 2,
        };
        let games: Vec<NbaGame> = Vec::new();
        let result = score_dropping_candidate(&player, &window(), 30.0, &games);
        assert!(result.score >= 70.0 && result.score <= 100.0);
        assert_eq!(result.reasons.len(), 4);
    }

    #[test]
    fn score_clamped_to_100() {
        let player = Player {
            player_id: 2,
            player_name: "Worst Case".to_string(),
            position: "PG".to_string(),
            eligible_slots: vec!["PG".to_string()],
            pro_team_id: 1,
            injury_status: InjuryStatus::Out,
            avg_fpts: 0.0,
            total_fpts: 0.0,
            games_played: 0,
        };
        let games: Vec<NbaGame> = Vec::new();
        let result = score_dropping_candidate(&player, &window(), 30.0, &games);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn stream_score_zero_when_no_games_remaining() {
        let fa = FreeAgent {
            player_id: 3,
            player_name: "Dormant".to_string(),
            position: "SF".to_string(),
            eligible_slots: vec!["SF".to_string()],
            pro_team_id: 1,
            injury_status: InjuryStatus::Active,
            avg_fpts: 20.0,
            games_played: 10,
            percent_owned: 4.0,
            schedule: None,
        };
        let games: Vec<NbaGame> = Vec::new();
        let result = score_streaming_candidate(&fa, &window(), &games);
        assert_eq!(result.games_remaining, 0);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn stream_score_normalized_against_max() {
        let fa = FreeAgent {
            player_id: 4,
            player_name: "Hot Streak".to_string(),
            position: "PF".to_string(),
            eligible_slots: vec!["PF".to_string()],
            pro_team_id: 10,
            injury_status: InjuryStatus::Active,
            avg_fpts: 30.0,
            games_played: 20,
            percent_owned: 2.0,
            schedule: None,
        };
        let games = vec![
            game(10, Utc.with_ymd_and_hms(2026, 7, 28, 19, 0, 0).unwrap()),
            game(10, Utc.with_ymd_and_hms(2026, 7, 30, 19, 0, 0).unwrap()),
            game(10, Utc.with_ymd_and_hms(2026, 8, 1, 19, 0, 0).unwrap()),
        ];
        let result = score_streaming_candidate(&fa, &window(), &games);
        assert_eq!(result.games_remaining, 3);
        assert_eq!(result.projected_window_fpts, 90.0);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.confidence, ConfidenceTier::High);
    }

    #[test]
    fn confidence_low_when_uncertain_regardless_of_sample_size() {
        let fa = FreeAgent {
            player_id: 5,
            player_name: "Iffy".to_string(),
            position: "PG".to_string(),
            eligible_slots: vec!["PG".to_string()],
            pro_team_id: 2,
            injury_status: InjuryStatus::Gtd,
            avg_fpts: 18.0,
            games_played: 40,
            percent_owned: 6.0,
            schedule: None,
        };
        let games = vec![game(2, Utc.with_ymd_and_hms(2026, 7, 29, 19, 0, 0).unwrap())];
        let result = score_streaming_candidate(&fa, &window(), &games);
        assert_eq!(result.confidence, ConfidenceTier::Low);
    }
}
