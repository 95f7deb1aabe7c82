//! Typed views over raw ESPN JSON (spec §4.5 steps 3-4, 7-8). ESPN's
//! response envelopes carry far more than we use; these structs only
//! name the fields the builder reads and tolerate everything else via
//! `#[serde(default)]`.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{FreeAgent, InjuryStatus, Player};
use crate::espn::tables;

#[derive(Debug, Deserialize)]
struct MatchupEnvelope {
    #[serde(default)]
    schedule: Vec<ScheduleEntry>,
    #[serde(default)]
    teams: Vec<TeamEntry>,
}

#[derive(Debug, Deserialize)]
struct TeamEntry {
    id: i64,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScheduleEntry {
    #[serde(rename = "matchupPeriodId", default)]
    matchup_period_id: i64,
    #[serde(default)]
    home: Option<SideEntry>,
    #[serde(default)]
    away: Option<SideEntry>,
}

#[derive(Debug, Deserialize)]
struct SideEntry {
    #[serde(rename = "teamId")]
    team_id: i64,
    #[serde(rename = "totalPoints", default)]
    total_points: f64,
    #[serde(rename = "rosterForCurrentScoringPeriod", default)]
    roster: Option<RosterEntry>,
}

#[derive(Debug, Deserialize)]
struct RosterEntry {
    #[serde(default)]
    entries: Vec<PlayerEntry>,
}

#[derive(Debug, Deserialize)]
struct PlayerEntry {
    #[serde(rename = "playerPoolEntry")]
    player_pool_entry: PlayerPoolEntry,
}

#[derive(Debug, Deserialize)]
struct PlayerPoolEntry {
    player: EspnPlayer,
    #[serde(rename = "onTeamId", default)]
    on_team_id: i64,
}

#[derive(Debug, Deserialize)]
struct EspnPlayer {
    id: i64,
    #[serde(rename = "fullName", default)]
    full_name: String,
    #[serde(rename = "defaultPositionId", default)]
    default_position_id: i64,
    #[serde(rename = "proTeamId", default)]
    pro_team_id: i64,
    #[serde(rename = "injuryStatus", default)]
    injury_status: Option<String>,
    #[serde(rename = "eligibleSlots", default)]
    eligible_slots: Vec<i64>,
    #[serde(default)]
    stats: Vec<EspnPlayerStats>,
    #[serde(default)]
    ownership: Option<Ownership>,
}

#[derive(Debug, Deserialize)]
struct Ownership {
    #[serde(rename = "percentOwned", default)]
    percent_owned: f64,
}

#[derive(Debug, Deserialize)]
struct EspnPlayerStats {
    #[serde(rename = "seasonId", default)]
    season_id: i64,
    #[serde(rename = "statSourceId", default)]
    stat_source_id: i64,
    #[serde(rename = "statSplitTypeId", default)]
    stat_split_type_id: i64,
    #[serde(rename = "appliedAverage", default)]
    applied_average: f64,
    #[serde(rename = "appliedTotal", default)]
    applied_total: f64,
}

/// Maps ESPN's injury status strings onto our enum; unrecognized or
/// absent values read as available (spec §4.5 step 4, best-effort since
/// ESPN's vocabulary is not publicly versioned).
fn map_injury_status(raw: Option<&str>) -> InjuryStatus {
    match raw {
        Some("OUT") => InjuryStatus::Out,
        Some("INJURY_RESERVE") => InjuryStatus::Ir,
        Some("SUSPENSION") => InjuryStatus::Suspended,
        Some("QUESTIONABLE") | Some("DOUBTFUL") => InjuryStatus::Questionable,
        Some("DAY_TO_DAY") => InjuryStatus::Dtd,
        _ => InjuryStatus::Active,
    }
}

fn to_player(raw: EspnPlayer, season_num: i64) -> Player {
    let stat = raw
        .stats
        .iter()
        .find(|s| s.season_id == season_num && s.stat_source_id == 0 && s.stat_split_type_id == 0);
    let avg_fpts = stat.map(|s| s.applied_average).unwrap_or(0.0);
    let total_fpts = stat.map(|s| s.applied_total).unwrap_or(0.0);
    let games_played = if avg_fpts > 0.0 {
        (total_fpts / avg_fpts).round() as u32
    } else {
        0
    };

    let eligible_slots = if raw.eligible_slots.is_empty() {
        vec![tables::position_label(raw.default_position_id).to_string()]
    } else {
        raw.eligible_slots
            .iter()
            .map(|id| tables::position_label(*id).to_string())
            .collect()
    };

    Player {
        player_id: raw.id,
        player_name: raw.full_name,
        position: tables::position_label(raw.default_position_id).to_string(),
        eligible_slots,
        pro_team_id: raw.pro_team_id,
        injury_status: map_injury_status(raw.injury_status.as_deref()),
        avg_fpts,
        total_fpts,
        games_played,
    }
}

/// A matchup fetch resolved against one team (spec §4.5 steps 3-5).
#[derive(Debug, Clone)]
pub struct MatchupBundle {
    pub my_roster: Vec<Player>,
    pub opponent_name: Option<String>,
    pub opponent_id: Option<i64>,
    pub opponent_roster: Vec<Player>,
    pub my_score: f64,
    pub opponent_score: f64,
    pub scoring_period: i64,
}

/// Parse the `mMatchupScore, mScoreboard, mRoster,
/// rosterForCurrentScoringPeriod` response, resolving the matchup that
/// involves `team_id` (spec §4.5 step 3): prefer the entry with the
/// highest `matchupPeriodId` among those involving the team, since ESPN
/// does not expose "current period" directly in this envelope.
pub fn parse_matchup(raw: &Value, team_id: i64, season_id: &str) -> Option<MatchupBundle> {
    let envelope: MatchupEnvelope = serde_json::from_value(raw.clone()).ok()?;
    let season_num: i64 = season_id.parse().unwrap_or(0);

    let entry = envelope
        .schedule
        .into_iter()
        .filter(|e| {
            e.home.as_ref().map(|s| s.team_id) == Some(team_id)
                || e.away.as_ref().map(|s| s.team_id) == Some(team_id)
        })
        .max_by_key(|e| e.matchup_period_id)?;

    let (mine, theirs) = if entry.home.as_ref().map(|s| s.team_id) == Some(team_id) {
        (entry.home, entry.away)
    } else {
        (entry.away, entry.home)
    };
    let mine = mine?;

    let my_roster = mine
        .roster
        .map(|r| {
            r.entries
                .into_iter()
                .map(|e| to_player(e.player_pool_entry.player, season_num))
                .collect()
        })
        .unwrap_or_default();

    let opponent_roster = theirs
        .as_ref()
        .and_then(|s| s.roster.as_ref())
        .map(|r| {
            r.entries
                .iter()
                .map(|e| to_player(clone_player(&e.player_pool_entry.player), season_num))
                .collect()
        })
        .unwrap_or_default();

    let opponent_id = theirs.as_ref().map(|s| s.team_id);
    let opponent_name = opponent_id.and_then(|id| {
        envelope
            .teams
            .iter()
            .find(|t| t.id == id)
            .map(team_display_name)
    });

    Some(MatchupBundle {
        my_roster,
        opponent_name,
        opponent_id,
        opponent_roster,
        my_score: mine.total_points,
        opponent_score: theirs.map(|s| s.total_points).unwrap_or(0.0),
        scoring_period: entry.matchup_period_id,
    })
}

fn clone_player(p: &EspnPlayer) -> EspnPlayer {
    EspnPlayer {
        id: p.id,
        full_name: p.full_name.clone(),
        default_position_id: p.default_position_id,
        pro_team_id: p.pro_team_id,
        injury_status: p.injury_status.clone(),
        eligible_slots: p.eligible_slots.clone(),
        stats: p
            .stats
            .iter()
            .map(|s| EspnPlayerStats {
                season_id: s.season_id,
                stat_source_id: s.stat_source_id,
                stat_split_type_id: s.stat_split_type_id,
                applied_average: s.applied_average,
                applied_total: s.applied_total,
            })
            .collect(),
        ownership: p.ownership.as_ref().map(|o| Ownership {
            percent_owned: o.percent_owned,
        }),
    }
}

fn team_display_name(entry: &TeamEntry) -> String {
    match (&entry.location, &entry.nickname) {
        (Some(location), Some(nickname)) => format!("{location} {nickname}").trim().to_string(),
        (Some(location), None) => location.clone(),
        (None, Some(nickname)) => nickname.clone(),
        (None, None) => format!("Team {}", entry.id),
    }
}

#[derive(Debug, Deserialize)]
struct FreeAgentEnvelope {
    #[serde(default)]
    players: Vec<FreeAgentEntry>,
}

#[derive(Debug, Deserialize)]
struct FreeAgentEntry {
    player: EspnPlayer,
}

/// Parse a `kona_player_info` free-agent pool response (spec §4.5 step 7).
pub fn parse_free_agents(raw: &Value, season_id: &str) -> Vec<FreeAgent> {
    let season_num: i64 = season_id.parse().unwrap_or(0);
    let envelope: FreeAgentEnvelope = match serde_json::from_value(raw.clone()) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };

    envelope
        .players
        .into_iter()
        .map(|entry| {
            let percent_owned = entry
                .player
                .ownership
                .as_ref()
                .map(|o| o.percent_owned)
                .unwrap_or(0.0);
            let player = to_player(entry.player, season_num);
            FreeAgent {
                player_id: player.player_id,
                player_name: player.player_name,
                position: player.position,
                eligible_slots: player.eligible_slots,
                pro_team_id: player.pro_team_id,
                injury_status: player.injury_status,
                avg_fpts: player.avg_fpts,
                games_played: player.games_played,
                percent_owned,
                schedule: None,
            }
        })
        .collect()
}

/// Parse a `kona_player_info` response filtered by name (spec §4.6
/// `get_espn_player_status`), returning the first match.
pub fn parse_player_by_name(raw: &Value, name: &str, season_id: &str) -> Option<Player> {
    let season_num: i64 = season_id.parse().unwrap_or(0);
    let envelope: FreeAgentEnvelope = serde_json::from_value(raw.clone()).ok()?;
    let needle = name.to_lowercase();
    envelope
        .players
        .into_iter()
        .map(|entry| to_player(entry.player, season_num))
        .find(|p| p.player_name.to_lowercase().contains(&needle))
}

#[derive(Debug, Deserialize)]
struct TransactionEnvelope {
    #[serde(default)]
    transactions: Vec<TransactionEntry>,
}

#[derive(Debug, Deserialize)]
struct TransactionEntry {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    status: String,
    #[serde(rename = "proposedDate", default)]
    proposed_date: i64,
    #[serde(rename = "teamId", default)]
    team_id: i64,
    #[serde(default)]
    items: Vec<TransactionItem>,
}

#[derive(Debug, Deserialize)]
struct TransactionItem {
    #[serde(rename = "playerId", default)]
    player_id: i64,
    #[serde(rename = "type", default)]
    kind: String,
}

/// Parse `mTransactions2`, retaining `EXECUTED` waiver/free-agent/trade
/// moves, newest first (spec §4.5 step 8).
pub fn parse_transactions(
    raw: &Value,
    team_name: impl Fn(i64) -> String,
    limit: usize,
) -> Vec<String> {
    let envelope: TransactionEnvelope = match serde_json::from_value(raw.clone()) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };

    let mut executed: Vec<TransactionEntry> = envelope
        .transactions
        .into_iter()
        .filter(|t| t.status == "EXECUTED")
        .filter(|t| matches!(t.kind.as_str(), "WAIVER" | "FREEAGENT" | "TRADE"))
        .collect();
    executed.sort_by(|a, b| b.proposed_date.cmp(&a.proposed_date));

    executed
        .into_iter()
        .take(limit)
        .map(|t| format_transaction(&t, &team_name))
        .collect()
}

fn format_transaction(t: &TransactionEntry, team_name: &impl Fn(i64) -> String) -> String {
    let actor = team_name(t.team_id);
    let moves: Vec<String> = t
        .items
        .iter()
        .map(|item| format!("{} player {}", item.kind.to_lowercase(), item.player_id))
        .collect();
    if moves.is_empty() {
        format!("{actor}: {}", t.kind.to_lowercase())
    } else {
        format!("{actor}: {}", moves.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn injury_status_maps_known_espn_values() {
        assert_eq!(map_injury_status(Some("OUT")), InjuryStatus::Out);
        assert_eq!(map_injury_status(Some("DAY_TO_DAY")), InjuryStatus::Dtd);
        assert_eq!(map_injury_status(Some("UNKNOWN_VALUE")), InjuryStatus::Active);
        assert_eq!(map_injury_status(None), InjuryStatus::Active);
    }

    #[test]
    fn parse_matchup_resolves_my_roster_and_opponent() {
        let raw = json!({
            "teams": [
                {"id": 1, "location": "Night", "nickname": "Owls"},
                {"id": 2, "location": "Day", "nickname": "Larks"}
            ],
            "schedule": [
                {
                    "matchupPeriodId": 5,
                    "home": {
                        "teamId": 1,
                        "totalPoints": 120.5,
                        "rosterForCurrentScoringPeriod": {
                            "entries": [
                                {
                                    "playerPoolEntry": {
                                        "onTeamId": 1,
                                        "player": {
                                            "id": 100,
                                            "fullName": "Test Guard",
                                            "defaultPositionId": 0,
                                            "proTeamId": 10,
                                            "injuryStatus": "ACTIVE",
                                            "eligibleSlots": [0, 5],
                                            "stats": [
                                                {"seasonId": 2026, "statSourceId": 0, "statSplitTypeId": 0, "appliedAverage": 30.0, "appliedTotal": 300.0}
                                            ]
                                        }
                                    }
                                }
                            ]
                        }
                    },
                    "away": {
                        "teamId": 2,
                        "totalPoints": 98.0,
                        "rosterForCurrentScoringPeriod": {"entries": []}
                    }
                }
            ]
        });

        let bundle = parse_matchup(&raw, 1, "2026").expect("matchup resolves");
        assert_eq!(bundle.my_roster.len(), 1);
        assert_eq!(bundle.my_roster[0].player_name, "Test Guard");
        assert_eq!(bundle.my_roster[0].games_played, 10);
        assert_eq!(bundle.opponent_id, Some(2));
        assert_eq!(bundle.opponent_name.as_deref(), Some("Day Larks"));
        assert_eq!(bundle.my_score, 120.5);
        assert_eq!(bundle.opponent_score, 98.0);
    }

    #[test]
    fn parse_matchup_absent_when_team_not_in_any_entry() {
        let raw = json!({"teams": [], "schedule": []});
        assert!(parse_matchup(&raw, 99, "2026").is_none());
    }

    #[test]
    fn parse_transactions_filters_and_sorts_newest_first() {
        let raw = json!({
            "transactions": [
                {"type": "WAIVER", "status": "EXECUTED", "proposedDate": 100, "teamId": 1, "items": [{"playerId": 55, "type": "ADD"}]},
                {"type": "TRADE", "status": "PENDING", "proposedDate": 200, "teamId": 2, "items": []},
                {"type": "FREEAGENT", "status": "EXECUTED", "proposedDate": 300, "teamId": 1, "items": [{"playerId": 56, "type": "ADD"}]}
            ]
        });
        let names = parse_transactions(&raw, |id| format!("Team{id}"), 10);
        assert_eq!(names.len(), 2);
        assert!(names[0].contains("56"));
        assert!(names[1].contains("55"));
    }
}
