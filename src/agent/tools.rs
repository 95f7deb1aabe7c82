//! Tool Registry (spec §4.6 / C6): the 14 tools the agent orchestrator can
//! call, plus the Context-Aware Tool Node (§4.6.1) that merges `teamId`/
//! `leagueId` into arguments the LLM didn't supply.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use tracing::instrument;

use crate::agent::llm::ToolSpec;
use crate::domain::{DailyLeader, FreeAgent, Player};
use crate::error::{FanViseError, Result};
use crate::espn::EspnClient;
use crate::news::NewsPipeline;
use crate::optimizer::lineup::validate_lineup_legality;
use crate::optimizer::scoring::{score_dropping_candidate, score_streaming_candidate};
use crate::optimizer::simulate::simulate_move;
use crate::optimizer::window::Window;
use crate::optimizer::{league_avg_fpts, DEFAULT_LEAGUE_AVG_FPTS};
use crate::snapshot_builder::SnapshotBuilder;
use crate::store::Store;

/// Tools that read `teamId` (spec §4.6.1): auto-injected from the active
/// conversation's team when the LLM omits it.
pub const TEAM_SCOPED_TOOLS: &[&str] = &[
    "get_my_roster",
    "get_matchup_details",
    "get_free_agents",
    "simulate_move",
    "validate_lineup_legality",
];

/// Tools that read `leagueId` (spec §4.6.1).
pub const LEAGUE_SCOPED_TOOLS: &[&str] = &[
    "get_espn_player_status",
    "get_my_roster",
    "get_matchup_details",
    "get_free_agents",
    "get_league_standings",
    "get_league_scoreboard",
    "get_league_activity",
    "get_team_season_stats",
    "simulate_move",
    "validate_lineup_legality",
    "get_player_game_log",
];

/// Merge `teamId`/`leagueId` into `args` for tools that need them and the
/// LLM didn't supply (spec §4.6.1). Never overwrites a value the LLM gave.
/// Malformed args (the LLM returned something other than a JSON object) are
/// a single failed tool call, not a process-ending panic.
pub fn inject_context(
    tool_name: &str,
    mut args: Value,
    team_id: Option<&str>,
    league_id: Option<&str>,
) -> Result<Value> {
    let obj = args
        .as_object_mut()
        .ok_or_else(|| FanViseError::Internal(format!("tool args for {tool_name} must be a JSON object")))?;

    if TEAM_SCOPED_TOOLS.contains(&tool_name) && !obj.contains_key("teamId") {
        if let Some(id) = team_id {
            obj.insert("teamId".to_string(), json!(id));
        }
    }
    if LEAGUE_SCOPED_TOOLS.contains(&tool_name) && !obj.contains_key("leagueId") {
        if let Some(id) = league_id {
            obj.insert("leagueId".to_string(), json!(id));
        }
    }
    Ok(args)
}

fn require_str<'a>(args: &'a Value, field: &str) -> Result<&'a str> {
    args.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| FanViseError::MissingContext(field.to_string()))
}

fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_hms_opt(0, 0, 0).expect("midnight is valid").and_utc();
    let end = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .expect("end of day is valid")
        .and_utc();
    (start, end)
}

/// Holds the collaborators every tool handler needs. One instance shared
/// across requests, mirroring [`SnapshotBuilder`]'s own sharing pattern.
pub struct Toolbox {
    snapshots: Arc<SnapshotBuilder>,
    store: Arc<Store>,
    espn: Arc<EspnClient>,
    news: Arc<NewsPipeline>,
}

impl Toolbox {
    pub fn new(
        snapshots: Arc<SnapshotBuilder>,
        store: Arc<Store>,
        espn: Arc<EspnClient>,
        news: Arc<NewsPipeline>,
    ) -> Self {
        Self {
            snapshots,
            store,
            espn,
            news,
        }
    }

    /// Declarations handed to the LLM provider (spec §4.6 table).
    pub fn specs(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: "get_espn_player_status".to_string(),
                description: "Get a player's current ESPN injury/availability status by name, falling back to the last synced snapshot.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "playerName": {"type": "string"},
                        "leagueId": {"type": "string"}
                    },
                    "required": ["playerName"]
                }),
            },
            ToolSpec {
                name: "get_player_news".to_string(),
                description: "Get recent news items about a specific player.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"playerName": {"type": "string"}},
                    "required": ["playerName"]
                }),
            },
            ToolSpec {
                name: "refresh_player_news".to_string(),
                description: "Force a fresh fetch of news for a specific player instead of using cached results.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"playerName": {"type": "string"}},
                    "required": ["playerName"]
                }),
            },
            ToolSpec {
                name: "search_news_by_topic".to_string(),
                description: "Semantic search over ingested NBA news by free-text topic.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string"},
                        "limit": {"type": "integer"}
                    },
                    "required": ["query"]
                }),
            },
            ToolSpec {
                name: "get_player_game_log".to_string(),
                description: "Get a player's recent box scores from the Daily Leaders store.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "playerName": {"type": "string"},
                        "leagueId": {"type": "string"},
                        "lastNGames": {"type": "integer"}
                    },
                    "required": ["playerName"]
                }),
            },
            ToolSpec {
                name: "get_my_roster".to_string(),
                description: "Get the caller's current roster with per-player drop scores.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "teamId": {"type": "string"},
                        "leagueId": {"type": "string"}
                    }
                }),
            },
            ToolSpec {
                name: "get_free_agents".to_string(),
                description: "Get the top available free agents, optionally ranked by upcoming schedule density.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "teamId": {"type": "string"},
                        "leagueId": {"type": "string"},
                        "limit": {"type": "integer"},
                        "positionId": {"type": "string"},
                        "includeSchedule": {"type": "boolean"}
                    }
                }),
            },
            ToolSpec {
                name: "get_matchup_details".to_string(),
                description: "Get the caller's current head-to-head matchup and schedule density.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "teamId": {"type": "string"},
                        "leagueId": {"type": "string"}
                    }
                }),
            },
            ToolSpec {
                name: "get_league_standings".to_string(),
                description: "Get the league's team standings sorted by record.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"leagueId": {"type": "string"}}
                }),
            },
            ToolSpec {
                name: "get_league_scoreboard".to_string(),
                description: "Get the league's current scoreboard across all matchups.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"leagueId": {"type": "string"}}
                }),
            },
            ToolSpec {
                name: "get_league_activity".to_string(),
                description: "Get recent add/drop/trade transactions across the league.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"leagueId": {"type": "string"}}
                }),
            },
            ToolSpec {
                name: "get_team_season_stats".to_string(),
                description: "Get season-to-date team point totals, sorted descending.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"leagueId": {"type": "string"}}
                }),
            },
            ToolSpec {
                name: "simulate_move".to_string(),
                description: "Project the net fantasy-point effect of dropping one roster player for a free agent over the rest of the week.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "teamId": {"type": "string"},
                        "leagueId": {"type": "string"},
                        "dropPlayerName": {"type": "string"},
                        "addPlayerName": {"type": "string"}
                    },
                    "required": ["dropPlayerName", "addPlayerName"]
                }),
            },
            ToolSpec {
                name: "validate_lineup_legality".to_string(),
                description: "Check whether the caller's lineup on a given date fills every starting slot, flagging benched players with a game.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "teamId": {"type": "string"},
                        "leagueId": {"type": "string"},
                        "targetDate": {"type": "string", "description": "YYYY-MM-DD, defaults to today"}
                    }
                }),
            },
        ]
    }

    #[instrument(skip(self, args))]
    pub async fn call(&self, name: &str, args: Value) -> Result<Value> {
        match name {
            "get_espn_player_status" => self.get_espn_player_status(args).await,
            "get_player_news" => self.get_player_news(args).await,
            "refresh_player_news" => self.refresh_player_news(args).await,
            "search_news_by_topic" => self.search_news_by_topic(args).await,
            "get_player_game_log" => self.get_player_game_log(args).await,
            "get_my_roster" => self.get_my_roster(args).await,
            "get_free_agents" => self.get_free_agents(args).await,
            "get_matchup_details" => self.get_matchup_details(args).await,
            "get_league_standings" => self.get_league_standings(args).await,
            "get_league_scoreboard" => self.get_league_scoreboard(args).await,
            "get_league_activity" => self.get_league_activity(args).await,
            "get_team_season_stats" => self.get_team_season_stats(args).await,
            "simulate_move" => self.simulate_move_tool(args).await,
            "validate_lineup_legality" => self.validate_lineup_legality_tool(args).await,
            other => Err(FanViseError::Internal(format!("unknown tool: {other}"))),
        }
    }

    /// Three-tier fallback (spec §4.6): ESPN player card → DB snapshot by
    /// name → `"UNKNOWN"`.
    async fn get_espn_player_status(&self, args: Value) -> Result<Value> {
        let player_name = require_str(&args, "playerName")?;
        let league_id = args.get("leagueId").and_then(Value::as_str);

        if let Some(league_id) = league_id {
            if let Ok(Some(player)) = self.snapshots.espn_player_by_name(league_id, player_name).await {
                return Ok(json!({
                    "source": "ESPN",
                    "playerName": player.player_name,
                    "injuryStatus": player.injury_status,
                }));
            }
        }

        if let Some(snapshot) = self
            .store
            .get_player_status_snapshot_by_name(player_name)
            .await?
        {
            return Ok(json!({ "source": "DB_SNAPSHOT", "snapshot": snapshot }));
        }

        Ok(json!({ "source": "UNKNOWN", "playerName": player_name, "status": "UNKNOWN" }))
    }

    /// Cached/semantic search path; does not touch the feeds (spec §4.6
    /// table: distinct from [`Self::refresh_player_news`]'s live refetch).
    async fn get_player_news(&self, args: Value) -> Result<Value> {
        let player_name = require_str(&args, "playerName")?;
        let results = self.news.search(player_name, 10, None).await?;
        let items: Vec<Value> = results.into_iter().map(|(item, _)| json!(item)).collect();
        Ok(json!({ "items": items }))
    }

    /// Forces a fresh RSS fetch and ingestion pass for this player before
    /// returning (spec §4.6 table), unlike the cached path above.
    async fn refresh_player_news(&self, args: Value) -> Result<Value> {
        let player_name = require_str(&args, "playerName")?;
        let items = self.news.fetch_player_specific_news(player_name).await?;
        Ok(json!({ "items": items }))
    }

    async fn search_news_by_topic(&self, args: Value) -> Result<Value> {
        let query = require_str(&args, "query")?;
        let limit = args.get("limit").and_then(Value::as_i64).unwrap_or(10);
        let results = self.news.search(query, limit, None).await?;
        let items: Vec<Value> = results
            .into_iter()
            .map(|(item, score)| json!({ "item": item, "relevance": score }))
            .collect();
        Ok(json!({ "items": items }))
    }

    async fn get_player_game_log(&self, args: Value) -> Result<Value> {
        let player_name = require_str(&args, "playerName")?;
        let league_id = require_str(&args, "leagueId")?;
        let last_n = args.get("lastNGames").and_then(Value::as_i64).unwrap_or(10);
        let season_id = &self.espn.config().season_id;
        let log: Vec<DailyLeader> = self
            .store
            .get_player_game_log(league_id, season_id, player_name, last_n)
            .await?;
        Ok(json!({ "games": log }))
    }

    async fn get_my_roster(&self, args: Value) -> Result<Value> {
        let team_id = require_str(&args, "teamId")?;
        let league_id = require_str(&args, "leagueId")?;
        let snapshot = self.snapshots.build(league_id, team_id).await?;

        let now = Utc::now();
        let window = Window::default_from(now);
        let games = self.games_for_window(&window).await?;
        let avg = {
            let a = league_avg_fpts(snapshot.my_roster());
            if a <= 0.0 {
                DEFAULT_LEAGUE_AVG_FPTS
            } else {
                a
            }
        };

        let roster: Vec<Value> = snapshot
            .my_roster()
            .iter()
            .map(|p| {
                let drop_score = score_dropping_candidate(p, &window, avg, &games);
                json!({ "player": p, "dropScore": drop_score })
            })
            .collect();

        Ok(json!({ "teamName": snapshot.my_team.name, "source": "ESPN", "roster": roster }))
    }

    async fn get_free_agents(&self, args: Value) -> Result<Value> {
        let team_id = require_str(&args, "teamId")?;
        let league_id = require_str(&args, "leagueId")?;
        let snapshot = self.snapshots.build(league_id, team_id).await?;

        let mut free_agents: Vec<FreeAgent> = snapshot.free_agents.clone();
        if let Some(position) = args.get("positionId").and_then(Value::as_str) {
            free_agents.retain(|fa| fa.eligible_slots.iter().any(|s| s == position));
        }
        let limit = args.get("limit").and_then(Value::as_u64).unwrap_or(15) as usize;

        let include_schedule = args
            .get("includeSchedule")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let entries: Vec<Value> = if include_schedule {
            let now = Utc::now();
            let window = Window::default_from(now);
            let games = self.games_for_window(&window).await?;
            let mut scored: Vec<(FreeAgent, f64, Value)> = free_agents
                .into_iter()
                .map(|fa| {
                    let stream_score = score_streaming_candidate(&fa, &window, &games);
                    let score = stream_score.score;
                    (fa.clone(), score, json!({ "freeAgent": fa, "streamScore": stream_score }))
                })
                .collect();
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            scored.into_iter().map(|(_, _, v)| v).collect()
        } else {
            free_agents
                .into_iter()
                .map(|fa| json!({ "freeAgent": fa }))
                .collect()
        };

        Ok(json!({ "freeAgents": entries.into_iter().take(limit).collect::<Vec<_>>() }))
    }

    async fn get_matchup_details(&self, args: Value) -> Result<Value> {
        let team_id = require_str(&args, "teamId")?;
        let league_id = require_str(&args, "leagueId")?;
        let snapshot = self.snapshots.build(league_id, team_id).await?;

        Ok(json!({
            "matchup": snapshot.matchup,
            "opponent": snapshot.opponent,
            "schedule": snapshot.schedule,
        }))
    }

    async fn get_league_standings(&self, args: Value) -> Result<Value> {
        let league_id = require_str(&args, "leagueId")?;
        let league = self
            .store
            .get_league(league_id)
            .await?
            .ok_or_else(|| FanViseError::LeagueNotFound(league_id.to_string()))?;

        let mut teams = league.teams.clone();
        teams.sort_by(|a, b| {
            let (aw, al) = a.record.as_ref().map(|r| (r.wins, r.losses)).unwrap_or((0, 0));
            let (bw, bl) = b.record.as_ref().map(|r| (r.wins, r.losses)).unwrap_or((0, 0));
            bw.cmp(&aw).then(al.cmp(&bl))
        });
        Ok(json!({ "standings": teams }))
    }

    /// Lower-fidelity than the other tools: no dedicated `League`
    /// scoreboard parser exists (spec §3 models standings, not live
    /// scoring), so this passes the raw ESPN view through.
    async fn get_league_scoreboard(&self, args: Value) -> Result<Value> {
        let _league_id = require_str(&args, "leagueId")?;
        let raw = self.espn.fetch_view("mScoreboard").await?;
        Ok(raw)
    }

    async fn get_league_activity(&self, args: Value) -> Result<Value> {
        let league_id = require_str(&args, "leagueId")?;
        let transactions = self.snapshots.recent_transactions_for(league_id).await?;
        Ok(json!({ "transactions": transactions }))
    }

    /// Lower-fidelity passthrough (see [`Self::get_league_scoreboard`]):
    /// season point totals aren't in the `Team` domain type, so this reads
    /// ESPN's `mTeam` view directly rather than a parser module.
    async fn get_team_season_stats(&self, args: Value) -> Result<Value> {
        let _league_id = require_str(&args, "leagueId")?;
        let raw = self.espn.fetch_view("mTeam").await?;
        Ok(raw)
    }

    async fn simulate_move_tool(&self, args: Value) -> Result<Value> {
        let team_id = require_str(&args, "teamId")?;
        let league_id = require_str(&args, "leagueId")?;
        let drop_name = require_str(&args, "dropPlayerName")?;
        let add_name = require_str(&args, "addPlayerName")?;

        let snapshot = self.snapshots.build(league_id, team_id).await?;
        let roster = snapshot.my_roster();

        let drop_player: &Player = roster
            .iter()
            .find(|p| p.player_name.eq_ignore_ascii_case(drop_name))
            .ok_or_else(|| FanViseError::RosterUnavailable(format!("{drop_name} not on roster")))?;
        let add_player: &FreeAgent = snapshot
            .free_agents
            .iter()
            .find(|fa| fa.player_name.eq_ignore_ascii_case(add_name))
            .ok_or_else(|| FanViseError::RosterUnavailable(format!("{add_name} not a free agent")))?;

        let now = Utc::now();
        let window = Window::default_from(now);
        let games = self.games_for_window(&window).await?;
        let roster_slots = &snapshot.league.roster_slots;

        let result = simulate_move(drop_player, add_player, roster, roster_slots, &window, &games);
        Ok(json!({ "result": result }))
    }

    async fn validate_lineup_legality_tool(&self, args: Value) -> Result<Value> {
        let team_id = require_str(&args, "teamId")?;
        let league_id = require_str(&args, "leagueId")?;
        let target_date = match args.get("targetDate").and_then(Value::as_str) {
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| FanViseError::Internal(format!("invalid targetDate: {s}")))?,
            None => Utc::now().date_naive(),
        };

        let snapshot = self.snapshots.build(league_id, team_id).await?;
        let roster = snapshot.my_roster();
        let (start, end) = day_bounds(target_date);
        let games = self.store.games_in_range(start, end).await?;

        let playing_teams: HashSet<i64> = games
            .iter()
            .flat_map(|g| [g.home_team_id, g.away_team_id])
            .collect();
        let playing_player_ids: HashSet<i64> = roster
            .iter()
            .filter(|p| playing_teams.contains(&p.pro_team_id))
            .map(|p| p.player_id)
            .collect();

        let result = validate_lineup_legality(roster, &snapshot.league.roster_slots, &playing_player_ids);
        Ok(json!({ "result": result }))
    }

    async fn games_for_window(&self, window: &Window) -> Result<Vec<crate::domain::NbaGame>> {
        self.store.games_in_range(window.start, window.end).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inject_context_fills_missing_team_and_league() {
        let args = json!({});
        let merged = inject_context("get_my_roster", args, Some("13"), Some("L1")).unwrap();
        assert_eq!(merged["teamId"], "13");
        assert_eq!(merged["leagueId"], "L1");
    }

    #[test]
    fn inject_context_never_overwrites_llm_supplied_value() {
        let args = json!({"teamId": "99"});
        let merged = inject_context("get_my_roster", args, Some("13"), Some("L1")).unwrap();
        assert_eq!(merged["teamId"], "99");
    }

    #[test]
    fn inject_context_skips_unscoped_tool() {
        let args = json!({});
        let merged = inject_context("search_news_by_topic", args, Some("13"), Some("L1")).unwrap();
        assert!(merged.get("teamId").is_none());
        assert!(merged.get("leagueId").is_none());
    }

    #[test]
    fn inject_context_rejects_non_object_args() {
        let args = json!("not an object");
        assert!(inject_context("get_my_roster", args, Some("13"), Some("L1")).is_err());
    }

    #[test]
    fn day_bounds_spans_the_whole_day() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 29).unwrap();
        let (start, end) = day_bounds(date);
        assert_eq!(start.date_naive(), date);
        assert_eq!(end.date_naive(), date);
        assert!(end > start);
    }
}
