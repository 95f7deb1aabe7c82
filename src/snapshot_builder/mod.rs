//! Intelligence Snapshot Builder (spec §4.5 / C5): composes league, team,
//! matchup, schedule density, free agents, and recent transactions into
//! one immutable artifact per `(leagueId, teamId)` query. ESPN failures
//! degrade individual fields rather than aborting the whole build.

mod espn_response;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tracing::{instrument, warn};

use crate::cache::{keys, TtlCache};
use crate::domain::{
    FreeAgent, IntelligenceSnapshot, League, Matchup, MatchupStatus, NbaGame, Player,
    ScheduleDensity, Team, TeamRecord,
};
use crate::error::{FanViseError, Result};
use crate::espn::EspnClient;
use crate::store::Store;

use espn_response::MatchupBundle;

const LEAGUE_TTL: Duration = Duration::from_secs(60);
const MATCHUP_TTL: Duration = Duration::from_secs(45);
const SCHEDULE_TTL: Duration = Duration::from_secs(6 * 60 * 60);
const FREE_AGENTS_TTL: Duration = Duration::from_secs(5 * 60);

const SCHEDULE_WINDOW_DAYS: i64 = 6;
const FREE_AGENT_FETCH_LIMIT: u32 = 150;
const FREE_AGENT_TOP_N: usize = 15;
const MAX_TRANSACTIONS: usize = 10;

/// Assembles [`IntelligenceSnapshot`]s (spec §4.5). Holds the four caches
/// named in spec §5 ("Caches (League 60s, Matchup 45s, Schedule 6h, Free
/// Agents 5m) are the only shared mutable state"); one builder instance is
/// shared across requests.
pub struct SnapshotBuilder {
    store: Arc<Store>,
    espn: Arc<EspnClient>,
    league_cache: TtlCache<String, League>,
    matchup_cache: TtlCache<String, Option<MatchupBundle>>,
    schedule_cache: TtlCache<String, Vec<NbaGame>>,
    free_agents_cache: TtlCache<String, Vec<FreeAgent>>,
}

impl SnapshotBuilder {
    pub fn new(store: Arc<Store>, espn: Arc<EspnClient>) -> Self {
        Self {
            store,
            espn,
            league_cache: TtlCache::new(),
            matchup_cache: TtlCache::new(),
            schedule_cache: TtlCache::new(),
            free_agents_cache: TtlCache::new(),
        }
    }

    /// `build(leagueId, teamId) -> Snapshot` (spec §4.5 contract).
    #[instrument(skip(self))]
    pub async fn build(&self, league_id: &str, team_id: &str) -> Result<IntelligenceSnapshot> {
        let league = self.load_league(league_id).await?;
        let season_id = league.season_id.clone();

        let base_team = league
            .find_team(team_id)
            .cloned()
            .ok_or_else(|| FanViseError::TeamNotFound {
                league_id: league_id.to_string(),
                team_id: team_id.to_string(),
            })?;

        let bundle = self.load_matchup(league_id, team_id, &season_id).await;

        let (my_team, opponent, matchup) = match bundle {
            Some(b) => {
                let my_team = Team {
                    roster: Some(b.my_roster),
                    ..base_team
                };
                let opponent = b.opponent_id.map(|id| Team {
                    id: id.to_string(),
                    name: b.opponent_name.clone().unwrap_or_else(|| format!("Team {id}")),
                    abbrev: String::new(),
                    manager: String::new(),
                    record: None::<TeamRecord>,
                    roster: Some(b.opponent_roster),
                });
                let matchup = Some(Matchup::new(
                    b.my_score,
                    b.opponent_score,
                    MatchupStatus::InProgress,
                    b.scoring_period,
                ));
                (my_team, opponent, matchup)
            }
            None => (base_team, None, None),
        };

        let schedule = self
            .schedule_density(league_id, team_id, my_team.roster.as_deref().unwrap_or(&[]))
            .await?;

        let my_roster_ids: Vec<i64> = my_team
            .roster
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|p| p.player_id)
            .collect();
        let opponent_roster_ids: Vec<i64> = opponent
            .as_ref()
            .and_then(|o| o.roster.as_deref())
            .unwrap_or(&[])
            .iter()
            .map(|p| p.player_id)
            .collect();

        let free_agents = match self
            .free_agents(league_id, &season_id, &my_roster_ids, &opponent_roster_ids)
            .await
        {
            Ok(fas) => fas,
            Err(err) => {
                warn!(%err, "free agent fetch failed, degrading to empty pool");
                Vec::new()
            }
        };

        let transactions = match self.recent_transactions(&league).await {
            Ok(items) => items,
            Err(err) => {
                warn!(%err, "transaction fetch failed, degrading to empty list");
                Vec::new()
            }
        };

        Ok(IntelligenceSnapshot {
            league,
            my_team,
            opponent,
            matchup,
            schedule: Some(schedule),
            free_agents,
            transactions,
            built_at: Utc::now(),
        })
    }

    async fn load_league(&self, league_id: &str) -> Result<League> {
        let key = keys::league_key(league_id);
        let store = self.store.clone();
        let league_id = league_id.to_string();
        self.league_cache
            .get_or_try_insert_with(key, LEAGUE_TTL, || async move {
                store
                    .get_league(&league_id)
                    .await?
                    .ok_or_else(|| FanViseError::LeagueNotFound(league_id.clone()))
            })
            .await
    }

    /// Degrades to `None` on any ESPN or parse failure (spec §4.5
    /// "ESPN failures degrade: matchup becomes absent rather than
    /// aborting").
    async fn load_matchup(
        &self,
        league_id: &str,
        team_id: &str,
        season_id: &str,
    ) -> Option<MatchupBundle> {
        let key = keys::matchup_key(league_id, team_id, season_id);
        let espn = self.espn.clone();
        let team_id_num: i64 = match team_id.parse() {
            Ok(id) => id,
            Err(_) => return None,
        };
        let season_owned = season_id.to_string();

        let result: Result<Option<MatchupBundle>> = self
            .matchup_cache
            .get_or_try_insert_with(key, MATCHUP_TTL, || async move {
                let raw = espn
                    .fetch_views(&[
                        "mMatchupScore",
                        "mScoreboard",
                        "mRoster",
                        "rosterForCurrentScoringPeriod",
                    ])
                    .await?;
                Ok(espn_response::parse_matchup(&raw, team_id_num, &season_owned))
            })
            .await;

        match result {
            Ok(bundle) => bundle,
            Err(err) => {
                warn!(%err, "matchup fetch failed, degrading to absent matchup");
                None
            }
        }
    }

    async fn schedule_density(
        &self,
        league_id: &str,
        team_id: &str,
        roster: &[Player],
    ) -> Result<Vec<ScheduleDensity>> {
        let now = Utc::now();
        let start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is a valid time")
            .and_utc();
        let end = (now + ChronoDuration::days(SCHEDULE_WINDOW_DAYS))
            .date_naive()
            .and_hms_milli_opt(23, 59, 59, 999)
            .expect("end of day is a valid time")
            .and_utc();

        let key = keys::schedule_density_key(
            league_id,
            team_id,
            &start.to_rfc3339(),
            &end.to_rfc3339(),
        );
        let store = self.store.clone();
        let games = self
            .schedule_cache
            .get_or_try_insert_with(key, SCHEDULE_TTL, || async move {
                store.games_in_range(start, end).await
            })
            .await?;

        Ok(roster
            .iter()
            .map(|p| ScheduleDensity {
                player_id: p.player_id,
                games_remaining: games.iter().filter(|g| g.involves(p.pro_team_id)).count() as u32,
            })
            .collect())
    }

    async fn free_agents(
        &self,
        league_id: &str,
        season_id: &str,
        my_roster_ids: &[i64],
        opponent_roster_ids: &[i64],
    ) -> Result<Vec<FreeAgent>> {
        let key = keys::free_agents_key(league_id, season_id, my_roster_ids, opponent_roster_ids);
        let owned: HashSet<i64> = my_roster_ids
            .iter()
            .chain(opponent_roster_ids.iter())
            .copied()
            .collect();
        let espn = self.espn.clone();
        let season_owned = season_id.to_string();

        self.free_agents_cache
            .get_or_try_insert_with(key, FREE_AGENTS_TTL, || async move {
                let raw = espn.fetch_free_agent_pool(FREE_AGENT_FETCH_LIMIT).await?;
                let pool = espn_response::parse_free_agents(&raw, &season_owned);
                Ok(pool
                    .into_iter()
                    .filter(|fa| !owned.contains(&fa.player_id))
                    .filter(|fa| !fa.injury_status.is_unavailable())
                    .take(FREE_AGENT_TOP_N)
                    .collect())
            })
            .await
    }

    /// ESPN player card lookup by name, used by the `get_espn_player_status`
    /// tool (spec §4.6) before it falls back to the DB snapshot. Not cached:
    /// injury status changes are the one field callers need fresh.
    pub async fn espn_player_by_name(
        &self,
        league_id: &str,
        player_name: &str,
    ) -> Result<Option<Player>> {
        let season_id = self.load_league(league_id).await?.season_id;
        let raw = self.espn.fetch_player_card_by_name(player_name).await?;
        Ok(espn_response::parse_player_by_name(&raw, player_name, &season_id))
    }

    /// Public entry point for the `get_league_activity` tool (spec §4.6):
    /// loads the league then delegates to [`Self::recent_transactions`].
    pub async fn recent_transactions_for(&self, league_id: &str) -> Result<Vec<String>> {
        let league = self.load_league(league_id).await?;
        self.recent_transactions(&league).await
    }

    /// Not cached: spec §5 names only League/Matchup/Schedule/Free Agents
    /// as shared state.
    async fn recent_transactions(&self, league: &League) -> Result<Vec<String>> {
        let raw = self.espn.fetch_view("mTransactions2").await?;
        let league = league.clone();
        Ok(espn_response::parse_transactions(
            &raw,
            move |team_id| {
                league
                    .find_team(&team_id.to_string())
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| format!("Team {team_id}"))
            },
            MAX_TRANSACTIONS,
        ))
    }
}
