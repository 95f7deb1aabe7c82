use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::{info, instrument};

use crate::domain::{
    Category, DailyLeader, League, NewsItem, NbaGame, PlayerStatusSnapshot, Sentiment, Team,
};
use crate::error::{FanViseError, Result};

/// Postgres-backed persistence for the Schedule Store (C1), News & Status
/// Store (C2), and League Store (spec §6).
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ==================== Schedule Store (C1) ====================

    #[instrument(skip(self, games))]
    pub async fn upsert_games(&self, games: &[NbaGame]) -> Result<()> {
        for game in games {
            sqlx::query(
                r#"
                INSERT INTO nba_schedule (id, date, home_team_id, away_team_id, season_id, scoring_period_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (id) DO UPDATE SET
                    date = EXCLUDED.date,
                    home_team_id = EXCLUDED.home_team_id,
                    away_team_id = EXCLUDED.away_team_id,
                    season_id = EXCLUDED.season_id,
                    scoring_period_id = EXCLUDED.scoring_period_id
                "#,
            )
            .bind(&game.id)
            .bind(game.date)
            .bind(game.home_team_id)
            .bind(game.away_team_id)
            .bind(&game.season_id)
            .bind(game.scoring_period_id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Range query by date (spec §4.5 step 6): `[start, end]` inclusive.
    #[instrument(skip(self))]
    pub async fn games_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<NbaGame>> {
        let rows = sqlx::query(
            r#"
            SELECT id, date, home_team_id, away_team_id, season_id, scoring_period_id
            FROM nba_schedule
            WHERE date >= $1 AND date <= $2
            ORDER BY date ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| NbaGame {
                id: r.get("id"),
                date: r.get("date"),
                home_team_id: r.get("home_team_id"),
                away_team_id: r.get("away_team_id"),
                season_id: r.get("season_id"),
                scoring_period_id: r.get("scoring_period_id"),
            })
            .collect())
    }

    // ==================== League Store ====================

    #[instrument(skip(self, league))]
    pub async fn upsert_league(&self, league: &League) -> Result<()> {
        let teams_json = serde_json::to_value(&league.teams)?;
        let scoring_settings_json = serde_json::to_value(&league.scoring_settings)?;
        let roster_settings_json = serde_json::to_value(&league.roster_slots)?;

        sqlx::query(
            r#"
            INSERT INTO leagues (league_id, season_id, name, scoring_settings, roster_settings, teams, last_updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (league_id) DO UPDATE SET
                season_id = EXCLUDED.season_id,
                name = EXCLUDED.name,
                scoring_settings = EXCLUDED.scoring_settings,
                roster_settings = EXCLUDED.roster_settings,
                teams = EXCLUDED.teams,
                last_updated_at = NOW()
            "#,
        )
        .bind(&league.id)
        .bind(&league.season_id)
        .bind(&league.name)
        .bind(scoring_settings_json)
        .bind(roster_settings_json)
        .bind(teams_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load a cached league row (spec §4.5 step 1). Returns `None` if the
    /// row is missing; callers map that to `LeagueNotFound`.
    #[instrument(skip(self))]
    pub async fn get_league(&self, league_id: &str) -> Result<Option<League>> {
        let row = sqlx::query(
            r#"
            SELECT league_id, season_id, name, scoring_settings, roster_settings, teams
            FROM leagues WHERE league_id = $1
            "#,
        )
        .bind(league_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let teams: Vec<Team> = serde_json::from_value(row.get("teams"))?;
        let scoring_settings = serde_json::from_value(row.get("scoring_settings"))?;
        let roster_slots = serde_json::from_value(row.get("roster_settings"))?;

        Ok(Some(League {
            id: row.get("league_id"),
            season_id: row.get("season_id"),
            name: row.get("name"),
            scoring_settings,
            roster_slots,
            teams,
        }))
    }

    // ==================== News & Status Store (C2) ====================

    /// Upsert on unique `url` (spec §3.3 lifecycle); idempotent.
    #[instrument(skip(self, item))]
    pub async fn upsert_news_item(&self, item: &NewsItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO news_items (
                id, url, title, content, summary, published_at, source, embedding,
                player_name, sentiment, category, is_injury_report, injury_status,
                expected_return_date, impacted_player_ids, trust_level
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (url) DO UPDATE SET
                title = EXCLUDED.title,
                content = EXCLUDED.content,
                summary = EXCLUDED.summary,
                published_at = EXCLUDED.published_at,
                embedding = EXCLUDED.embedding,
                sentiment = EXCLUDED.sentiment,
                category = EXCLUDED.category,
                is_injury_report = EXCLUDED.is_injury_report,
                injury_status = EXCLUDED.injury_status,
                expected_return_date = EXCLUDED.expected_return_date,
                impacted_player_ids = EXCLUDED.impacted_player_ids
            "#,
        )
        .bind(&item.id)
        .bind(&item.url)
        .bind(&item.title)
        .bind(&item.content)
        .bind(&item.summary)
        .bind(item.published_at)
        .bind(&item.source)
        .bind(&item.embedding)
        .bind(&item.player_name)
        .bind(sentiment_str(item.sentiment))
        .bind(category_str(item.category))
        .bind(item.is_injury_report)
        .bind(&item.injury_status)
        .bind(&item.expected_return_date)
        .bind(&item.impacted_player_ids)
        .bind(item.source_trust_level as i16)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Dedup check for ingestion (spec §4.7 step 3: "deduplicate by URL
    /// against News Store").
    pub async fn get_news_item_by_url(&self, url: &str) -> Result<Option<NewsItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, url, title, content, summary, published_at, source, embedding,
                   player_name, sentiment, category, is_injury_report, injury_status,
                   expected_return_date, impacted_player_ids, trust_level
            FROM news_items WHERE url = $1
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(NewsItem {
                id: r.get("id"),
                url: r.get("url"),
                title: r.get("title"),
                content: r.get("content"),
                summary: r.get("summary"),
                published_at: r.get("published_at"),
                source: r.get("source"),
                source_trust_level: r.get::<i16, _>("trust_level") as u8,
                embedding: r.get("embedding"),
                player_name: r.get("player_name"),
                sentiment: sentiment_from_str(r.get("sentiment"))?,
                category: category_from_str(r.get("category"))?,
                is_injury_report: r.get("is_injury_report"),
                injury_status: r.get("injury_status"),
                expected_return_date: r.get("expected_return_date"),
                impacted_player_ids: r.get("impacted_player_ids"),
            })
        })
        .transpose()
    }

    /// `match_news_documents` RPC (spec §6, §10.5): calls the plpgsql
    /// function defined in `migrations/0002_match_news_documents.sql`,
    /// which does the cosine-similarity ranking and threshold/recency
    /// filtering Postgres-side.
    #[instrument(skip(self, query_embedding))]
    pub async fn match_news_documents(
        &self,
        query_embedding: &[f32],
        match_threshold: f32,
        match_count: i64,
        days_back: i64,
    ) -> Result<Vec<(NewsItem, f32)>> {
        let rows = sqlx::query("SELECT * FROM match_news_documents($1, $2, $3, $4)")
            .bind(query_embedding)
            .bind(match_threshold)
            .bind(match_count as i32)
            .bind(days_back as i32)
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::new();
        for row in rows {
            let similarity: f32 = row.get("similarity");
            out.push((
                NewsItem {
                    id: row.get("id"),
                    url: row.get("url"),
                    title: row.get("title"),
                    content: row.get("content"),
                    summary: row.get("summary"),
                    published_at: row.get("published_at"),
                    source: row.get("source"),
                    source_trust_level: row.get::<i16, _>("trust_level") as u8,
                    embedding: row.get("embedding"),
                    player_name: row.get("player_name"),
                    sentiment: sentiment_from_str(row.get("sentiment"))?,
                    category: category_from_str(row.get("category"))?,
                    is_injury_report: row.get("is_injury_report"),
                    injury_status: row.get("injury_status"),
                    expected_return_date: row.get("expected_return_date"),
                    impacted_player_ids: row.get("impacted_player_ids"),
                },
                similarity,
            ));
        }
        Ok(out)
    }

    #[instrument(skip(self, snapshot))]
    pub async fn upsert_player_status_snapshot(
        &self,
        snapshot: &PlayerStatusSnapshot,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO player_status_snapshots (
                player_id, player_name, pro_team_id, fantasy_team_id, injured, injury_status,
                injury_type, out_for_season, expected_return_date, last_news_date, droppable,
                lineup_locked, trade_locked, source, last_synced_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (player_id) DO UPDATE SET
                player_name = EXCLUDED.player_name,
                pro_team_id = EXCLUDED.pro_team_id,
                fantasy_team_id = EXCLUDED.fantasy_team_id,
                injured = EXCLUDED.injured,
                injury_status = EXCLUDED.injury_status,
                injury_type = EXCLUDED.injury_type,
                out_for_season = EXCLUDED.out_for_season,
                expected_return_date = EXCLUDED.expected_return_date,
                last_news_date = EXCLUDED.last_news_date,
                droppable = EXCLUDED.droppable,
                lineup_locked = EXCLUDED.lineup_locked,
                trade_locked = EXCLUDED.trade_locked,
                last_synced_at = EXCLUDED.last_synced_at
            "#,
        )
        .bind(&snapshot.player_id)
        .bind(&snapshot.player_name)
        .bind(snapshot.pro_team_id)
        .bind(&snapshot.fantasy_team_id)
        .bind(snapshot.injured)
        .bind(&snapshot.injury_status)
        .bind(&snapshot.injury_type)
        .bind(snapshot.out_for_season)
        .bind(&snapshot.expected_return_date)
        .bind(snapshot.last_news_date)
        .bind(snapshot.droppable)
        .bind(snapshot.lineup_locked)
        .bind(snapshot.trade_locked)
        .bind("ESPN")
        .bind(snapshot.last_synced_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_player_status_snapshot(
        &self,
        player_id: &str,
    ) -> Result<Option<PlayerStatusSnapshot>> {
        let row = sqlx::query(
            r#"
            SELECT player_id, player_name, pro_team_id, fantasy_team_id, injured, injury_status,
                   injury_type, out_for_season, expected_return_date, last_news_date, droppable,
                   lineup_locked, trade_locked, last_synced_at
            FROM player_status_snapshots WHERE player_id = $1
            "#,
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| PlayerStatusSnapshot {
            player_id: r.get("player_id"),
            player_name: r.get("player_name"),
            pro_team_id: r.get("pro_team_id"),
            fantasy_team_id: r.get("fantasy_team_id"),
            injured: r.get("injured"),
            injury_status: r.get("injury_status"),
            injury_type: r.get("injury_type"),
            out_for_season: r.get("out_for_season"),
            expected_return_date: r.get("expected_return_date"),
            last_news_date: r.get("last_news_date"),
            droppable: r.get("droppable"),
            lineup_locked: r.get("lineup_locked"),
            trade_locked: r.get("trade_locked"),
            last_synced_at: r.get("last_synced_at"),
        }))
    }

    /// Name-keyed fallback for `get_espn_player_status` (spec §4.6) when the
    /// live ESPN card lookup fails; the one place the status snapshot table
    /// is queried by name rather than id.
    #[instrument(skip(self))]
    pub async fn get_player_status_snapshot_by_name(
        &self,
        player_name: &str,
    ) -> Result<Option<PlayerStatusSnapshot>> {
        let row = sqlx::query(
            r#"
            SELECT player_id, player_name, pro_team_id, fantasy_team_id, injured, injury_status,
                   injury_type, out_for_season, expected_return_date, last_news_date, droppable,
                   lineup_locked, trade_locked, last_synced_at
            FROM player_status_snapshots WHERE player_name ILIKE $1
            LIMIT 1
            "#,
        )
        .bind(player_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| PlayerStatusSnapshot {
            player_id: r.get("player_id"),
            player_name: r.get("player_name"),
            pro_team_id: r.get("pro_team_id"),
            fantasy_team_id: r.get("fantasy_team_id"),
            injured: r.get("injured"),
            injury_status: r.get("injury_status"),
            injury_type: r.get("injury_type"),
            out_for_season: r.get("out_for_season"),
            expected_return_date: r.get("expected_return_date"),
            last_news_date: r.get("last_news_date"),
            droppable: r.get("droppable"),
            lineup_locked: r.get("lineup_locked"),
            trade_locked: r.get("trade_locked"),
            last_synced_at: r.get("last_synced_at"),
        }))
    }

    // ==================== Daily Leaders Store (optional enrichment) ====================

    #[instrument(skip(self, leader))]
    pub async fn upsert_daily_leader(&self, leader: &DailyLeader) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO daily_leaders (
                league_id, season_id, scoring_period_id, period_date, player_id, player_name,
                position_id, pro_team_id, fantasy_points, stats, ownership_percent, source,
                last_synced_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'ESPN', NOW())
            ON CONFLICT (league_id, season_id, scoring_period_id, player_id) DO UPDATE SET
                period_date = EXCLUDED.period_date,
                player_name = EXCLUDED.player_name,
                position_id = EXCLUDED.position_id,
                pro_team_id = EXCLUDED.pro_team_id,
                fantasy_points = EXCLUDED.fantasy_points,
                stats = EXCLUDED.stats,
                ownership_percent = EXCLUDED.ownership_percent,
                last_synced_at = NOW()
            "#,
        )
        .bind(&leader.league_id)
        .bind(&leader.season_id)
        .bind(leader.scoring_period_id)
        .bind(&leader.period_date)
        .bind(leader.player_id.to_string())
        .bind(&leader.player_name)
        .bind(&leader.position_id)
        .bind(leader.pro_team_id)
        .bind(leader.fantasy_points)
        .bind(&leader.stats)
        .bind(leader.ownership_percent)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Last N box scores for one player within a league/season, newest
    /// first (spec §4.6 `get_player_game_log`).
    #[instrument(skip(self))]
    pub async fn get_player_game_log(
        &self,
        league_id: &str,
        season_id: &str,
        player_name: &str,
        last_n_games: i64,
    ) -> Result<Vec<DailyLeader>> {
        let rows = sqlx::query(
            r#"
            SELECT league_id, season_id, scoring_period_id, period_date, player_id, player_name,
                   position_id, pro_team_id, fantasy_points, stats, ownership_percent
            FROM daily_leaders
            WHERE league_id = $1 AND season_id = $2 AND player_name ILIKE $3
            ORDER BY period_date DESC
            LIMIT $4
            "#,
        )
        .bind(league_id)
        .bind(season_id)
        .bind(player_name)
        .bind(last_n_games)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let player_id: String = r.get("player_id");
                DailyLeader {
                    league_id: r.get("league_id"),
                    season_id: r.get("season_id"),
                    scoring_period_id: r.get("scoring_period_id"),
                    period_date: r.get::<chrono::NaiveDate, _>("period_date").to_string(),
                    player_id: player_id.parse().unwrap_or(0),
                    player_name: r.get("player_name"),
                    position_id: r.get("position_id"),
                    pro_team_id: r.get("pro_team_id"),
                    fantasy_points: r.get("fantasy_points"),
                    stats: r.get("stats"),
                    ownership_percent: r.get("ownership_percent"),
                }
            })
            .collect())
    }
}

fn sentiment_str(s: Sentiment) -> &'static str {
    match s {
        Sentiment::Positive => "POSITIVE",
        Sentiment::Negative => "NEGATIVE",
        Sentiment::Neutral => "NEUTRAL",
    }
}

fn sentiment_from_str(s: String) -> Result<Sentiment> {
    match s.as_str() {
        "POSITIVE" => Ok(Sentiment::Positive),
        "NEGATIVE" => Ok(Sentiment::Negative),
        "NEUTRAL" => Ok(Sentiment::Neutral),
        other => Err(FanViseError::Internal(format!(
            "unrecognized sentiment value in storage: {other}"
        ))),
    }
}

fn category_str(c: Category) -> &'static str {
    match c {
        Category::Injury => "Injury",
        Category::Trade => "Trade",
        Category::Lineup => "Lineup",
        Category::Performance => "Performance",
        Category::Other => "Other",
    }
}

fn category_from_str(c: String) -> Result<Category> {
    match c.as_str() {
        "Injury" => Ok(Category::Injury),
        "Trade" => Ok(Category::Trade),
        "Lineup" => Ok(Category::Lineup),
        "Performance" => Ok(Category::Performance),
        "Other" => Ok(Category::Other),
        other => Err(FanViseError::Internal(format!(
            "unrecognized category value in storage: {other}"
        ))),
    }
}
