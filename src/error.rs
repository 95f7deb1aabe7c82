use thiserror::Error;

/// Main error type for the FanVise decision core.
#[derive(Error, Debug)]
pub enum FanViseError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // User-facing, recoverable (spec §7) — reported to the user verbatim
    #[error("No league cached for id: {0}")]
    LeagueNotFound(String),

    #[error("Team {team_id} not found in league {league_id}")]
    TeamNotFound { league_id: String, team_id: String },

    #[error("No matchup found for the current scoring period")]
    NoMatchupForPeriod,

    #[error("Roster data is unavailable: {0}")]
    RosterUnavailable(String),

    #[error("No legal moves available in the current window")]
    NoLegalMoves,

    // Transient upstream (spec §5, §7): retried per caller policy, surfaced as degraded
    #[error("ESPN request failed after retries: {0}")]
    EspnUnavailable(String),

    #[error("RSS feed fetch failed: {0}")]
    RssUnavailable(String),

    #[error("LLM provider call failed: {0}")]
    LlmUnavailable(String),

    #[error("Embedding provider call failed: {0}")]
    EmbeddingUnavailable(String),

    // Programmer errors (spec §7): fail loudly, never degrade silently
    #[error("Unknown roster slot label: {0}")]
    UnknownSlot(String),

    #[error("Unknown intent label: {0}")]
    UnknownIntent(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    EmbeddingDimensionMismatch { expected: usize, got: usize },

    // Invariant violations (spec §7): logged, assistant message overwritten
    #[error("Tool-call cap reached ({0} calls)")]
    ToolCallCapReached(u32),

    #[error("Required context missing for tool call: {0}")]
    MissingContext(String),

    #[error("Cache key missing tenant qualifier: {0}")]
    UnkeyedCache(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl FanViseError {
    /// True for the user-facing, recoverable taxonomy branch (spec §7):
    /// these render as a plain sentence rather than a generic failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::LeagueNotFound(_)
                | Self::TeamNotFound { .. }
                | Self::NoMatchupForPeriod
                | Self::RosterUnavailable(_)
                | Self::NoLegalMoves
        )
    }

    /// Render as the sentence shown to the end user; the orchestrator (C8)
    /// never lets a raw error message reach the client (spec §7).
    pub fn user_message(&self) -> String {
        match self {
            Self::LeagueNotFound(id) => {
                format!("No standings data cached for league {id} — try syncing first.")
            }
            Self::TeamNotFound { team_id, league_id } => {
                format!("Team {team_id} isn't in league {league_id} — check the team id.")
            }
            Self::NoMatchupForPeriod => {
                "No matchup is available for the current scoring period.".to_string()
            }
            Self::RosterUnavailable(reason) => {
                format!("Roster data not available right now: {reason}")
            }
            Self::NoLegalMoves => {
                "No legal moves available in the current window.".to_string()
            }
            other => format!("Something went wrong: {other}"),
        }
    }
}

/// Result type alias for FanViseError.
pub type Result<T> = std::result::Result<T, FanViseError>;
