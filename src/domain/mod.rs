//! Core data model (spec §3): players, teams, leagues, schedule, matchups,
//! news/status, snapshots, moves, and chat/conversation state.

pub mod chat;
pub mod daily_leader;
pub mod matchup;
pub mod moves;
pub mod news;
pub mod player;
pub mod schedule;
pub mod snapshot;
pub mod team;

pub use chat::{ChatMessage, ChatRole, Conversation, Feedback, Language, Mode};
pub use daily_leader::DailyLeader;
pub use matchup::{Matchup, MatchupStatus};
pub use moves::{
    round_to_tenth, DropScore, MoveRecommendation, SimulateMoveResult, SlotAssignment,
    StreamScore,
};
pub use news::{Category, NewsItem, PlayerStatusSnapshot, Sentiment};
pub use player::{ConfidenceTier, FreeAgent, InjuryStatus, Player, RosterPlayer};
pub use schedule::NbaGame;
pub use snapshot::{IntelligenceSnapshot, ScheduleDensity};
pub use team::{League, Team, TeamRecord};
