//! Intent Router (spec §4.1 / C7): a pure, deterministic classifier over the
//! user's latest chat message. No I/O, no LLM call — a regex table plus two
//! guard clauses evaluated in a fixed order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    TeamAudit,
    MatchupAnalysis,
    LineupOptimization,
    FreeAgentScan,
    PlayerResearch,
    GeneralAdvice,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::TeamAudit => "team_audit",
            Intent::MatchupAnalysis => "matchup_analysis",
            Intent::LineupOptimization => "lineup_optimization",
            Intent::FreeAgentScan => "free_agent_scan",
            Intent::PlayerResearch => "player_research",
            Intent::GeneralAdvice => "general_advice",
        }
    }
}

static NBA_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnba\b").unwrap());

static NON_NBA_SPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(nfl|nhl|mlb|epl|premier league|football|baseball|hockey|soccer)\b")
        .unwrap()
});

static DROP_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bdrop(ping|ped)?\b").unwrap());

static RUMOR_OR_CATASTROPHE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(rumor|rumour|unverified|unconfirmed|group chat|social media|posted that|torn\s+\w+|tore\s+his|tore\s+her|career[- ]ending|allegedly)\b",
    )
    .unwrap()
});

static HYPOTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(assume|assuming|hypothetical(ly)?|given that|what if|suppose)\b").unwrap());

static LINEUP_CONDITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(lineup|start(ing)?|slot|bench|ruled out|out tonight|sit(ting)?)\b").unwrap()
});

static TEAM_AUDIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(comprehensive|full overview|full review|complete overview|audit|ir slot|return timeline|game plan|trade decision|overall team)\b",
    )
    .unwrap()
});

static MATCHUP_ANALYSIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(matchup|current score|am i winning|am i losing|points behind|points ahead|score this week|win this week)\b",
    )
    .unwrap()
});

static LINEUP_OPTIMIZATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(optim\w*|start\s*/\s*sit|start\s+or\s+sit|drop\s*/\s*add|drop\s+and\s+add|waiver pickup|daily lineup|roster decision|who should i start|who should i bench)",
    )
    .unwrap()
});

static FREE_AGENT_SCAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(waiver wire|free agents?|best available|stream\w*|pickups?)\b").unwrap()
});

static PLAYER_RESEARCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(injury|injured|gtd|dtd|questionable|return date|news|status update|game log|box score)\b|\bis\s+[\w .'-]+?\s+playing\b|\bhow has\s+[\w .'-]+?\s+been\b|\bwhat happened to\s+[\w .'-]+\b",
    )
    .unwrap()
});

/// Classify a user query into one of six intents (spec §4.1). Evaluation
/// order is fixed: out-of-scope-sport guard, safety/rumor exclusion,
/// hypothetical guard, then the ordered pattern table, falling back to
/// `general_advice`.
pub fn classify(query: &str) -> Intent {
    let q = query.trim();
    if q.is_empty() {
        return Intent::GeneralAdvice;
    }

    if NON_NBA_SPORT.is_match(q) && !NBA_WORD.is_match(q) {
        return Intent::GeneralAdvice;
    }

    if DROP_WORD.is_match(q) && RUMOR_OR_CATASTROPHE.is_match(q) {
        return Intent::PlayerResearch;
    }

    if HYPOTHETICAL.is_match(q) && LINEUP_CONDITION.is_match(q) {
        return Intent::TeamAudit;
    }

    if TEAM_AUDIT.is_match(q) {
        return Intent::TeamAudit;
    }
    if MATCHUP_ANALYSIS.is_match(q) {
        return Intent::MatchupAnalysis;
    }
    if LINEUP_OPTIMIZATION.is_match(q) {
        return Intent::LineupOptimization;
    }
    if FREE_AGENT_SCAN.is_match(q) {
        return Intent::FreeAgentScan;
    }
    if PLAYER_RESEARCH.is_match(q) {
        return Intent::PlayerResearch;
    }

    Intent::GeneralAdvice
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matchup_keyword_beats_streaming_mention() {
        let q = "Provide a deep-dive review of my current matchup this week, and suggest available healthy free agents to stream to secure the win.";
        assert_eq!(classify(q), Intent::MatchupAnalysis);
    }

    #[test]
    fn safety_exclusion_routes_rumor_drop_to_player_research() {
        let q = "Breaking rumor on a group chat says Giannis tore his ACL. Should I drop him right now?";
        assert_eq!(classify(q), Intent::PlayerResearch);
    }

    #[test]
    fn out_of_scope_sport_without_nba_falls_to_general_advice() {
        let q = "Who should I start in my NFL lineup this week?";
        assert_eq!(classify(q), Intent::GeneralAdvice);
    }

    #[test]
    fn nfl_mention_with_nba_present_is_not_excluded() {
        let q = "Unlike the NFL, in the NBA who is the best waiver wire pickup at center?";
        assert_eq!(classify(q), Intent::FreeAgentScan);
    }

    #[test]
    fn hypothetical_lineup_guard_routes_to_team_audit() {
        let q = "Assuming Embiid is ruled out tonight, what does my lineup look like?";
        assert_eq!(classify(q), Intent::TeamAudit);
    }

    #[test]
    fn comprehensive_overview_is_team_audit() {
        let q = "Give me a comprehensive audit of my whole roster and return timelines for IR slots.";
        assert_eq!(classify(q), Intent::TeamAudit);
    }

    #[test]
    fn start_sit_is_lineup_optimization() {
        let q = "Help me optimize tonight's start/sit decisions.";
        assert_eq!(classify(q), Intent::LineupOptimization);
    }

    #[test]
    fn waiver_wire_is_free_agent_scan() {
        let q = "Who's the best available on the waiver wire this week?";
        assert_eq!(classify(q), Intent::FreeAgentScan);
    }

    #[test]
    fn injury_status_is_player_research() {
        let q = "What's the latest injury news on Tyrese Haliburton?";
        assert_eq!(classify(q), Intent::PlayerResearch);
    }

    #[test]
    fn is_x_playing_pattern_is_player_research() {
        let q = "Is Jayson Tatum playing tonight?";
        assert_eq!(classify(q), Intent::PlayerResearch);
    }

    #[test]
    fn unrelated_question_falls_back_to_general_advice() {
        let q = "What time does the trade deadline usually hit each season?";
        assert_eq!(classify(q), Intent::GeneralAdvice);
    }

    #[test]
    fn empty_query_falls_back_to_general_advice() {
        assert_eq!(classify(""), Intent::GeneralAdvice);
        assert_eq!(classify("   "), Intent::GeneralAdvice);
    }

    #[test]
    fn classification_is_case_insensitive() {
        let q = "WHAT IS THE MATCHUP SCORE THIS WEEK";
        assert_eq!(classify(q), Intent::MatchupAnalysis);
    }

    #[test]
    fn drop_without_rumor_context_is_not_forced_to_player_research() {
        let q = "Should I drop my worst bench player for a better free agent?";
        assert_eq!(classify(q), Intent::FreeAgentScan);
    }
}
