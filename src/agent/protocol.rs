//! Agent Orchestrator state and message types (spec §4.2 / C8). `AgentState`
//! is the graph's shared mutable frame, threaded node-to-node exactly as the
//! contract describes: `messages` appended, `toolCallCount` incremented once
//! per LLM turn, everything else last-writer-wins.

use crate::domain::{ChatMessage, Language, Mode, MoveRecommendation};
use crate::intent::Intent;

/// Tool-call cap per turn (spec §4.2, §5, §8): the 16th call is blocked.
pub const MAX_TOOL_CALLS: u32 = 15;

/// `run(input)` / `stream(input)` contract (spec §4.2).
#[derive(Debug, Clone)]
pub struct AgentInput {
    pub query: String,
    pub history: Vec<ChatMessage>,
    pub team_id: Option<String>,
    pub league_id: Option<String>,
    pub language: Language,
}

/// `run(input) -> {answer, intent, toolCallCount, rankedMoves, debugContext}`
/// (spec §4.2). `mode` resolves the `x-fanvise-agent` response header
/// (spec §6): [`Mode::Classic`] for the deterministic optimizer fast-path,
/// [`Mode::Agent`] for the ReAct tool-calling loop ("supervisor").
#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub answer: String,
    pub intent: Intent,
    pub tool_call_count: u32,
    pub ranked_moves: Vec<MoveRecommendation>,
    pub debug_context: Vec<String>,
    pub mode: Mode,
}

/// The orchestrator graph's shared state (spec §4.2 "State").
#[derive(Debug, Clone)]
pub struct AgentState {
    pub messages: Vec<ChatMessage>,
    pub team_id: Option<String>,
    pub league_id: Option<String>,
    pub language: Language,
    pub intent: Option<Intent>,
    pub answer: Option<String>,
    pub tool_call_count: u32,
    pub error: Option<String>,
    pub ranked_moves: Vec<MoveRecommendation>,
}

impl AgentState {
    pub fn from_input(input: &AgentInput) -> Self {
        Self {
            messages: input.history.clone(),
            team_id: input.team_id.clone(),
            league_id: input.league_id.clone(),
            language: input.language,
            intent: None,
            answer: None,
            tool_call_count: 0,
            error: None,
            ranked_moves: Vec::new(),
        }
    }

    pub fn tool_call_cap_reached(&self) -> bool {
        self.tool_call_count >= MAX_TOOL_CALLS
    }

    pub fn into_output(self, debug_context: Vec<String>, mode: Mode) -> AgentOutput {
        AgentOutput {
            answer: self.answer.unwrap_or_default(),
            intent: self.intent.unwrap_or(Intent::GeneralAdvice),
            tool_call_count: self.tool_call_count,
            ranked_moves: self.ranked_moves,
            debug_context,
            mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChatRole;
    use chrono::Utc;

    fn input() -> AgentInput {
        AgentInput {
            query: "How's my matchup looking?".to_string(),
            history: vec![ChatMessage {
                id: "1".to_string(),
                role: ChatRole::User,
                content: "hi".to_string(),
                created_at: Utc::now(),
                tool_call_id: None,
                feedback: None,
                ranked_moves: None,
                fetched_at: None,
                window_start: None,
                window_end: None,
            }],
            team_id: Some("13".to_string()),
            league_id: Some("L1".to_string()),
            language: Language::En,
        }
    }

    #[test]
    fn state_carries_history_and_context_forward() {
        let state = AgentState::from_input(&input());
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.team_id.as_deref(), Some("13"));
        assert_eq!(state.tool_call_count, 0);
    }

    #[test]
    fn cap_reached_exactly_at_max() {
        let mut state = AgentState::from_input(&input());
        state.tool_call_count = MAX_TOOL_CALLS - 1;
        assert!(!state.tool_call_cap_reached());
        state.tool_call_count = MAX_TOOL_CALLS;
        assert!(state.tool_call_cap_reached());
    }

    #[test]
    fn into_output_defaults_missing_answer_to_empty_string() {
        let state = AgentState::from_input(&input());
        let output = state.into_output(vec![], Mode::Agent);
        assert_eq!(output.answer, "");
        assert_eq!(output.intent, Intent::GeneralAdvice);
    }
}
