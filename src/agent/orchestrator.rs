//! Agent Orchestrator (spec §4.2 / C8): `classify_intent → (run_optimizer |
//! agent ⇄ tools) → synthesize`. The only component that talks to the LLM
//! provider and the tool registry together.

use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::agent::llm::{LlmMessage, LlmProvider, LlmRole, LlmTurn, ToolCall, ToolChoice};
use crate::agent::protocol::{AgentInput, AgentOutput, AgentState, MAX_TOOL_CALLS};
use crate::agent::tools::{inject_context, Toolbox};
use crate::domain::{ChatMessage, ChatRole};
use crate::error::Result;
use crate::intent::{classify, Intent};
use crate::optimizer::{build_ranked_moves, league_avg_fpts, template_recommendation, DEFAULT_LEAGUE_AVG_FPTS};
use crate::snapshot_builder::SnapshotBuilder;
use crate::store::Store;

const SYSTEM_PROMPT: &str = "You are FanVise, a fantasy basketball co-manager. \
Use the provided tools to fetch real data before answering roster, matchup, \
or player questions — never guess at live state.";

static ROSTER_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(roster|standings|matchup|lineup|free agent|waiver)\b").unwrap()
});

static PLAN_LOOKING_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"name"\s*:\s*"get_|i('| wi)ll (now )?(call|invoke|use) the"#).unwrap());

const FORCING_INTENTS: &[Intent] = &[
    Intent::TeamAudit,
    Intent::MatchupAnalysis,
    Intent::FreeAgentScan,
    Intent::PlayerResearch,
];

/// Drives the graph described in spec §4.2. Holds the collaborators needed
/// by both branches: the optimizer fast-path and the ReAct loop.
pub struct Orchestrator {
    llm: Arc<dyn LlmProvider>,
    tools: Arc<Toolbox>,
    snapshots: Arc<SnapshotBuilder>,
    store: Arc<Store>,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        tools: Arc<Toolbox>,
        snapshots: Arc<SnapshotBuilder>,
        store: Arc<Store>,
    ) -> Self {
        Self {
            llm,
            tools,
            snapshots,
            store,
        }
    }

    /// Provider id surfaced in the `x-fanvise-ai-provider` response header.
    pub fn provider_name(&self) -> &'static str {
        self.llm.provider_name()
    }

    /// Model id surfaced in the `x-fanvise-ai-model` response header.
    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    #[instrument(skip(self, input))]
    pub async fn run(&self, input: AgentInput) -> Result<AgentOutput> {
        let mut state = AgentState::from_input(&input);
        let mut debug_context = Vec::new();

        let intent = classify(&input.query);
        state.intent = Some(intent);
        debug_context.push(format!("intent={}", intent.as_str()));

        let mode = if self.should_run_optimizer(intent, &state) {
            self.run_optimizer(&mut state, &mut debug_context).await?;
            crate::domain::Mode::Classic
        } else {
            self.run_react_loop(&input, &mut state, &mut debug_context).await?;
            self.synthesize(&mut state, &mut debug_context);
            crate::domain::Mode::Agent
        };

        Ok(state.into_output(debug_context, mode))
    }

    fn should_run_optimizer(&self, intent: Intent, state: &AgentState) -> bool {
        intent == Intent::LineupOptimization && state.team_id.is_some() && state.league_id.is_some()
    }

    /// `run_optimizer` branch (spec §4.4): deterministic pipeline, a single
    /// optional LLM call at the end, no tool messages added to history.
    async fn run_optimizer(&self, state: &mut AgentState, debug_context: &mut Vec<String>) -> Result<()> {
        let team_id = state.team_id.clone().expect("checked by should_run_optimizer");
        let league_id = state.league_id.clone().expect("checked by should_run_optimizer");

        let snapshot = self.snapshots.build(&league_id, &team_id).await?;
        let now = Utc::now();
        let roster = snapshot.my_roster();
        let window_start = now;
        let window_end = crate::optimizer::Window::default_from(now).end;
        let games = self.store.games_in_range(window_start, window_end).await?;

        let avg = league_avg_fpts(roster);
        let avg = if avg <= 0.0 { DEFAULT_LEAGUE_AVG_FPTS } else { avg };
        debug_context.push(format!("leagueAvgFpts={avg:.1}"));

        let ranked = build_ranked_moves(roster, &snapshot.league.roster_slots, &snapshot.free_agents, now, &games);
        let narrative = self.compose_optimizer_narrative(&ranked).await;

        state.ranked_moves = ranked;
        state.answer = Some(narrative);
        Ok(())
    }

    /// Step 9 of spec §4.4: a single optional LLM call, falling back to the
    /// templated narrative on any failure.
    async fn compose_optimizer_narrative(&self, ranked: &[crate::domain::MoveRecommendation]) -> String {
        if ranked.is_empty() {
            return template_recommendation(ranked);
        }
        let prompt = format!(
            "Summarize these ranked roster moves for a fantasy manager in 2-3 sentences: {}",
            serde_json::to_string(ranked).unwrap_or_default()
        );
        let messages = vec![LlmMessage {
            role: LlmRole::User,
            content: prompt,
            tool_call_id: None,
            tool_calls: None,
        }];
        match self.llm.chat(&messages, &[], ToolChoice::Auto).await {
            Ok(turn) if turn.text.as_deref().is_some_and(|t| !t.trim().is_empty()) => turn.text.unwrap(),
            Ok(_) => template_recommendation(ranked),
            Err(err) => {
                warn!(%err, "optimizer narrative LLM call failed, using template");
                template_recommendation(ranked)
            }
        }
    }

    /// `agent ⇄ tools` ReAct loop (spec §4.2).
    async fn run_react_loop(
        &self,
        input: &AgentInput,
        state: &mut AgentState,
        debug_context: &mut Vec<String>,
    ) -> Result<()> {
        state.messages.push(ChatMessage {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::User,
            content: input.query.clone(),
            created_at: Utc::now(),
            tool_call_id: None,
            feedback: None,
            ranked_moves: None,
            fetched_at: None,
            window_start: None,
            window_end: None,
        });

        let mut ran_any_tool = false;
        let tool_specs = self.tools.specs();

        loop {
            let normalized = self.normalize_messages(input, state);
            let tool_choice = self.tool_choice_for_turn(input, state, ran_any_tool);

            let turn: LlmTurn = self.llm.chat(&normalized, &tool_specs, tool_choice).await?;
            state.tool_call_count += 1;
            debug_context.push(format!("turn {} tool_calls={}", state.tool_call_count, turn.tool_calls.len()));

            if !turn.has_tool_calls() {
                if let Some(text) = turn.text {
                    self.push_assistant_message(state, text);
                }
                return Ok(());
            }

            if let Some(text) = &turn.text {
                if !text.trim().is_empty() {
                    self.push_assistant_message(state, text.clone());
                }
            }

            for call in &turn.tool_calls {
                self.execute_tool_call(call, state).await;
                ran_any_tool = true;
            }

            if state.tool_call_cap_reached() {
                state.error = Some(format!("Tool-call cap reached ({MAX_TOOL_CALLS} calls)"));
                return Ok(());
            }
        }
    }

    async fn execute_tool_call(&self, call: &ToolCall, state: &mut AgentState) {
        let args = inject_context(
            &call.name,
            call.arguments.clone(),
            state.team_id.as_deref(),
            state.league_id.as_deref(),
        );

        let result = match args {
            Ok(args) => match self.tools.call(&call.name, args).await {
                Ok(value) => value,
                Err(err) => {
                    warn!(tool = %call.name, %err, "tool call failed");
                    serde_json::json!({ "error": err.to_string() })
                }
            },
            Err(err) => {
                warn!(tool = %call.name, %err, "tool call context injection failed");
                serde_json::json!({ "error": err.to_string() })
            }
        };

        state.messages.push(ChatMessage {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::Tool,
            content: serde_json::to_string(&result).unwrap_or_default(),
            created_at: Utc::now(),
            tool_call_id: Some(call.id.clone()),
            feedback: None,
            ranked_moves: None,
            fetched_at: None,
            window_start: None,
            window_end: None,
        });
    }

    fn push_assistant_message(&self, state: &mut AgentState, text: String) {
        state.answer = Some(text.clone());
        state.messages.push(ChatMessage {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::Assistant,
            content: text,
            created_at: Utc::now(),
            tool_call_id: None,
            feedback: None,
            ranked_moves: None,
            fetched_at: None,
            window_start: None,
            window_end: None,
        });
    }

    /// Builds `[system_prompt + context_note + language_note] + normalized_messages`
    /// (spec §4.2), JSON-serializing non-string tool content along the way.
    fn normalize_messages(&self, input: &AgentInput, state: &AgentState) -> Vec<LlmMessage> {
        let mut messages = vec![LlmMessage {
            role: LlmRole::System,
            content: SYSTEM_PROMPT.to_string(),
            tool_call_id: None,
            tool_calls: None,
        }];

        let context_note = format!(
            "Active context: teamId={}, leagueId={}. These are auto-injected into tool calls; invoke tools, don't describe them.",
            state.team_id.as_deref().unwrap_or("none"),
            state.league_id.as_deref().unwrap_or("none"),
        );
        messages.push(LlmMessage {
            role: LlmRole::System,
            content: context_note,
            tool_call_id: None,
            tool_calls: None,
        });

        if input.language == crate::domain::Language::El {
            messages.push(LlmMessage {
                role: LlmRole::System,
                content: "Reply in Greek.".to_string(),
                tool_call_id: None,
                tool_calls: None,
            });
        }

        for msg in &state.messages {
            messages.push(self.to_llm_message(msg));
        }

        messages
    }

    fn to_llm_message(&self, msg: &ChatMessage) -> LlmMessage {
        let role = match msg.role {
            ChatRole::User => LlmRole::User,
            ChatRole::Assistant => LlmRole::Assistant,
            ChatRole::Tool => LlmRole::Tool,
            ChatRole::System => LlmRole::System,
        };
        LlmMessage {
            role,
            content: msg.content.clone(),
            tool_call_id: msg.tool_call_id.clone(),
            tool_calls: None,
        }
    }

    /// Tool-call forcing hint (spec §4.2): only on the first turn, only
    /// when context is fully present and the query looks data-dependent,
    /// and only for providers that honor it.
    fn tool_choice_for_turn(&self, input: &AgentInput, state: &AgentState, ran_any_tool: bool) -> ToolChoice {
        decide_tool_choice(
            self.llm.supports_tool_choice_any(),
            ran_any_tool || state.tool_call_count > 0,
            state.team_id.is_some() && state.league_id.is_some(),
            state.intent,
            &input.query,
        )
    }

    /// `synthesize` (spec §4.2): extract the last assistant text, and
    /// rewrite a plan-looking response into a retry prompt when no tool
    /// has actually run yet.
    fn synthesize(&self, state: &mut AgentState, debug_context: &mut Vec<String>) {
        if let Some(err) = &state.error {
            let note = format!("{err} — analysis was capped before a final answer could be produced.");
            state.answer = Some(note);
            return;
        }

        let ran_any_tool = state
            .messages
            .iter()
            .any(|m| matches!(m.role, ChatRole::Tool));

        if !ran_any_tool {
            if let Some(text) = &state.answer {
                if PLAN_LOOKING_TEXT.is_match(text) {
                    debug_context.push("synthesize: rewrote plan-looking text".to_string());
                    state.answer = Some(
                        "I need to fetch your data first — let me pull that up and get back to you."
                            .to_string(),
                    );
                }
            }
        }
    }
}

/// Pulled out of [`Orchestrator::tool_choice_for_turn`] so the forcing rule
/// can be unit-tested without a live LLM provider.
fn decide_tool_choice(
    provider_supports_any: bool,
    already_turned: bool,
    has_context: bool,
    intent: Option<Intent>,
    query: &str,
) -> ToolChoice {
    if already_turned || !provider_supports_any {
        return ToolChoice::Auto;
    }
    let intent_wants_tools = intent.is_some_and(|i| FORCING_INTENTS.contains(&i));
    let keyword_match = ROSTER_KEYWORD.is_match(query);

    if has_context && (intent_wants_tools || keyword_match) {
        ToolChoice::Any
    } else {
        ToolChoice::Auto
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forces_any_on_first_turn_with_context_and_matching_intent() {
        let choice = decide_tool_choice(true, false, true, Some(Intent::MatchupAnalysis), "how am I doing?");
        assert_eq!(choice, ToolChoice::Any);
    }

    #[test]
    fn forces_any_on_keyword_match_even_without_matching_intent() {
        let choice = decide_tool_choice(true, false, true, Some(Intent::GeneralAdvice), "show me my roster");
        assert_eq!(choice, ToolChoice::Any);
    }

    #[test]
    fn stays_auto_without_context() {
        let choice = decide_tool_choice(true, false, false, Some(Intent::TeamAudit), "audit my team");
        assert_eq!(choice, ToolChoice::Auto);
    }

    #[test]
    fn stays_auto_after_the_first_turn() {
        let choice = decide_tool_choice(true, true, true, Some(Intent::TeamAudit), "audit my team");
        assert_eq!(choice, ToolChoice::Auto);
    }

    #[test]
    fn stays_auto_when_provider_does_not_support_any() {
        let choice = decide_tool_choice(false, false, true, Some(Intent::TeamAudit), "audit my team");
        assert_eq!(choice, ToolChoice::Auto);
    }

    #[test]
    fn plan_looking_text_is_detected() {
        assert!(PLAN_LOOKING_TEXT.is_match(r#"I'll call the {"name":"get_my_roster"} tool"#));
        assert!(!PLAN_LOOKING_TEXT.is_match("Your team is in great shape this week."));
    }
}
