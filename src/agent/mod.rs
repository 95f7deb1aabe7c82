//! Agent subsystem (spec §4.2, §4.6 / C6, C8, C10): LLM provider
//! abstraction, the orchestrator graph, the tool registry it drives, and
//! the structured stream encoder layered on top of the chat response.

pub mod llm;
pub mod orchestrator;
pub mod protocol;
pub mod stream;
pub mod tools;

pub use llm::{build_provider, LlmMessage, LlmProvider, LlmRole, LlmTurn, ToolChoice, ToolSpec};
pub use orchestrator::Orchestrator;
pub use protocol::{AgentInput, AgentOutput, AgentState, MAX_TOOL_CALLS};
pub use stream::{encode_moves_sentinel, STREAM_READY};
pub use tools::Toolbox;
