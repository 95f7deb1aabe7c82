//! LLM provider abstraction (spec §4.2, §6): a single chat contract with
//! two implementations, selected by [`crate::config::AiConfig::resolve_provider`].
//! Grounded in the teacher's xAI/Grok HTTP client idiom (reqwest + bearer
//! auth + JSON body), generalized to tool-calling turns.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{AiConfig, AiProvider};
use crate::error::{FanViseError, Result};

/// One message in the normalized conversation sent to the LLM (spec §4.2
/// "normalized_messages").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmRole {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// A tool declaration passed to the provider (spec §4.6).
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Vendor tool-choice hint (spec §4.2 "tool-call forcing", §9 "capability
/// flag `supportsToolChoiceAny`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    Auto,
    Any,
}

/// One LLM turn's result: either free text or a batch of tool calls, per
/// the ReAct loop's break condition (spec §4.2: "loop breaks when the LLM
/// returns a message with no tool calls").
#[derive(Debug, Clone)]
pub struct LlmTurn {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl LlmTurn {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider id surfaced in `x-fanvise-ai-provider` (spec §6).
    fn provider_name(&self) -> &'static str;
    fn model_name(&self) -> &str;
    /// Whether `tool_choice=any` is respected (spec §9); local models
    /// ignore it and must rely on the system prompt's imperative.
    fn supports_tool_choice_any(&self) -> bool;

    async fn chat(
        &self,
        messages: &[LlmMessage],
        tools: &[ToolSpec],
        tool_choice: ToolChoice,
    ) -> Result<LlmTurn>;
}

/// Resolve the active provider for this process (spec §6 "Selection").
pub fn build_provider(config: &AiConfig) -> std::sync::Arc<dyn LlmProvider> {
    match config.resolve_provider() {
        AiProvider::Gemini => std::sync::Arc::new(GeminiProvider::new(config.clone())),
        AiProvider::Ollama => std::sync::Arc::new(OllamaProvider::new(config.clone())),
    }
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Google Gemini (cloud, tool-calling capable; spec §6 "Cloud").
pub struct GeminiProvider {
    http: Client,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(config: AiConfig) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client builds");
        Self {
            http,
            api_key: config.google_api_key.unwrap_or_default(),
            model: config.gemini_model,
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    FunctionCall { #[serde(rename = "functionCall")] function_call: GeminiFunctionCall },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: GeminiFunctionResponse,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: Value,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiToolDecl>>,
    #[serde(rename = "toolConfig", skip_serializing_if = "Option::is_none")]
    tool_config: Option<GeminiToolConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiToolDecl {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<GeminiFunctionDecl>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDecl {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct GeminiToolConfig {
    #[serde(rename = "functionCallingConfig")]
    function_calling_config: GeminiFunctionCallingConfig,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionCallingConfig {
    mode: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

fn normalize_role(role: LlmRole) -> &'static str {
    match role {
        LlmRole::User | LlmRole::System => "user",
        LlmRole::Assistant => "model",
        LlmRole::Tool => "function",
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn supports_tool_choice_any(&self) -> bool {
        true
    }

    async fn chat(
        &self,
        messages: &[LlmMessage],
        tools: &[ToolSpec],
        tool_choice: ToolChoice,
    ) -> Result<LlmTurn> {
        if self.api_key.is_empty() {
            return Err(FanViseError::LlmUnavailable(
                "GOOGLE_API_KEY is not configured".to_string(),
            ));
        }

        let contents = messages
            .iter()
            .map(|m| GeminiContent {
                role: normalize_role(m.role).to_string(),
                parts: vec![GeminiPart::Text {
                    text: m.content.clone(),
                }],
            })
            .collect();

        let tools_decl = if tools.is_empty() {
            None
        } else {
            Some(vec![GeminiToolDecl {
                function_declarations: tools
                    .iter()
                    .map(|t| GeminiFunctionDecl {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.input_schema.clone(),
                    })
                    .collect(),
            }])
        };

        let tool_config = if tool_choice == ToolChoice::Any && !tools.is_empty() {
            Some(GeminiToolConfig {
                function_calling_config: GeminiFunctionCallingConfig {
                    mode: "ANY".to_string(),
                },
            })
        } else {
            None
        };

        let request = GeminiRequest {
            contents,
            tools: tools_decl,
            tool_config,
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        debug!(model = %self.model, "calling Gemini");
        let response = self.http.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Gemini API error");
            return Err(FanViseError::LlmUnavailable(format!(
                "Gemini returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: GeminiResponse = response.json().await?;
        let parts = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts)
            .unwrap_or_default();

        Ok(collect_turn(parts))
    }
}

fn collect_turn(parts: Vec<GeminiPart>) -> LlmTurn {
    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for (i, part) in parts.into_iter().enumerate() {
        match part {
            GeminiPart::Text { text: t } => text.push_str(&t),
            GeminiPart::FunctionCall { function_call } => tool_calls.push(ToolCall {
                id: format!("call_{i}"),
                name: function_call.name,
                arguments: function_call.args,
            }),
            GeminiPart::FunctionResponse { .. } => {}
        }
    }
    LlmTurn {
        text: if text.is_empty() { None } else { Some(text) },
        tool_calls,
    }
}

/// Ollama (local, tool-calling capable model required; spec §6 "Local").
/// Ignores `tool_choice=any` (spec §9 capability flag).
pub struct OllamaProvider {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(config: AiConfig) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client builds");
        Self {
            http,
            base_url: config.ollama_url,
            model: config.ollama_model,
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    #[serde(rename = "type")]
    kind: String,
    function: OllamaFunctionDecl,
}

#[derive(Debug, Serialize)]
struct OllamaFunctionDecl {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OllamaTool>>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCall {
    function: OllamaToolCallFunction,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCallFunction {
    name: String,
    arguments: Value,
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn supports_tool_choice_any(&self) -> bool {
        false
    }

    async fn chat(
        &self,
        messages: &[LlmMessage],
        tools: &[ToolSpec],
        _tool_choice: ToolChoice,
    ) -> Result<LlmTurn> {
        let messages = messages
            .iter()
            .map(|m| OllamaMessage {
                role: match m.role {
                    LlmRole::System => "system",
                    LlmRole::User => "user",
                    LlmRole::Assistant => "assistant",
                    LlmRole::Tool => "tool",
                }
                .to_string(),
                content: m.content.clone(),
            })
            .collect();

        let tools_decl = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|t| OllamaTool {
                        kind: "function".to_string(),
                        function: OllamaFunctionDecl {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.input_schema.clone(),
                        },
                    })
                    .collect(),
            )
        };

        let request = OllamaRequest {
            model: self.model.clone(),
            messages,
            tools: tools_decl,
            stream: false,
        };

        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        debug!(model = %self.model, "calling Ollama");
        let response = self.http.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(FanViseError::LlmUnavailable(format!(
                "Ollama returned {status}"
            )));
        }

        let parsed: OllamaResponse = response.json().await?;
        let tool_calls = parsed
            .message
            .tool_calls
            .into_iter()
            .enumerate()
            .map(|(i, tc)| ToolCall {
                id: format!("call_{i}"),
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(LlmTurn {
            text: if parsed.message.content.is_empty() {
                None
            } else {
                Some(parsed.message.content)
            },
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_turn_with_tool_calls_reports_has_tool_calls() {
        let turn = LlmTurn {
            text: None,
            tool_calls: vec![ToolCall {
                id: "1".to_string(),
                name: "get_my_roster".to_string(),
                arguments: Value::Null,
            }],
        };
        assert!(turn.has_tool_calls());
    }

    #[test]
    fn llm_turn_without_tool_calls_reports_no_tool_calls() {
        let turn = LlmTurn {
            text: Some("done".to_string()),
            tool_calls: Vec::new(),
        };
        assert!(!turn.has_tool_calls());
    }

    #[test]
    fn collect_turn_joins_text_and_separates_tool_calls() {
        let parts = vec![
            GeminiPart::Text {
                text: "hello ".to_string(),
            },
            GeminiPart::Text {
                text: "world".to_string(),
            },
            GeminiPart::FunctionCall {
                function_call: GeminiFunctionCall {
                    name: "get_my_roster".to_string(),
                    args: serde_json::json!({"teamId": "13"}),
                },
            },
        ];
        let turn = collect_turn(parts);
        assert_eq!(turn.text.as_deref(), Some("hello world"));
        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.tool_calls[0].name, "get_my_roster");
    }
}
