//! Structured extraction of a news item via the bound LLM (spec §4.7 step
//! 4). The LLM is prompted for JSON and the response is parsed leniently,
//! tolerating a surrounding markdown code fence the way cloud chat models
//! commonly wrap JSON replies.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::agent::llm::{LlmMessage, LlmProvider, LlmRole, ToolChoice};
use crate::domain::{Category, Sentiment};
use crate::error::Result;

use super::feed::RawFeedItem;

/// Extractor output (spec §4.7 step 4 field list).
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedFields {
    #[serde(default, rename = "playerName")]
    pub player_name: Option<String>,
    #[serde(default = "default_sentiment")]
    pub sentiment: Sentiment,
    #[serde(default = "default_category")]
    pub category: Category,
    #[serde(default, rename = "impactBackup")]
    pub impact_backup: Option<String>,
    #[serde(default, rename = "isInjuryReport")]
    pub is_injury_report: bool,
    #[serde(default, rename = "injuryStatus")]
    pub injury_status: Option<String>,
    #[serde(default, rename = "expectedReturnDate")]
    pub expected_return_date: Option<String>,
    #[serde(default, rename = "impactedPlayerIds")]
    pub impacted_player_ids: Vec<String>,
}

impl Default for ExtractedFields {
    fn default() -> Self {
        Self {
            player_name: None,
            sentiment: default_sentiment(),
            category: default_category(),
            impact_backup: None,
            is_injury_report: false,
            injury_status: None,
            expected_return_date: None,
            impacted_player_ids: Vec::new(),
        }
    }
}

fn default_sentiment() -> Sentiment {
    Sentiment::Neutral
}

fn default_category() -> Category {
    Category::Other
}

const EXTRACTION_SYSTEM_PROMPT: &str = r#"You extract structured fantasy-basketball metadata from one news article.
Reply with ONLY a JSON object, no prose, no markdown fence, matching this shape:
{"playerName": string|null, "sentiment": "POSITIVE"|"NEGATIVE"|"NEUTRAL", "category": "Injury"|"Trade"|"Lineup"|"Performance"|"Other", "impactBackup": string|null, "isInjuryReport": boolean, "injuryStatus": string|null, "expectedReturnDate": string|null, "impactedPlayerIds": string[]}
If a field is unknown, use null (or false/[] for booleans/arrays). Never fabricate a player name that isn't in the article."#;

/// Call the LLM once to extract structured fields from `item`. On any parse
/// failure, returns the default (category Other, neutral) rather than
/// failing the whole ingestion batch — the gate in `ingest.rs` then drops
/// non-NBA items that also extracted as `Other`.
pub async fn extract(llm: &dyn LlmProvider, item: &RawFeedItem) -> Result<ExtractedFields> {
    let body = format!(
        "Title: {}\n\nSummary: {}\n\nSource: {}",
        item.title, item.summary, item.source
    );
    let messages = vec![
        LlmMessage {
            role: LlmRole::System,
            content: EXTRACTION_SYSTEM_PROMPT.to_string(),
            tool_call_id: None,
            tool_calls: None,
        },
        LlmMessage {
            role: LlmRole::User,
            content: body,
            tool_call_id: None,
            tool_calls: None,
        },
    ];

    let turn = llm.chat(&messages, &[], ToolChoice::Auto).await?;
    let Some(text) = turn.text else {
        return Ok(ExtractedFields::default());
    };

    match parse_json_object(&text) {
        Some(fields) => Ok(fields),
        None => {
            warn!(title = %item.title, "extractor returned unparsable JSON, defaulting to Other/Neutral");
            Ok(ExtractedFields::default())
        }
    }
}

fn parse_json_object(text: &str) -> Option<ExtractedFields> {
    let trimmed = strip_code_fence(text.trim());
    let value: Value = serde_json::from_str(trimmed).ok()?;
    serde_json::from_value(value).ok()
}

fn strip_code_fence(text: &str) -> &str {
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_fence() {
        let wrapped = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fence(wrapped), "{\"a\": 1}");
    }

    #[test]
    fn parses_well_formed_extraction() {
        let raw = r#"{"playerName": "Test Player", "sentiment": "NEGATIVE", "category": "Injury", "isInjuryReport": true, "injuryStatus": "OUT", "impactedPlayerIds": ["1"]}"#;
        let fields = parse_json_object(raw).expect("parses");
        assert_eq!(fields.player_name.as_deref(), Some("Test Player"));
        assert!(fields.is_injury_report);
        assert_eq!(fields.impacted_player_ids, vec!["1".to_string()]);
    }

    #[test]
    fn unparsable_text_returns_none() {
        assert!(parse_json_object("not json at all").is_none());
    }
}
