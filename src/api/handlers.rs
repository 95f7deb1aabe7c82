//! HTTP handlers for the chat endpoint and health check (spec §6).

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use futures::stream;
use tracing::error;
use uuid::Uuid;

use crate::agent::{encode_moves_sentinel, AgentInput, STREAM_READY};
use crate::api::state::AppState;
use crate::api::types::{ChatRequest, ErrorResponse, HealthResponse};
use crate::domain::{ChatMessage, ChatRole};
use crate::optimizer::window::Window;

fn parse_role(raw: &str) -> ChatRole {
    match raw {
        "assistant" => ChatRole::Assistant,
        "tool" => ChatRole::Tool,
        "system" => ChatRole::System,
        _ => ChatRole::User,
    }
}

/// `POST /api/chat` (spec §6): builds an [`AgentInput`] from the request,
/// runs the orchestrator, and returns a plain-text stream carrying the
/// `[[FV_STREAM_READY]]` heartbeat followed by the answer and, when the
/// optimizer path produced ranked moves, the `[[FV_MOVES:...]]` sentinel.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let Some(last_user_message) = request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| m.content.clone())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "messages must contain at least one user entry".to_string(),
            }),
        )
            .into_response();
    };

    let history = request
        .messages
        .iter()
        .map(|m| ChatMessage {
            id: Uuid::new_v4().to_string(),
            role: parse_role(&m.role),
            content: m.content.clone(),
            created_at: Utc::now(),
            tool_call_id: None,
            feedback: None,
            ranked_moves: None,
            fetched_at: None,
            window_start: None,
            window_end: None,
        })
        .collect();

    let input = AgentInput {
        query: last_user_message,
        history,
        team_id: request.active_team_id,
        league_id: request.active_league_id,
        language: request.language,
    };

    let output = match state.orchestrator.run(input).await {
        Ok(output) => output,
        Err(err) => {
            error!(error = %err, "chat turn failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.user_message(),
                }),
            )
                .into_response();
        }
    };

    let mut chunks = vec![STREAM_READY.to_string(), output.answer];
    if !output.ranked_moves.is_empty() {
        let window = Window::default_from(Utc::now());
        chunks.push(encode_moves_sentinel(
            &output.ranked_moves,
            Utc::now(),
            window.start,
            window.end,
        ));
    }

    let body = Body::from_stream(stream::iter(
        chunks.into_iter().map(|chunk| Ok::<_, Infallible>(chunk)),
    ));

    let agent_header = match output.mode {
        crate::domain::Mode::Classic => "classic",
        crate::domain::Mode::Agent => "supervisor",
    };

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        "x-fanvise-ai-provider",
        HeaderValue::from_static(state.orchestrator.provider_name()),
    );
    if let Ok(model) = HeaderValue::from_str(state.orchestrator.model_name()) {
        headers.insert("x-fanvise-ai-model", model);
    }
    headers.insert("x-fanvise-agent", HeaderValue::from_static(agent_header));
    response
}

/// `GET /health` (spec §6): pings the database and reports uptime.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db = match sqlx::query("SELECT 1").execute(state.store.pool()).await {
        Ok(_) => "up",
        Err(_) => "down",
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        db: db.to_string(),
        uptime_secs: state.uptime_seconds(),
    })
}
