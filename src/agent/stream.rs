//! Structured Stream Encoder (spec §4.2, §6 / C10): the two sentinel
//! tokens layered onto the plain-UTF-8 chat stream.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::MoveRecommendation;

/// Heartbeat sentinel the client strips before rendering (spec §6).
pub const STREAM_READY: &str = "[[FV_STREAM_READY]]";

#[derive(Debug, Serialize)]
struct MovesPayload<'a> {
    moves: &'a [MoveRecommendation],
    #[serde(rename = "fetchedAt")]
    fetched_at: DateTime<Utc>,
    #[serde(rename = "windowStart")]
    window_start: DateTime<Utc>,
    #[serde(rename = "windowEnd")]
    window_end: DateTime<Utc>,
}

/// Terminal structured payload appended to the stream when the optimizer
/// path produced `rankedMoves` (spec §6 `[[FV_MOVES:<base64>]]`).
pub fn encode_moves_sentinel(
    moves: &[MoveRecommendation],
    fetched_at: DateTime<Utc>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> String {
    let payload = MovesPayload {
        moves,
        fetched_at,
        window_start,
        window_end,
    };
    let json = serde_json::to_string(&payload).expect("MoveRecommendation always serializes");
    format!("[[FV_MOVES:{}]]", STANDARD.encode(json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sentinel_round_trips_through_base64() {
        let now = Utc.with_ymd_and_hms(2026, 7, 29, 12, 0, 0).unwrap();
        let sentinel = encode_moves_sentinel(&[], now, now, now);
        assert!(sentinel.starts_with("[[FV_MOVES:"));
        assert!(sentinel.ends_with("]]"));

        let encoded = sentinel
            .strip_prefix("[[FV_MOVES:")
            .and_then(|s| s.strip_suffix("]]"))
            .unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(value["moves"], serde_json::json!([]));
        assert!(value.get("fetchedAt").is_some());
    }

    /// A server-side consumer decodes the sentinel into
    /// [`crate::api::types::MovesSentinelPayload`] rather than a raw `Value`.
    #[test]
    fn sentinel_decodes_into_moves_sentinel_payload() {
        use crate::api::types::MovesSentinelPayload;

        let now = Utc.with_ymd_and_hms(2026, 7, 29, 12, 0, 0).unwrap();
        let sentinel = encode_moves_sentinel(&[], now, now, now);
        let encoded = sentinel
            .strip_prefix("[[FV_MOVES:")
            .and_then(|s| s.strip_suffix("]]"))
            .unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        let payload: MovesSentinelPayload = serde_json::from_slice(&decoded).unwrap();
        assert!(payload.moves.is_empty());
        assert_eq!(payload.fetched_at, now);
        assert_eq!(payload.window_start, now);
        assert_eq!(payload.window_end, now);
    }

    #[test]
    fn stream_ready_is_a_bare_sentinel() {
        assert_eq!(STREAM_READY, "[[FV_STREAM_READY]]");
    }
}
