use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{instrument, warn};

use crate::config::EspnConfig;
use crate::error::{FanViseError, Result};

const BASE_URL: &str = "https://lm-api-reads.fantasy.espn.com/apis/v3/games";
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const BACKOFF_BASE_MS: [u64; 3] = [1_000, 2_000, 4_000];

/// Typed accessor to ESPN's fantasy read API (spec §4.5, §6 / C3).
/// Tolerates extra response fields; all calls retry up to
/// [`MAX_RETRIES`] times on 5xx/429 with exponential backoff and jitter.
pub struct EspnClient {
    http: reqwest::Client,
    config: EspnConfig,
}

impl EspnClient {
    pub fn new(config: EspnConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    fn league_url(&self) -> String {
        format!(
            "{BASE_URL}/{}/seasons/{}/segments/0/leagues/{}",
            self.config.sport, self.config.season_id, self.config.league_id
        )
    }

    fn cookie_header(&self) -> Option<String> {
        match (&self.config.swid, &self.config.espn_s2) {
            (Some(swid), Some(espn_s2)) => Some(format!("swid={swid}; espn_s2={espn_s2}")),
            _ => None,
        }
    }

    /// Fetch one or more views from the league endpoint (spec §6: notable
    /// views include `mSettings, mTeam, mRoster, mMatchup, mMatchupScore,
    /// mScoreboard, mTransactions2, kona_player_info, ...`).
    #[instrument(skip(self))]
    pub async fn fetch_views(&self, views: &[&str]) -> Result<Value> {
        self.fetch_with_retry(|| {
            let mut request = self.http.get(self.league_url());
            for view in views {
                request = request.query(&[("view", *view)]);
            }
            if let Some(cookie) = self.cookie_header() {
                request = request.header("Cookie", cookie);
            }
            request
        })
        .await
    }

    pub async fn fetch_view(&self, view: &str) -> Result<Value> {
        self.fetch_views(&[view]).await
    }

    /// `kona_player_info` filtered to the free-agent pool (spec §4.5 step 7).
    #[instrument(skip(self))]
    pub async fn fetch_free_agent_pool(&self, limit: u32) -> Result<Value> {
        self.fetch_with_retry(|| {
            let mut request = self
                .http
                .get(self.league_url())
                .query(&[("view", "kona_player_info")])
                .header(
                    "X-Fantasy-Filter",
                    format!(
                        r#"{{"players":{{"filterStatus":{{"value":["FREEAGENT","WAIVERS"]}},"limit":{limit}}}}}"#
                    ),
                );
            if let Some(cookie) = self.cookie_header() {
                request = request.header("Cookie", cookie);
            }
            request
        })
        .await
    }

    /// Single player's `kona_player_info` card, filtered by name substring
    /// (spec §4.6 `get_espn_player_status`).
    #[instrument(skip(self))]
    pub async fn fetch_player_card_by_name(&self, name: &str) -> Result<Value> {
        let escaped = name.replace('"', "");
        self.fetch_with_retry(|| {
            let mut request = self
                .http
                .get(self.league_url())
                .query(&[("view", "kona_player_info")])
                .header(
                    "X-Fantasy-Filter",
                    format!(
                        r#"{{"players":{{"filterNameContains":{{"value":"{escaped}"}},"limit":10}}}}"#
                    ),
                );
            if let Some(cookie) = self.cookie_header() {
                request = request.header("Cookie", cookie);
            }
            request
        })
        .await
    }

    /// Single player's `kona_player_info` card, filtered by id (spec §4.7
    /// status-snapshot job).
    #[instrument(skip(self))]
    pub async fn fetch_player_card(&self, player_id: i64) -> Result<Value> {
        self.fetch_with_retry(|| {
            let mut request = self
                .http
                .get(self.league_url())
                .query(&[("view", "kona_player_info")])
                .header(
                    "X-Fantasy-Filter",
                    format!(r#"{{"players":{{"filterIds":{{"value":[{player_id}]}}}}}}"#),
                );
            if let Some(cookie) = self.cookie_header() {
                request = request.header("Cookie", cookie);
            }
            request
        })
        .await
    }

    /// Shared retry/backoff/jitter loop (spec §5: 3 retries on 5xx/429 with
    /// exponential backoff) used by every ESPN-calling method. `build`
    /// constructs a fresh request per attempt since `RequestBuilder` is
    /// consumed by `send`.
    async fn fetch_with_retry(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<Value> {
        let mut last_err = None;

        for attempt in 0..=MAX_RETRIES {
            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.json::<Value>().await?);
                    }
                    if is_retryable(status) && attempt < MAX_RETRIES {
                        warn!(%status, attempt, "ESPN request failed, retrying");
                        sleep_with_backoff(attempt).await;
                        continue;
                    }
                    return Err(FanViseError::EspnUnavailable(format!(
                        "ESPN returned status {status}"
                    )));
                }
                Err(err) => {
                    last_err = Some(err);
                    if attempt < MAX_RETRIES {
                        sleep_with_backoff(attempt).await;
                        continue;
                    }
                }
            }
        }

        Err(FanViseError::EspnUnavailable(
            last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "exhausted retries".to_string()),
        ))
    }

    pub fn config(&self) -> &EspnConfig {
        &self.config
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

async fn sleep_with_backoff(attempt: u32) {
    let base = BACKOFF_BASE_MS[attempt as usize % BACKOFF_BASE_MS.len()];
    let jitter = rand::thread_rng().gen_range(0..250);
    tokio::time::sleep(Duration::from_millis(base + jitter)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses_are_5xx_or_429() {
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
        assert!(!is_retryable(StatusCode::OK));
    }

    #[test]
    fn league_url_includes_sport_season_and_league() {
        let client = EspnClient::new(EspnConfig {
            league_id: "123".to_string(),
            season_id: "2026".to_string(),
            sport: "fba".to_string(),
            swid: None,
            espn_s2: None,
        })
        .unwrap();
        let url = client.league_url();
        assert!(url.contains("/fba/"));
        assert!(url.contains("/seasons/2026/"));
        assert!(url.contains("/leagues/123"));
    }

    #[test]
    fn cookie_header_absent_without_both_cookies() {
        let client = EspnClient::new(EspnConfig {
            league_id: "1".to_string(),
            season_id: "2026".to_string(),
            sport: "fba".to_string(),
            swid: Some("abc".to_string()),
            espn_s2: None,
        })
        .unwrap();
        assert!(client.cookie_header().is_none());
    }

    #[test]
    fn cookie_header_present_with_both_cookies() {
        let client = EspnClient::new(EspnConfig {
            league_id: "1".to_string(),
            season_id: "2026".to_string(),
            sport: "fba".to_string(),
            swid: Some("abc".to_string()),
            espn_s2: Some("def".to_string()),
        })
        .unwrap();
        assert_eq!(client.cookie_header(), Some("swid=abc; espn_s2=def".to_string()));
    }
}
