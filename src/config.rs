use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure for the FanVise decision core.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub espn: EspnConfig,
    pub ai: AiConfig,
    pub embedding: EmbeddingConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// API server port (default: 8081).
    #[serde(default)]
    pub api_port: Option<u16>,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnConfig {
    pub league_id: String,
    pub season_id: String,
    #[serde(default = "default_sport")]
    pub sport: String,
    /// Cookies required for private leagues.
    #[serde(default)]
    pub swid: Option<String>,
    #[serde(default)]
    pub espn_s2: Option<String>,
}

fn default_sport() -> String {
    "fba".to_string()
}

/// Which LLM provider backs the agent orchestrator (spec §6).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AiProvider {
    Gemini,
    Ollama,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub google_api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default)]
    pub use_local_ai: bool,
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    /// Managed deploys force the cloud provider regardless of `use_local_ai`
    /// (spec §6, "Selection" rule).
    #[serde(default)]
    pub force_cloud: bool,
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_ollama_model() -> String {
    "llama3.1".to_string()
}

impl AiConfig {
    /// Resolve which provider is active for this process (spec §6 Selection rule).
    pub fn resolve_provider(&self) -> AiProvider {
        if self.force_cloud {
            return AiProvider::Gemini;
        }
        if self.use_local_ai {
            AiProvider::Ollama
        } else {
            AiProvider::Gemini
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    Gemini,
    Ollama,
    Openai,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: EmbeddingProviderKind,
    #[serde(default = "default_gemini_embedding_model")]
    pub gemini_embedding_model: String,
    #[serde(default = "default_ollama_embedding_model")]
    pub ollama_embedding_model: String,
    /// Deployment-pinned vector width; ingestion fails loudly on mismatch (spec §3.2, §9).
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
}

fn default_embedding_provider() -> EmbeddingProviderKind {
    EmbeddingProviderKind::Gemini
}
fn default_gemini_embedding_model() -> String {
    "text-embedding-004".to_string()
}
fn default_ollama_embedding_model() -> String {
    "nomic-embed-text".to_string()
}
fn default_embedding_dimension() -> usize {
    768
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// RSS ingestion configuration (C11).
#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    #[serde(default = "default_ingest_concurrency")]
    pub ingest_concurrency: usize,
    #[serde(default = "default_card_throttle_ms")]
    pub status_card_throttle_ms: u64,
    #[serde(default = "default_search_days_back")]
    pub search_days_back: i64,
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            ingest_concurrency: default_ingest_concurrency(),
            status_card_throttle_ms: default_card_throttle_ms(),
            search_days_back: default_search_days_back(),
            match_threshold: default_match_threshold(),
        }
    }
}

fn default_ingest_concurrency() -> usize {
    5
}
fn default_card_throttle_ms() -> u64 {
    120
}
fn default_search_days_back() -> i64 {
    14
}
fn default_match_threshold() -> f64 {
    0.25
}

/// Optimizer Engine tunables (C4/C9).
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default = "default_league_avg_fpts")]
    pub default_league_avg_fpts: f64,
    #[serde(default = "default_max_drop_candidates")]
    pub max_drop_candidates: usize,
    #[serde(default = "default_max_stream_candidates")]
    pub max_stream_candidates: usize,
    #[serde(default = "default_top_n_moves")]
    pub top_n_moves: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            default_league_avg_fpts: default_league_avg_fpts(),
            max_drop_candidates: default_max_drop_candidates(),
            max_stream_candidates: default_max_stream_candidates(),
            top_n_moves: default_top_n_moves(),
        }
    }
}

fn default_league_avg_fpts() -> f64 {
    25.0
}
fn default_max_drop_candidates() -> usize {
    5
}
fn default_max_stream_candidates() -> usize {
    10
}
fn default_top_n_moves() -> usize {
    3
}

impl AppConfig {
    /// Load configuration from files and environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from either a config directory or a single TOML file.
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_path = config_dir.as_ref();

        let mut builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("database.max_connections", 5)?
            .set_default("api_port", 8081)?;

        if config_path.is_file() {
            builder = builder.add_source(File::from(config_path).required(true));
        } else {
            builder = builder
                .add_source(File::from(config_path.join("default.toml")).required(false))
                .add_source(
                    File::from(config_path.join(
                        std::env::var("FANVISE_ENV").unwrap_or_else(|_| "development".to_string()),
                    ))
                    .required(false),
                );
        }

        builder = builder.add_source(
            Environment::with_prefix("FANVISE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut cfg: Self = builder.build()?.try_deserialize()?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Apply the handful of spec-mandated env vars (§6) that don't follow the
    /// `FANVISE__section__field` convention because they're shared with the
    /// upstream (non-Rust) frontend.
    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_string(&["NEXT_PUBLIC_ESPN_LEAGUE_ID"]) {
            self.espn.league_id = v;
        }
        if let Some(v) = env_string(&["NEXT_PUBLIC_ESPN_SEASON_ID"]) {
            self.espn.season_id = v;
        }
        if let Some(v) = env_string(&["NEXT_PUBLIC_ESPN_SPORT"]) {
            self.espn.sport = v;
        }
        if let Some(v) = env_string(&["ESPN_SWID"]) {
            self.espn.swid = Some(v);
        }
        if let Some(v) = env_string(&["ESPN_S2"]) {
            self.espn.espn_s2 = Some(v);
        }
        if let Some(v) = env_string(&["GOOGLE_API_KEY"]) {
            self.ai.google_api_key = Some(v);
        }
        if let Some(v) = env_string(&["GEMINI_MODEL"]) {
            self.ai.gemini_model = v;
        }
        if let Some(v) = env_string(&["GEMINI_EMBEDDING_MODEL"]) {
            self.embedding.gemini_embedding_model = v;
        }
        if let Some(v) = env_bool(&["USE_LOCAL_AI"]) {
            self.ai.use_local_ai = v;
        }
        if let Some(v) = env_string(&["OLLAMA_URL"]) {
            self.ai.ollama_url = v;
        }
        if let Some(v) = env_string(&["OLLAMA_MODEL"]) {
            self.ai.ollama_model = v;
        }
        if let Some(v) = env_string(&["OLLAMA_EMBEDDING_MODEL"]) {
            self.embedding.ollama_embedding_model = v;
        }
        if let Some(v) = env_string(&["EMBEDDING_PROVIDER"]) {
            self.embedding.provider = match v.to_ascii_lowercase().as_str() {
                "ollama" => EmbeddingProviderKind::Ollama,
                "openai" => EmbeddingProviderKind::Openai,
                _ => EmbeddingProviderKind::Gemini,
            };
        }
        if let Some(v) = env_bool(&["FANVISE_FORCE_CLOUD_AI"]) {
            self.ai.force_cloud = v;
        }
        if let Some(v) = env_string(&["DATABASE_URL"]) {
            self.database.url = v;
        }
        if let Some(v) = env_u16(&["FANVISE_API_PORT"]) {
            self.api_port = Some(v);
        }
    }

    /// Validate configuration values; returns problems (empty = valid).
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.espn.league_id.trim().is_empty() {
            errors.push("espn.league_id must not be empty".to_string());
        }
        if self.espn.season_id.trim().is_empty() {
            errors.push("espn.season_id must not be empty".to_string());
        }
        if self.embedding.dimension == 0 {
            errors.push("embedding.dimension must be > 0".to_string());
        }
        if self.optimizer.top_n_moves == 0 {
            errors.push("optimizer.top_n_moves must be > 0".to_string());
        }
        if self.database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn env_string(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(v) = std::env::var(key) {
            if !v.is_empty() {
                return Some(v);
            }
        }
    }
    None
}

fn env_u16(keys: &[&str]) -> Option<u16> {
    env_string(keys).and_then(|v| v.parse::<u16>().ok())
}

fn env_bool(keys: &[&str]) -> Option<bool> {
    env_string(keys).and_then(|v| parse_bool_like(&v))
}

fn parse_bool_like(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> AppConfig {
        AppConfig {
            espn: EspnConfig {
                league_id: "123".to_string(),
                season_id: "2026".to_string(),
                sport: "fba".to_string(),
                swid: None,
                espn_s2: None,
            },
            ai: AiConfig {
                google_api_key: None,
                gemini_model: default_gemini_model(),
                use_local_ai: false,
                ollama_url: default_ollama_url(),
                ollama_model: default_ollama_model(),
                force_cloud: false,
            },
            embedding: EmbeddingConfig {
                provider: EmbeddingProviderKind::Gemini,
                gemini_embedding_model: default_gemini_embedding_model(),
                ollama_embedding_model: default_ollama_embedding_model(),
                dimension: 768,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/fanvise".to_string(),
                max_connections: 5,
            },
            logging: LoggingConfig::default(),
            api_port: Some(8081),
            news: NewsConfig::default(),
            optimizer: OptimizerConfig::default(),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_league_id() {
        let mut cfg = sample_config();
        cfg.espn.league_id = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_resolve_provider_force_cloud_wins() {
        let mut ai = sample_config().ai;
        ai.use_local_ai = true;
        ai.force_cloud = true;
        assert_eq!(ai.resolve_provider(), AiProvider::Gemini);
    }

    #[test]
    fn test_resolve_provider_local() {
        let mut ai = sample_config().ai;
        ai.use_local_ai = true;
        assert_eq!(ai.resolve_provider(), AiProvider::Ollama);
    }

    #[test]
    fn test_parse_bool_like() {
        assert_eq!(parse_bool_like("YES"), Some(true));
        assert_eq!(parse_bool_like("0"), Some(false));
        assert_eq!(parse_bool_like("maybe"), None);
    }
}
