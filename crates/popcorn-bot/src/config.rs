//! Configuration types for the leveling bot.
//!
//! Infrastructure settings (NATS, API service) come from environment
//! variables. Gameplay tuning (cooldown, gain and reward ranges,
//! announcement template) comes from an optional YAML file whose path is
//! given by `POPCORN_CONFIG`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use popcorn_progression::ProgressionConfig;
use popcorn_store::ApiConfig;
use serde::Deserialize;

use crate::error::BotError;

/// Complete bot configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// NATS server URL (e.g. `nats://localhost:4222`).
    pub nats_url: String,
    /// API service connection.
    pub api: ApiConfig,
    /// Maximum number of events processed concurrently.
    pub max_in_flight: usize,
    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
    /// Gameplay tuning loaded from `POPCORN_CONFIG`, or defaults.
    pub file: FileConfig,
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `NATS_URL` -- NATS server connection string
    /// - `API_URL` -- API service base URL
    ///
    /// Optional variables:
    /// - `API_TOKEN` -- bearer token for the API service
    /// - `API_TIMEOUT_MS` -- per-request timeout in milliseconds (default 5000)
    /// - `MAX_IN_FLIGHT` -- max events processed concurrently (default 32)
    /// - `LOG_FORMAT` -- `json` for JSON logs (default `text`)
    /// - `POPCORN_CONFIG` -- path to the YAML tuning file
    pub fn from_env() -> Result<Self, BotError> {
        let nats_url = env_var("NATS_URL")?;
        let base_url = env_var("API_URL")?;
        let token = std::env::var("API_TOKEN").ok().filter(|t| !t.is_empty());

        let timeout_ms: u64 = std::env::var("API_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_owned())
            .parse()
            .map_err(|e| BotError::Config(format!("invalid API_TIMEOUT_MS: {e}")))?;

        let max_in_flight: usize = std::env::var("MAX_IN_FLIGHT")
            .unwrap_or_else(|_| "32".to_owned())
            .parse()
            .map_err(|e| BotError::Config(format!("invalid MAX_IN_FLIGHT: {e}")))?;
        if max_in_flight == 0 {
            return Err(BotError::Config("MAX_IN_FLIGHT must be at least 1".to_owned()));
        }

        let log_json = std::env::var("LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let file = match std::env::var("POPCORN_CONFIG") {
            Ok(path) if !path.is_empty() => FileConfig::from_file(Path::new(&path))?,
            _ => FileConfig::default(),
        };

        Ok(Self {
            nats_url,
            api: ApiConfig {
                base_url,
                token,
                timeout: Duration::from_millis(timeout_ms),
            },
            max_in_flight,
            log_json,
            file,
        })
    }
}

/// Contents of the YAML tuning file.
///
/// ```yaml
/// progression:
///   cooldown_secs: 60
///   min_gain: 15
///   max_gain: 25
///   reward_min: 45
///   reward_max: 50
/// announcements:
///   template_path: templates/level_up.j2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileConfig {
    /// Cooldown, gain, and reward ranges.
    #[serde(default)]
    pub progression: ProgressionConfig,

    /// Announcement rendering.
    #[serde(default)]
    pub announcements: AnnouncementConfig,
}

/// Announcement settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AnnouncementConfig {
    /// Level-up template file; the built-in template is used when unset.
    #[serde(default)]
    pub template_path: Option<PathBuf>,
}

impl FileConfig {
    /// Load and validate the tuning file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, BotError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BotError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&contents)
    }

    /// Parse and validate tuning from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, BotError> {
        let config: Self = serde_yml::from_str(yaml)
            .map_err(|e| BotError::Config(format!("failed to parse config YAML: {e}")))?;
        config.progression.validate()?;
        Ok(config)
    }
}

/// Read a required environment variable.
fn env_var(name: &str) -> Result<String, BotError> {
    std::env::var(name)
        .map_err(|e| BotError::Config(format!("missing required env var {name}: {e}")))
}
