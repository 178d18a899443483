//! Error types for the leveling bot.
//!
//! Uses `thiserror` for typed errors that surface through the whole intake
//! pipeline: configuration, NATS connectivity, store calls, template
//! rendering, payload parsing.

use popcorn_progression::ProgressionConfigError;
use popcorn_store::StoreError;

/// Errors that can occur during bot operation.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// The progression section of the config failed validation.
    #[error("invalid progression config: {0}")]
    Progression(#[from] ProgressionConfigError),

    /// Failed to connect to or communicate with the NATS server.
    #[error("NATS error: {0}")]
    Nats(String),

    /// A member or settings store call failed. The computed state was not
    /// committed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Failed to load or render an announcement template.
    #[error("template error: {0}")]
    Template(String),

    /// A bus payload could not be parsed.
    #[error("payload parse error: {0}")]
    Parse(String),
}
