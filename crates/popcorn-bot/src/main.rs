//! Leveling bot entry point.
//!
//! Consumes member activity from NATS, awards experience through the
//! progression engine, persists the changed fields through the API service,
//! and publishes a level-up announcement for the gateway to post.
//!
//! # Architecture
//!
//! ```text
//! NATS (activity, grants) --> IntakeRunner --> LevelingService --> API service
//!                                                    |
//!                                                    +--> NATS (notify)
//! ```
//!
//! Events for the same member are processed one at a time; events for
//! different members run concurrently up to `MAX_IN_FLIGHT`.

mod announce;
mod config;
mod error;
mod leveling;
mod nats;
mod runner;

use popcorn_progression::ProgressionEngine;
use popcorn_store::ApiStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::announce::Announcer;
use crate::config::BotConfig;
use crate::leveling::LevelingService;
use crate::nats::{ACTIVITY_SUBJECT, GRANT_SUBJECT, NatsClient};
use crate::runner::IntakeRunner;

/// Application entry point.
///
/// Loads configuration, connects to NATS and the API service, then runs
/// the intake loop until the subscriptions close or Ctrl-C is received.
/// In-flight events are allowed to finish before exit.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BotConfig::from_env()?;
    init_tracing(config.log_json);

    info!("popcorn-bot starting");
    info!(
        nats_url = config.nats_url,
        api_url = config.api.base_url,
        api_timeout_ms = config.api.timeout.as_millis(),
        max_in_flight = config.max_in_flight,
        cooldown_secs = config.file.progression.cooldown_secs,
        min_gain = config.file.progression.min_gain,
        max_gain = config.file.progression.max_gain,
        "configuration loaded"
    );

    let store = ApiStore::new(&config.api)?;
    let announcer = Announcer::new(config.file.announcements.template_path.as_deref())?;
    let engine = ProgressionEngine::new(config.file.progression);

    let nats = NatsClient::connect(&config.nats_url).await?;
    let activity = nats.subscribe(ACTIVITY_SUBJECT).await?;
    let grants = nats.subscribe(GRANT_SUBJECT).await?;

    let service = LevelingService::new(store, nats, engine, announcer);
    let runner = IntakeRunner::new(service, config.max_in_flight);

    tokio::select! {
        () = runner.run(activity, grants) => {
            info!("subscriptions closed");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutdown signal received, draining");
            runner.drain().await;
        }
    }

    info!("popcorn-bot stopped");
    Ok(())
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` controls filtering (default `info`).
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
