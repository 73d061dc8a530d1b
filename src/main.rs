//! PADDOCK: racing analytics API.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the tier gate, racecard source and analyst together, and serves
//! the HTTP API until Ctrl-C.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use paddock::api::{self, routes::ServerState};
use paddock::access::TierGate;
use paddock::config::AppConfig;
use paddock::data::racing::RacingApiProvider;
use paddock::data::synthetic::SyntheticFeed;
use paddock::data::{OfflineFeed, RacecardSource};
use paddock::llm::heuristic::HeuristicAnalyst;
use paddock::llm::openai::OpenAiAnalyst;
use paddock::llm::Analyst;

const BANNER: &str = r#"
 ___  _   ___  ___   ___   ___ _  __
| _ \/_\ |   \|   \ / _ \ / __| |/ /
|  _/ _ \| |) | |) | (_) | (__| ' <
|_|/_/ \_\___/|___/ \___/ \___|_|\_\

  Racing analytics, tips and racecards
"#;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let config_path =
        std::env::var("PADDOCK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = AppConfig::load_or_default(&config_path)?;

    println!("{BANNER}");
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.server.port,
        config = %config_path,
        "PADDOCK starting up"
    );

    // -- Initialise components -------------------------------------------

    let gate = TierGate::new(&cfg.access);

    let provider = RacingApiProvider::from_config(&cfg.racing)?;
    let racing_configured = provider.is_some();
    let source: Arc<dyn RacecardSource> = match provider {
        Some(provider) => Arc::new(provider),
        None if cfg.racing.synthetic_when_unconfigured => {
            warn!("No racing provider configured, serving synthetic racecards");
            Arc::new(SyntheticFeed)
        }
        None => {
            warn!("No racing provider configured, racecard feed is offline");
            Arc::new(OfflineFeed)
        }
    };

    let openai = OpenAiAnalyst::from_config(&cfg.llm)?;
    let llm_configured = openai.is_some();
    let analyst: Arc<dyn Analyst> = match openai {
        Some(openai) => Arc::new(openai),
        None => {
            warn!(
                env = %cfg.llm.api_key_env,
                "No LLM API key configured, using heuristic analyst"
            );
            Arc::new(HeuristicAnalyst)
        }
    };

    info!(
        source = source.name(),
        analyst = analyst.name(),
        auth_enabled = !gate.is_open(),
        "Components initialised"
    );

    let state = Arc::new(ServerState {
        gate,
        source,
        analyst,
        synthetic: SyntheticFeed,
        racing_configured,
        llm_configured,
    });

    // -- Serve until Ctrl-C ----------------------------------------------

    api::serve(state, cfg.server.port, shutdown_signal()).await?;

    info!("PADDOCK shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("paddock=info"));

    let json_logging = std::env::var("PADDOCK_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
