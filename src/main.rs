mod analyzer;
mod chart;
mod config;
mod crm;
mod model;
mod normalizer;
mod utils;
mod web;

use config::load_config;
use crm::LimeFetcher;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use web::AppState;

#[tokio::main]
async fn main() {
    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    // Load configuration from file and environment
    let config = match load_config("config.json") {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };
    info!("Loaded config: {:?}", config);

    let fetcher = match LimeFetcher::new(config.clone()) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to create CRM client: {}", e);
            return;
        }
    };

    let state = AppState {
        source: Arc::new(fetcher),
        config: config.clone(),
    };

    if let Err(e) = web::serve(state, &config.bind_addr).await {
        error!("Server error: {}", e);
    }
}
