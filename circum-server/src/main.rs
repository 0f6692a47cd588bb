use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use circum_server::cache::{CacheConfig, CachedEavClient};
use circum_server::config::ServerConfig;
use circum_server::eav::{EavClient, StationRegistry};
use circum_server::planner::SearchConfig;
use circum_server::store::{MemoryStore, SeedSource};
use circum_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Load the schedule (fail fast if unavailable)
    let store = match MemoryStore::load(SeedSource::from_path(config.seed.clone())) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(seed = %config.seed.display(), "failed to load schedule: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Remote endpoints still answer without a registry, rejecting every id
    let registry = StationRegistry::load(&config.eav_stations).unwrap_or_else(|e| {
        warn!("{e}; remote station lookups will fail");
        StationRegistry::default()
    });
    info!(stations = registry.len(), "loaded upstream station registry");

    let eav = match config.eav_config() {
        Some(eav_config) => match EavClient::new(eav_config) {
            Ok(client) => Some(CachedEavClient::new(client, &CacheConfig::default())),
            Err(e) => {
                error!("failed to create upstream client: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            warn!("EAV_BASE_URL not set; remote endpoints are disabled");
            None
        }
    };

    // Periodically reseed from the same source
    if let Some(period) = config.reseed_interval {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // First tick is immediate, skip it
            loop {
                interval.tick().await;
                let refresh_store = Arc::clone(&store);
                match tokio::task::spawn_blocking(move || refresh_store.refresh()).await {
                    Ok(Ok(count)) => info!(trains = count, "reseeded schedule"),
                    Ok(Err(e)) => warn!("reseed failed, keeping previous schedule: {e}"),
                    Err(e) => error!("reseed task panicked: {e}"),
                }
            }
        });
    }

    let state = AppState::new(store, SearchConfig::default(), eav, registry);
    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind, "failed to bind: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("Circumvesuviana timetable listening on http://{}", config.bind);

    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
