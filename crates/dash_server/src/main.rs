//! Portal Dash data server: level listing and fetch plus the shared
//! high-score table, all backed by one data directory.
//!
//!   DASH_BIND       listen address, default `127.0.0.1:3000`
//!   DASH_DATA_DIR   data directory, default `data`

mod routes;

use std::path::PathBuf;

use dash_core::store::DataDir;
use routes::{build_router, AppState};

const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq)]
struct ServerConfig {
    bind: String,
    data_dir: PathBuf,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind = lookup("DASH_BIND")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let data_dir = lookup("DASH_DATA_DIR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map_or_else(|| PathBuf::from("data"), PathBuf::from);
        Self { bind, data_dir }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env();
    let app = build_router(AppState::new(DataDir::new(&config.data_dir)));

    let listener = match tokio::net::TcpListener::bind(&config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("Failed to bind {}: {e}", config.bind);
            std::process::exit(1);
        }
    };
    log::info!("Server running at http://{}", config.bind);
    log::info!(
        "Levels from {}, high scores in {}",
        config.data_dir.join("levels").display(),
        config.data_dir.join("high-scores.md").display()
    );

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("Server error: {e}");
        std::process::exit(1);
    }
}
