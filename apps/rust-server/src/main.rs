// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pokedex_rust_server::{
    api::router,
    config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER},
    state::AppState,
    storage::Database,
};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(config.log_format);

    let db = Database::open(&config.database_path()).expect("Failed to open database");
    let state = AppState::new(db, &config.jwt_secret, &config.jwt_issuer)
        .expect("Failed to initialize token service");
    let app = router(state, config.request_timeout);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");
    info!(addr = %config.bind_addr, "Pokedex backend listening (docs at /docs)");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_ctrl_c(shutdown.clone()));

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
    {
        error!(error = %e, "Server error");
    }
    info!("Server stopped");
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn watch_ctrl_c(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}
