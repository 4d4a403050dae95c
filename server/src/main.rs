// server/src/main.rs

// Entry point for the Obstetra workflow server: loads configuration, opens
// the record store and serves the HTTP API until SIGTERM/SIGINT.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use tokio::signal::unix::{signal, SignalKind};

use lib::auth::AccountService;
use lib::prediction::ScriptPredictor;
use lib::{AppConfig, RecordService, SledStore};

mod api;

async fn shutdown_signal() {
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to set up SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to set up SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // Optional config file path as the first CLI argument.
    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())
        .context("Failed to load configuration")?;

    let store = Arc::new(
        SledStore::open(&config.storage.data_path).context("Failed to open record store")?,
    );
    let predictor = Arc::new(ScriptPredictor::new(
        config.prediction.python_bin.clone(),
        config.prediction.script_path.clone(),
        config.prediction_timeout(),
    ));

    let accounts = AccountService::new(store.clone(), config.auth_config());
    let records = RecordService::new(store, predictor);

    let routes = api::routes(accounts, records);

    let host: IpAddr = config
        .server
        .host
        .parse()
        .context("Invalid server.host in configuration")?;
    let addr = SocketAddr::new(host, config.server.port);

    info!("Obstetra server listening on {}", addr);
    let (_addr, serving) = warp::serve(routes).bind_with_graceful_shutdown(addr, shutdown_signal());
    serving.await;

    info!("Server stopped.");
    Ok(())
}
