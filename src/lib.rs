pub mod accounts;
pub mod api;
pub mod booking;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod models;
pub mod scheduling;
pub mod session;
pub mod validation;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError};
use crate::core_state::CoreState;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] core_state::CoreError),

    #[error("Account setup failed: {0}")]
    Accounts(#[from] accounts::AccountError),

    #[error("Invalid bind address {0}")]
    BindAddress(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Process entry point: `clinic-front-office [CONFIG_PATH]`.
pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Cannot start async runtime: {e}");
            std::process::exit(1);
        }
    };

    let explicit = std::env::args_os().nth(1).map(PathBuf::from);
    if let Err(e) = runtime.block_on(serve(explicit)) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn serve(explicit_config: Option<PathBuf>) -> Result<(), StartupError> {
    let config_path = config::resolve_config_path(explicit_config)?;
    let config = AppConfig::load_or_create(&config_path)?;
    tracing::info!(
        config = %config_path.display(),
        database = %config.database_path.display(),
        "Configuration loaded"
    );

    let addr: SocketAddr = config
        .bind_addr()
        .parse()
        .map_err(|_| StartupError::BindAddress(config.bind_addr()))?;

    let core = Arc::new(CoreState::new(config));
    {
        let conn = core.open_db()?;
        if let Some(password) = accounts::seed_admin(&conn)? {
            tracing::warn!(
                username = accounts::SEED_ADMIN_USERNAME,
                %password,
                "Created initial administrator account; change this password after first login"
            );
        }
    }

    let server = api::start_api_server(core, addr).await?;
    tracing::info!(addr = %server.addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }
    server.shutdown().await;
    Ok(())
}
