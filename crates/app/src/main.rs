mod cli;
mod config;
mod http;
mod jobs;
mod state;
mod wiring;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Mode};
use crate::config::ConfigError;
use crate::http::HttpError;
use crate::jobs::JobError;
use crate::jobs::tasks::index_refresh;
use crate::jobs::tasks::saved_sync::{self, SyncOutcome};
use crate::state::AppState;
use crate::wiring::WiringError;
use ss4r_core::domain::session::PendingAction;
use ss4r_infra::db::run_migrations;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("wiring error: {0}")]
    Wiring(#[from] WiringError),
    #[error("db error: {0}")]
    Db(#[from] ss4r_infra::db::DbPoolError),
    #[error("http error: {0}")]
    Http(#[from] HttpError),
    #[error("job error: {0}")]
    Jobs(#[from] JobError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    config::load_dotenv()?;
    let config = config::AppConfig::from_env()?;
    let state = wiring::build_state(config)?;
    run_migrations(&state.db).await?;

    if cli.reindex || cli.mode == Mode::Reindex {
        index_refresh::run(&state).await?;
    }

    match cli.mode {
        Mode::Serve => serve(state).await,
        Mode::Sync => sync_once(&state, PendingAction::GetNewPosts).await,
        Mode::SyncAll => sync_once(&state, PendingAction::GetAllPosts).await,
        Mode::Reindex => Ok(()),
    }
}

async fn serve(state: AppState) -> Result<(), AppError> {
    let addr = state.config.http_addr;
    let http_state = state.clone();
    let mut api_task = tokio::spawn(async move {
        info!(%addr, "http server starting");
        http::serve(addr, http_state).await
    });
    let worker_task = tokio::spawn(jobs::start(state));

    tokio::select! {
        _ = shutdown_signal() => {
            info!("shutdown signal received");
            return Ok(());
        }
        res = &mut api_task => {
            res??;
            return Ok(());
        }
        res = worker_task => {
            res??;
        }
    }

    // Periodic sync is off; keep serving until shutdown.
    tokio::select! {
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
        res = api_task => {
            res??;
        }
    }
    Ok(())
}

async fn sync_once(state: &AppState, action: PendingAction) -> Result<(), AppError> {
    match saved_sync::run(state, action).await? {
        SyncOutcome::Synced(stats) => {
            info!(
                pages = stats.pages,
                fetched = stats.fetched,
                total = stats.total,
                "sync finished"
            );
        }
        SyncOutcome::NeedsAuth(action) => {
            warn!(
                action = action.as_str(),
                addr = %state.config.http_addr,
                "not signed in; log in through the web UI and retry"
            );
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install ctrl-c handler");
    }
}
