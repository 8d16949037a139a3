pub mod scheduler;
pub mod tasks;

use thiserror::Error;
use tracing::info;

use crate::state::AppState;
use ss4r_core::domain::session::PendingAction;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("reddit error: {0}")]
    Reddit(#[from] ss4r_infra::reddit::RedditError),
    #[error("invalid cursor: {0}")]
    Cursor(#[from] ss4r_core::CoreError),
    #[error("posts db error: {0}")]
    PostsDb(#[from] ss4r_infra::db::PostsRepoError),
    #[error("session db error: {0}")]
    SessionDb(#[from] ss4r_infra::db::SessionRepoError),
    #[error("search index error: {0}")]
    Search(#[from] ss4r_infra::search::SearchIndexError),
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runs the periodic incremental sync until the process stops.
pub async fn start(state: AppState) -> Result<(), JobError> {
    let interval = state.config.sync_interval;
    if interval.is_zero() {
        info!("periodic sync disabled");
        return Ok(());
    }
    scheduler::run_interval("saved_sync", interval, move || {
        let state = state.clone();
        async move {
            let outcome = tasks::saved_sync::run(&state, PendingAction::GetNewPosts).await?;
            info!(?outcome, "periodic sync complete");
            Ok(())
        }
    })
    .await
}
