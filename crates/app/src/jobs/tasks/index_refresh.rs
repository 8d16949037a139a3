use tracing::info;

use crate::jobs::JobError;
use crate::state::AppState;
use ss4r_infra::db::load_posts;

/// Rebuilds the search index from the stored posts.
pub async fn run(state: &AppState) -> Result<usize, JobError> {
    let posts = load_posts(&state.db).await?;
    let indexed = posts.len();
    let search = state.search.clone();
    tokio::task::spawn_blocking(move || search.rebuild(&posts)).await??;
    info!(indexed, "search index rebuilt");
    Ok(indexed)
}
