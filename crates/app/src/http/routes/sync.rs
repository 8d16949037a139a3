use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use thiserror::Error;
use tracing::{error, info};

use crate::http::views::Location;
use crate::jobs::JobError;
use crate::jobs::tasks::saved_sync::{self, SyncOutcome};
use crate::state::AppState;
use ss4r_core::domain::menu::{MenuItem, MenuState};
use ss4r_core::domain::session::PendingAction;
use ss4r_infra::db::{PostsRepoError, SessionRepoError, clear_posts, clear_session};

#[derive(Debug, Error)]
pub enum SyncRouteError {
    #[error("{0}")]
    Job(#[from] JobError),
    #[error("posts db error: {0}")]
    PostsDb(#[from] PostsRepoError),
    #[error("session db error: {0}")]
    SessionDb(#[from] SessionRepoError),
}

pub async fn sync_new(State(state): State<AppState>) -> Result<Redirect, SyncRouteError> {
    run_action(&state, MenuItem::SyncNew, PendingAction::GetNewPosts).await
}

pub async fn sync_all(State(state): State<AppState>) -> Result<Redirect, SyncRouteError> {
    run_action(&state, MenuItem::SyncAll, PendingAction::GetAllPosts).await
}

pub async fn logout(State(state): State<AppState>) -> Result<Redirect, SyncRouteError> {
    clear_posts(&state.db).await?;
    clear_session(&state.db).await?;
    let search = state.search.clone();
    tokio::task::spawn_blocking(move || search.rebuild(&[]))
        .await
        .map_err(JobError::from)?
        .map_err(JobError::from)?;
    info!("logged out");
    Ok(Redirect::to(&landing_after(MenuItem::Logout)))
}

async fn run_action(
    state: &AppState,
    item: MenuItem,
    action: PendingAction,
) -> Result<Redirect, SyncRouteError> {
    let outcome = saved_sync::run(state, action).await?;
    Ok(redirect_for(&outcome, &landing_after(item)))
}

/// Menu entries are picked from an open menu; the follow-up page shows it
/// folded back up.
fn landing_after(item: MenuItem) -> String {
    let mut menu = MenuState::new(true);
    menu.select(item);
    Location::Home { page: 1 }.href(menu)
}

pub fn redirect_for(outcome: &SyncOutcome, landing: &str) -> Redirect {
    match outcome {
        SyncOutcome::Synced(_) => Redirect::to(landing),
        SyncOutcome::NeedsAuth(action) => Redirect::to(&login_path(*action)),
    }
}

pub fn login_path(action: PendingAction) -> String {
    format!("/login?action={}", action.as_str())
}

impl IntoResponse for SyncRouteError {
    fn into_response(self) -> Response {
        error!(error = %self, "sync request failed");
        let status = match &self {
            SyncRouteError::Job(JobError::Reddit(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = format!(
            "<!doctype html><title>SS4R</title><h1>Sync failed</h1><p>{}</p><a href=\"/\">Back</a>",
            ammonia::clean_text(&self.to_string())
        );
        (status, Html(body)).into_response()
    }
}
