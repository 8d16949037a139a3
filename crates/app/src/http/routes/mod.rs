pub mod auth;
pub mod health;
pub mod pages;
pub mod posts;
pub mod search;
pub mod sync;

use chrono::Utc;

use crate::state::AppState;
use ss4r_core::domain::session::Session;
use ss4r_infra::db::{SessionRepoError, load_session};

/// The stored session, if it still carries a usable token.
pub async fn current_session(state: &AppState) -> Result<Option<Session>, SessionRepoError> {
    Ok(load_session(&state.db)
        .await?
        .filter(|session| session.is_authenticated(Utc::now())))
}
