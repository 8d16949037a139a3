use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;
use ss4r_infra::db::{count_posts, load_session};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub modules: HealthModules,
}

#[derive(Debug, Serialize)]
pub struct HealthModules {
    pub posts: PostsStatus,
    pub search: SearchStatus,
    pub oauth: OAuthStatus,
    pub sync: SyncStatus,
}

#[derive(Debug, Serialize)]
pub struct PostsStatus {
    pub readable: bool,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct SearchStatus {
    pub documents: u64,
}

#[derive(Debug, Serialize)]
pub struct OAuthStatus {
    pub configured: bool,
    pub signed_in: bool,
}

#[derive(Debug, Serialize)]
pub struct SyncStatus {
    pub interval_secs: u64,
    pub running: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (readable, count) = match count_posts(&state.db).await {
        Ok(count) => (true, count),
        Err(err) => {
            warn!(error = %err, "health check could not count posts");
            (false, 0)
        }
    };
    let signed_in = match load_session(&state.db).await {
        Ok(session) => session.is_some_and(|session| session.is_authenticated(Utc::now())),
        Err(err) => {
            warn!(error = %err, "health check could not read session");
            false
        }
    };

    Json(HealthResponse {
        status: if readable { "ok" } else { "degraded" },
        modules: HealthModules {
            posts: PostsStatus { readable, count },
            search: SearchStatus {
                documents: state.search.num_docs(),
            },
            oauth: OAuthStatus {
                configured: state.config.oauth_configured(),
                signed_in,
            },
            sync: SyncStatus {
                interval_secs: state.config.sync_interval.as_secs(),
                running: state.sync_lock.try_lock().is_err(),
            },
        },
    })
}
