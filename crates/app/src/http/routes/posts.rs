use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::http::routes::current_session;
use crate::state::AppState;
use ss4r_core::domain::post::Post;
use ss4r_infra::db::{
    PostsRepoError, SessionRepoError, clear_session, count_posts, load_posts_page,
};
use ss4r_infra::reddit::{RedditError, RedditUser};

const MAX_PAGE_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct PostsParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub total: i64,
    pub offset: usize,
    pub posts: Vec<Post>,
}

#[derive(Debug, Error)]
pub enum PostsApiError {
    #[error("posts db error: {0}")]
    PostsDb(#[from] PostsRepoError),
    #[error("session db error: {0}")]
    SessionDb(#[from] SessionRepoError),
    #[error("not signed in")]
    NotSignedIn,
    #[error("reddit error: {0}")]
    Reddit(#[from] RedditError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<PostsParams>,
) -> Result<Json<PostsResponse>, PostsApiError> {
    let limit = params
        .limit
        .unwrap_or(state.config.page_size)
        .min(MAX_PAGE_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let total = count_posts(&state.db).await?;
    let posts = load_posts_page(&state.db, limit, offset).await?;
    Ok(Json(PostsResponse {
        total,
        offset,
        posts,
    }))
}

pub async fn me(State(state): State<AppState>) -> Result<Json<RedditUser>, PostsApiError> {
    let session = current_session(&state)
        .await?
        .ok_or(PostsApiError::NotSignedIn)?;
    match state.reddit.get_user_data(&session).await {
        Ok(user) => Ok(Json(user)),
        Err(RedditError::Unauthorized) => {
            warn!(username = %session.username, "token rejected; clearing session");
            clear_session(&state.db).await?;
            Err(PostsApiError::NotSignedIn)
        }
        Err(err) => Err(err.into()),
    }
}

impl IntoResponse for PostsApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            PostsApiError::NotSignedIn => StatusCode::UNAUTHORIZED,
            PostsApiError::Reddit(_) => StatusCode::BAD_GATEWAY,
            PostsApiError::PostsDb(_) | PostsApiError::SessionDb(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
