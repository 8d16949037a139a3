use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::state::AppState;
use ss4r_core::domain::search::SearchResult;
use ss4r_infra::db::{PostsRepoError, load_posts_by_ids};
use ss4r_infra::search::{QueryParseError, SearchIndexError, SearchSort, parse_query};

const MAX_QUERY_LEN: usize = 256;
const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Error)]
pub enum SearchApiError {
    #[error("invalid query: {0}")]
    Query(#[from] QueryParseError),
    #[error("query too long (max {0} chars)")]
    QueryTooLong(usize),
    #[error("unknown sort: {0}")]
    InvalidSort(String),
    #[error("search failure: {0}")]
    Search(#[from] SearchIndexError),
    #[error("posts db error: {0}")]
    PostsDb(#[from] PostsRepoError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResult>, SearchApiError> {
    let query_text = params.q.unwrap_or_default();
    let sort = match params.sort.as_deref() {
        Some(value) => {
            SearchSort::parse(value).ok_or_else(|| SearchApiError::InvalidSort(value.to_string()))?
        }
        None => SearchSort::default(),
    };
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIMIT)
        .min(state.config.max_search_limit);
    let offset = params.offset.unwrap_or(0);

    let result = run_search(&state, &query_text, sort, limit, offset).await?;
    Ok(Json(result))
}

/// Parses `query_text`, queries the index and loads the matching posts.
pub async fn run_search(
    state: &AppState,
    query_text: &str,
    sort: SearchSort,
    limit: usize,
    offset: usize,
) -> Result<SearchResult, SearchApiError> {
    enforce_query_length(query_text)?;
    let query = parse_query(query_text)?;
    debug!(query_text = %query_text, ?query, "parsed search query");
    let hits = state.search.search(&query, sort, limit, offset)?;
    let posts = load_posts_by_ids(&state.db, &hits.ids).await?;
    Ok(SearchResult {
        total: hits.total,
        posts,
    })
}

fn enforce_query_length(query_text: &str) -> Result<(), SearchApiError> {
    if query_text.chars().count() > MAX_QUERY_LEN {
        return Err(SearchApiError::QueryTooLong(MAX_QUERY_LEN));
    }
    Ok(())
}

impl SearchApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            SearchApiError::Query(_)
            | SearchApiError::QueryTooLong(_)
            | SearchApiError::InvalidSort(_) => StatusCode::BAD_REQUEST,
            SearchApiError::Search(_) | SearchApiError::PostsDb(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SearchApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
