use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;
use thiserror::Error;
use tracing::error;

use crate::http::routes::current_session;
use crate::http::routes::search::{SearchApiError, run_search};
use crate::http::views::{Location, PageView, render_page};
use crate::state::AppState;
use ss4r_core::domain::menu::{Header, MenuState};
use ss4r_infra::db::{PostsRepoError, SessionRepoError, count_posts, load_posts_page};
use ss4r_infra::search::SearchSort;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub q: Option<String>,
    pub page: Option<usize>,
    pub menu: Option<String>,
}

impl PageParams {
    fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    fn menu(&self) -> MenuState {
        MenuState::new(self.menu.as_deref() == Some("open"))
    }
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("posts db error: {0}")]
    PostsDb(#[from] PostsRepoError),
    #[error("session db error: {0}")]
    SessionDb(#[from] SessionRepoError),
    #[error("search failure: {0}")]
    Search(SearchApiError),
}

pub async fn home(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Html<String>, PageError> {
    let header = build_header(&state, &params).await?;
    let page = params.page();
    let page_size = state.config.page_size;
    let offset = (page - 1).saturating_mul(page_size);
    let total = count_posts(&state.db).await?;
    let posts = load_posts_page(&state.db, page_size, offset).await?;
    let notice = header
        .username
        .is_none()
        .then_some("Log in with Reddit to load your saved posts.");

    Ok(Html(render_page(&PageView {
        header: &header,
        location: Location::Home { page },
        posts: &posts,
        total: usize::try_from(total).unwrap_or_default(),
        page_size,
        notice,
    })))
}

pub async fn search_page(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Response, PageError> {
    let query_text = params.q.clone().unwrap_or_default();
    if query_text.trim().is_empty() {
        return Ok(Redirect::to("/").into_response());
    }
    let header = build_header(&state, &params).await?;
    let page = params.page();
    let page_size = state.config.page_size;
    let offset = (page - 1).saturating_mul(page_size);
    let location = Location::Search {
        query: query_text.clone(),
        page,
    };

    match run_search(&state, &query_text, SearchSort::Relevance, page_size, offset).await {
        Ok(result) => {
            let html = render_page(&PageView {
                header: &header,
                location,
                posts: &result.posts,
                total: result.total,
                page_size,
                notice: None,
            });
            Ok(Html(html).into_response())
        }
        Err(err) if err.status() == StatusCode::BAD_REQUEST => {
            let message = err.to_string();
            let html = render_page(&PageView {
                header: &header,
                location,
                posts: &[],
                total: 0,
                page_size,
                notice: Some(&message),
            });
            Ok((StatusCode::BAD_REQUEST, Html(html)).into_response())
        }
        Err(err) => Err(PageError::Search(err)),
    }
}

async fn build_header(state: &AppState, params: &PageParams) -> Result<Header, PageError> {
    let username = current_session(state)
        .await?
        .map(|session| session.username);
    let menu = if username.is_some() {
        params.menu()
    } else {
        MenuState::default()
    };
    Ok(Header::new(username, menu))
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        error!(error = %self, "page render failed");
        let body = format!(
            "<!doctype html><title>SS4R</title><h1>Something went wrong</h1><p>{}</p><a href=\"/\">Back</a>",
            ammonia::clean_text(&self.to_string())
        );
        (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::PageParams;

    #[test]
    fn page_defaults_to_first() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        let params = PageParams {
            page: Some(0),
            ..PageParams::default()
        };
        assert_eq!(params.page(), 1);
    }

    #[test]
    fn menu_opens_only_on_open() {
        let params = PageParams {
            menu: Some("open".to_string()),
            ..PageParams::default()
        };
        assert!(params.menu().is_visible());
        let params = PageParams {
            menu: Some("closed".to_string()),
            ..PageParams::default()
        };
        assert!(!params.menu().is_visible());
    }
}
