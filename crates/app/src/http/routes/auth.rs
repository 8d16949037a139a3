use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::http::middleware::oauth_state::{
    NONCE_COOKIE, OAuthStateError, STATE_MAX_AGE_SECS, expired_nonce_cookie, extract_cookie,
    issue_state, nonce_cookie, verify_state,
};
use crate::http::routes::sync::redirect_for;
use crate::jobs::JobError;
use crate::jobs::tasks::saved_sync;
use crate::state::AppState;
use ss4r_core::CoreError;
use ss4r_core::domain::session::{PendingAction, Session};
use ss4r_infra::db::{SessionRepoError, save_session};
use ss4r_infra::reddit::RedditError;

const DEFAULT_EXPIRES_IN_SECS: i64 = 60 * 60;

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthRouteError {
    #[error("reddit client id not configured")]
    NotConfigured,
    #[error("{0}")]
    Action(#[from] CoreError),
    #[error("{0}")]
    State(#[from] OAuthStateError),
    #[error("authorization denied: {0}")]
    Denied(String),
    #[error("authorization code missing")]
    MissingCode,
    #[error("reddit error: {0}")]
    Reddit(#[from] RedditError),
    #[error("session db error: {0}")]
    SessionDb(#[from] SessionRepoError),
    #[error("{0}")]
    Job(#[from] JobError),
}

pub async fn login(
    State(state): State<AppState>,
    Query(params): Query<LoginParams>,
) -> Result<Response, AuthRouteError> {
    if !state.config.oauth_configured() {
        return Err(AuthRouteError::NotConfigured);
    }
    let action = match params.action.as_deref() {
        Some(value) => PendingAction::parse(value)?,
        None => PendingAction::GetAllPosts,
    };
    let issued = issue_state(&state.state_secret, action, STATE_MAX_AGE_SECS)?;
    let url = state.reddit.authorize_url(&issued.value)?;
    info!(action = action.as_str(), "redirecting to reddit authorization");
    let cookie = nonce_cookie(&issued.nonce, state.config.secure_cookies());
    Ok(([(SET_COOKIE, cookie)], Redirect::to(&url)).into_response())
}

pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AuthRouteError> {
    if let Some(error) = params.error {
        return Err(AuthRouteError::Denied(error));
    }
    let signed = params
        .state
        .ok_or(AuthRouteError::State(OAuthStateError::Malformed))?;
    let action = verify_state(&state.state_secret, &signed)?
        .bind_to(extract_cookie(&headers, NONCE_COOKIE).as_deref())?;
    let code = params
        .code
        .filter(|value| !value.trim().is_empty())
        .ok_or(AuthRouteError::MissingCode)?;

    let token = state.reddit.exchange_code(&code).await?;
    let access_token = token
        .access_token
        .ok_or(RedditError::MissingData("access_token"))?;
    let mut session = Session::from_token(
        access_token,
        token.token_type,
        String::new(),
        token.scope,
        token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
        Utc::now(),
    );
    let user = state.reddit.get_user_data(&session).await?;
    session.username = user.name;
    save_session(&state.db, &session).await?;
    info!(username = %session.username, action = action.as_str(), "signed in");

    let outcome = saved_sync::run(&state, action).await?;
    let cookie = expired_nonce_cookie(state.config.secure_cookies());
    Ok(([(SET_COOKIE, cookie)], redirect_for(&outcome, "/")).into_response())
}

impl IntoResponse for AuthRouteError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthRouteError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            AuthRouteError::Action(_)
            | AuthRouteError::State(_)
            | AuthRouteError::Denied(_)
            | AuthRouteError::MissingCode => StatusCode::BAD_REQUEST,
            AuthRouteError::Reddit(_) | AuthRouteError::Job(JobError::Reddit(_)) => {
                StatusCode::BAD_GATEWAY
            }
            AuthRouteError::SessionDb(_) | AuthRouteError::Job(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!(error = %self, "login failed");
        } else {
            warn!(error = %self, "login rejected");
        }
        let body = format!(
            "<!doctype html><title>SS4R</title><h1>Login failed</h1><p>{}</p><a href=\"/\">Back</a>",
            ammonia::clean_text(&self.to_string())
        );
        (status, Html(body)).into_response()
    }
}
