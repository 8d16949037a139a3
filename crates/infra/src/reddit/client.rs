use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use ss4r_core::domain::merge::PAGE_LIMIT;
use ss4r_core::domain::session::Session;
use ss4r_core::types::fullname::Fullname;

use crate::reddit::listing::{Listing, RedditUser, TokenResponse};

pub const DEFAULT_API_BASE: &str = "https://oauth.reddit.com";
pub const DEFAULT_AUTH_BASE: &str = "https://www.reddit.com";
pub const OAUTH_SCOPES: &str = "identity history";

#[derive(Debug, Error)]
pub enum RedditError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unauthorized")]
    Unauthorized,
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("oauth error: {0}")]
    OAuth(String),
    #[error("missing data: {0}")]
    MissingData(&'static str),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid username: {0}")]
    InvalidUsername(String),
}

#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub api_base: String,
    pub auth_base: String,
    pub user_agent: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
}

/// One request against the saved listing.
#[derive(Debug, Clone)]
pub struct SavedPage {
    pub limit: usize,
    pub before: Option<Fullname>,
    pub after: Option<Fullname>,
    pub count: usize,
}

impl Default for SavedPage {
    fn default() -> Self {
        Self {
            limit: PAGE_LIMIT,
            before: None,
            after: None,
            count: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedditClient {
    http: reqwest::Client,
    config: RedditConfig,
}

impl RedditClient {
    pub fn new(http: reqwest::Client, config: RedditConfig) -> Self {
        Self { http, config }
    }

    pub fn authorize_url(&self, state: &str) -> Result<String, RedditError> {
        let base = format!("{}/api/v1/authorize", trim_base(&self.config.auth_base));
        let url = Url::parse_with_params(
            &base,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("state", state),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("duration", "temporary"),
                ("scope", OAUTH_SCOPES),
            ],
        )
        .map_err(|err| RedditError::InvalidUrl(err.to_string()))?;
        Ok(url.to_string())
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, RedditError> {
        let url = format!("{}/api/v1/access_token", trim_base(&self.config.auth_base));
        let response = self
            .http
            .post(url)
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.as_deref().unwrap_or_default()),
            )
            .header(USER_AGENT, &self.config.user_agent)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await?;
        let token: TokenResponse = read_json(response).await?;
        if let Some(error) = token.error {
            return Err(RedditError::OAuth(error));
        }
        if token
            .access_token
            .as_deref()
            .is_none_or(|value| value.trim().is_empty())
        {
            return Err(RedditError::MissingData("access_token"));
        }
        Ok(token)
    }

    pub async fn get_user_data(&self, session: &Session) -> Result<RedditUser, RedditError> {
        let url = format!("{}/api/v1/me?raw_json=1", trim_base(&self.config.api_base));
        self.get_json(&url, session).await
    }

    pub async fn get_saved_posts(
        &self,
        session: &Session,
        page: &SavedPage,
    ) -> Result<Listing, RedditError> {
        let url = self.saved_url(&session.username, page)?;
        debug!(url = %url, "fetching saved page");
        self.get_json(url.as_str(), session).await
    }

    fn saved_url(&self, username: &str, page: &SavedPage) -> Result<Url, RedditError> {
        if !is_valid_username(username) {
            return Err(RedditError::InvalidUsername(username.to_string()));
        }
        let base = format!("{}/user/{username}/saved", trim_base(&self.config.api_base));
        let mut url = Url::parse(&base).map_err(|err| RedditError::InvalidUrl(err.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &page.limit.to_string());
            if let Some(before) = &page.before {
                query.append_pair("before", before.as_str());
            }
            if let Some(after) = &page.after {
                query.append_pair("after", after.as_str());
            }
            if page.count > 0 {
                query.append_pair("count", &page.count.to_string());
            }
            query.append_pair("raw_json", "1");
        }
        Ok(url)
    }

    async fn get_json<T>(&self, url: &str, session: &Session) -> Result<T, RedditError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, session.authorization_header())
            .header(USER_AGENT, &self.config.user_agent)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json<T>(response: reqwest::Response) -> Result<T, RedditError>
where
    T: for<'de> Deserialize<'de>,
{
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(RedditError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RedditError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

fn trim_base(base: &str) -> &str {
    base.trim_end_matches('/')
}

fn is_valid_username(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}
