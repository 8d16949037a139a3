use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const DEFAULT_TOKEN_TYPE: &str = "bearer";

/// The signed-in user and the OAuth token used for API calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub username: String,
    pub scope: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn from_token(
        access_token: String,
        token_type: Option<String>,
        username: String,
        scope: Option<String>,
        expires_in_secs: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let token_type = token_type
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());
        Self {
            access_token,
            token_type,
            username,
            scope,
            expires_at: now + Duration::seconds(expires_in_secs.max(0)),
        }
    }

    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    pub fn is_authenticated(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.trim().is_empty()
            && !self.username.trim().is_empty()
            && self.expires_at > now
    }
}

/// Work that was interrupted by a login and resumes once a token is back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingAction {
    GetAllPosts,
    GetNewPosts,
}

impl PendingAction {
    pub fn as_str(self) -> &'static str {
        match self {
            PendingAction::GetAllPosts => "getAllPosts",
            PendingAction::GetNewPosts => "getNewPosts",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim() {
            "getAllPosts" => Ok(PendingAction::GetAllPosts),
            "getNewPosts" => Ok(PendingAction::GetNewPosts),
            other => Err(CoreError::UnknownAction(other.to_string())),
        }
    }
}
