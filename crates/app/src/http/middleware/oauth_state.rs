use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use ss4r_core::domain::session::PendingAction;

pub const STATE_MAX_AGE_SECS: i64 = 10 * 60;
pub const NONCE_COOKIE: &str = "ss4r_oauth_nonce";
const NONCE_COOKIE_PATH: &str = "/auth";
const NONCE_BYTES: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OAuthStateError {
    #[error("state secret rejected")]
    InvalidSecret,
    #[error("malformed login state")]
    Malformed,
    #[error("login state signature mismatch")]
    BadSignature,
    #[error("login state expired")]
    Expired,
    #[error("unknown pending action: {0}")]
    UnknownAction(String),
    #[error("login state was not issued to this browser")]
    NonceMismatch,
}

/// A freshly signed `state` plus the nonce the browser must echo back in
/// the [`NONCE_COOKIE`] cookie.
#[derive(Debug, Clone)]
pub struct IssuedState {
    pub value: String,
    pub nonce: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedState {
    pub action: PendingAction,
    pub nonce: String,
}

impl VerifiedState {
    /// Accepts the state only when the browser presents the matching nonce
    /// cookie. The cookie is dropped after the callback, so a state is good
    /// for one sign-in.
    pub fn bind_to(self, cookie: Option<&str>) -> Result<PendingAction, OAuthStateError> {
        match cookie {
            Some(nonce) if !nonce.is_empty() && nonce == self.nonce => Ok(self.action),
            _ => Err(OAuthStateError::NonceMismatch),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StatePayload {
    action: String,
    exp: i64,
    nonce: String,
}

/// Signs the action to resume after login into an opaque `state` value.
pub fn issue_state(
    secret: &str,
    action: PendingAction,
    max_age_secs: i64,
) -> Result<IssuedState, OAuthStateError> {
    let mut nonce = [0u8; NONCE_BYTES];
    OsRng.fill_bytes(&mut nonce);
    let nonce = hex::encode(nonce);
    let payload = StatePayload {
        action: action.as_str().to_string(),
        exp: Utc::now().timestamp().saturating_add(max_age_secs),
        nonce: nonce.clone(),
    };
    let json = serde_json::to_vec(&payload).map_err(|_| OAuthStateError::Malformed)?;
    let payload_b64 = URL_SAFE_NO_PAD.encode(json);
    let signature = URL_SAFE_NO_PAD.encode(mac(secret, &payload_b64)?.finalize().into_bytes());
    Ok(IssuedState {
        value: format!("{payload_b64}.{signature}"),
        nonce,
    })
}

pub fn verify_state(secret: &str, state: &str) -> Result<VerifiedState, OAuthStateError> {
    let (payload_b64, signature) = state
        .split_once('.')
        .filter(|(payload, sig)| !payload.is_empty() && !sig.is_empty())
        .ok_or(OAuthStateError::Malformed)?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature.as_bytes())
        .map_err(|_| OAuthStateError::Malformed)?;
    mac(secret, payload_b64)?
        .verify_slice(&signature)
        .map_err(|_| OAuthStateError::BadSignature)?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload_b64.as_bytes())
        .map_err(|_| OAuthStateError::Malformed)?;
    let payload: StatePayload =
        serde_json::from_slice(&bytes).map_err(|_| OAuthStateError::Malformed)?;
    if payload.exp <= Utc::now().timestamp() {
        return Err(OAuthStateError::Expired);
    }
    let action = PendingAction::parse(&payload.action)
        .map_err(|_| OAuthStateError::UnknownAction(payload.action))?;
    Ok(VerifiedState {
        action,
        nonce: payload.nonce,
    })
}

pub fn nonce_cookie(nonce: &str, secure: bool) -> String {
    cookie_value(nonce, STATE_MAX_AGE_SECS, secure)
}

pub fn expired_nonce_cookie(secure: bool) -> String {
    cookie_value("", 0, secure)
}

fn cookie_value(value: &str, max_age: i64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{NONCE_COOKIE}={value}; Path={NONCE_COOKIE_PATH}; HttpOnly; SameSite=Lax; \
         Max-Age={max_age}{secure}"
    )
}

pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(header) = header.to_str() else {
            continue;
        };
        for part in header.split(';') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            if key.trim() == name {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

fn mac(secret: &str, payload_b64: &str) -> Result<Hmac<Sha256>, OAuthStateError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| OAuthStateError::InvalidSecret)?;
    mac.update(payload_b64.as_bytes());
    Ok(mac)
}
