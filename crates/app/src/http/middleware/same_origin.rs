use axum::extract::Request;
use axum::http::header::{HOST, ORIGIN};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

const SEC_FETCH_SITE: &str = "sec-fetch-site";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SameOriginError {
    #[error("cross-site request refused")]
    CrossSite,
    #[error("origin {0} does not match host")]
    OriginMismatch(String),
}

/// Refuses state-changing form posts coming from another site. Requests
/// without `Origin` or `Sec-Fetch-Site` (curl, scripts) pass through.
pub async fn require_same_origin(
    request: Request,
    next: Next,
) -> Result<Response, SameOriginError> {
    check_headers(request.headers())?;
    Ok(next.run(request).await)
}

fn check_headers(headers: &HeaderMap) -> Result<(), SameOriginError> {
    if let Some(site) = headers.get(SEC_FETCH_SITE) {
        let site = site.to_str().unwrap_or_default();
        if !matches!(site, "same-origin" | "none") {
            return Err(SameOriginError::CrossSite);
        }
    }
    let Some(origin) = headers.get(ORIGIN) else {
        return Ok(());
    };
    let origin = origin.to_str().unwrap_or_default();
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    match origin_authority(origin) {
        Some(authority) if !host.is_empty() && authority.eq_ignore_ascii_case(host) => Ok(()),
        _ => Err(SameOriginError::OriginMismatch(origin.to_string())),
    }
}

fn origin_authority(origin: &str) -> Option<&str> {
    let rest = origin
        .strip_prefix("https://")
        .or_else(|| origin.strip_prefix("http://"))?;
    let authority = rest.trim_end_matches('/');
    (!authority.is_empty() && !authority.contains('/')).then_some(authority)
}

impl IntoResponse for SameOriginError {
    fn into_response(self) -> Response {
        warn!(error = %self, "form post refused");
        let body = format!(
            "<!doctype html><title>SS4R</title><h1>Forbidden</h1><p>{}</p><a href=\"/\">Back</a>",
            ammonia::clean_text(&self.to_string())
        );
        (StatusCode::FORBIDDEN, Html(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{SameOriginError, check_headers, origin_authority};
    use axum::http::header::{HOST, ORIGIN};
    use axum::http::{HeaderMap, HeaderValue};

    fn headers(pairs: &[(&str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_static(value),
            );
        }
        headers
    }

    #[test]
    fn plain_clients_pass() {
        assert!(check_headers(&HeaderMap::new()).is_ok());
    }

    #[test]
    fn matching_origin_passes() {
        let headers = headers(&[
            (HOST.as_str(), "localhost:8080"),
            (ORIGIN.as_str(), "http://localhost:8080"),
            ("sec-fetch-site", "same-origin"),
        ]);
        assert!(check_headers(&headers).is_ok());
    }

    #[test]
    fn foreign_origin_is_refused() {
        let foreign = headers(&[
            (HOST.as_str(), "localhost:8080"),
            (ORIGIN.as_str(), "https://evil.test"),
        ]);
        assert_eq!(
            check_headers(&foreign).unwrap_err(),
            SameOriginError::OriginMismatch("https://evil.test".to_string())
        );
        let opaque = headers(&[(HOST.as_str(), "localhost:8080"), (ORIGIN.as_str(), "null")]);
        assert!(check_headers(&opaque).is_err());
    }

    #[test]
    fn cross_site_fetch_is_refused() {
        for site in ["cross-site", "same-site"] {
            let headers = headers(&[("sec-fetch-site", site)]);
            assert_eq!(check_headers(&headers).unwrap_err(), SameOriginError::CrossSite);
        }
    }

    #[test]
    fn authority_comes_from_scheme_prefix() {
        assert_eq!(origin_authority("https://a.test:8443"), Some("a.test:8443"));
        assert_eq!(origin_authority("null"), None);
        assert_eq!(origin_authority("https://"), None);
    }
}
