use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use ss4r_infra::reddit::RedditConfig;
use ss4r_infra::reddit::client::{DEFAULT_API_BASE, DEFAULT_AUTH_BASE};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub database_url: String,
    pub index_dir: PathBuf,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub user_agent: String,
    pub api_base: String,
    pub auth_base: String,
    pub request_timeout: Duration,
    pub sync_interval: Duration,
    pub max_pages: usize,
    pub page_size: usize,
    pub max_search_limit: usize,
    pub state_secret: Option<String>,
    pub cors_allow_origins: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid socket address: {0}")]
    InvalidSocket(String),
    #[error("invalid integer for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr_raw = read_string("SS4R_HTTP_ADDR", "127.0.0.1:8080");
        let http_addr: SocketAddr = http_addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidSocket(http_addr_raw.clone()))?;
        let data_dir = PathBuf::from(read_string("SS4R_DATA_DIR", "./data"));
        let database_url = read_optional_string("SS4R_DATABASE_URL").unwrap_or_else(|| {
            format!("sqlite://{}", data_dir.join("ss4r.db").display())
        });
        let index_dir = read_optional_string("SS4R_INDEX_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("index"));
        let client_id = read_string("SS4R_CLIENT_ID", "");
        let client_secret = read_optional_string("SS4R_CLIENT_SECRET");
        let redirect_uri = read_optional_string("SS4R_REDIRECT_URI")
            .unwrap_or_else(|| format!("http://{http_addr}/auth/callback"));
        if !redirect_uri.starts_with("http://") && !redirect_uri.starts_with("https://") {
            return Err(ConfigError::InvalidValue("SS4R_REDIRECT_URI", redirect_uri));
        }
        let user_agent = read_string(
            "SS4R_USER_AGENT",
            concat!("ss4r/", env!("CARGO_PKG_VERSION")),
        );
        if user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue("SS4R_USER_AGENT", user_agent));
        }
        let api_base = read_string("SS4R_API_BASE", DEFAULT_API_BASE);
        let auth_base = read_string("SS4R_AUTH_BASE", DEFAULT_AUTH_BASE);
        let request_timeout_secs = read_u64("SS4R_REQUEST_TIMEOUT_SECS", 15)?;
        let sync_interval_secs = read_u64("SS4R_SYNC_INTERVAL_SECS", 0)?;
        let max_pages = read_usize("SS4R_MAX_PAGES", 0)?;
        let page_size = read_usize("SS4R_PAGE_SIZE", 50)?;
        if page_size == 0 {
            return Err(ConfigError::InvalidValue("SS4R_PAGE_SIZE", "0".to_string()));
        }
        let max_search_limit = read_usize("SS4R_MAX_SEARCH_LIMIT", 50)?;
        let state_secret = read_optional_string("SS4R_STATE_SECRET");
        let cors_allow_origins = read_list("SS4R_CORS_ALLOW_ORIGINS");

        Ok(Self {
            http_addr,
            data_dir,
            database_url,
            index_dir,
            client_id,
            client_secret,
            redirect_uri,
            user_agent,
            api_base,
            auth_base,
            request_timeout: Duration::from_secs(request_timeout_secs),
            sync_interval: Duration::from_secs(sync_interval_secs),
            max_pages,
            page_size,
            max_search_limit,
            state_secret,
            cors_allow_origins,
        })
    }

    pub fn reddit(&self) -> RedditConfig {
        RedditConfig {
            api_base: self.api_base.clone(),
            auth_base: self.auth_base.clone(),
            user_agent: self.user_agent.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
        }
    }

    pub fn oauth_configured(&self) -> bool {
        !self.client_id.trim().is_empty()
    }

    /// Cookies get `Secure` when the app is reached over https.
    pub fn secure_cookies(&self) -> bool {
        self.redirect_uri.starts_with("https://")
    }
}

#[cfg(test)]
impl AppConfig {
    /// Config pointing every Reddit endpoint at `base`.
    pub fn for_tests(base: &str) -> Self {
        Self {
            http_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_dir: PathBuf::from("./data"),
            database_url: "sqlite::memory:".to_string(),
            index_dir: PathBuf::from("./data/index"),
            client_id: "client-id".to_string(),
            client_secret: Some("client-secret".to_string()),
            redirect_uri: "http://127.0.0.1:8080/auth/callback".to_string(),
            user_agent: "ss4r-test/0.1".to_string(),
            api_base: base.to_string(),
            auth_base: base.to_string(),
            request_timeout: Duration::from_secs(5),
            sync_interval: Duration::ZERO,
            max_pages: 0,
            page_size: 50,
            max_search_limit: 50,
            state_secret: Some("test-secret".to_string()),
            cors_allow_origins: Vec::new(),
        }
    }
}

pub fn load_dotenv() -> Result<(), std::io::Error> {
    let path = Path::new(".env");
    if !path.exists() {
        return Ok(());
    }
    let contents = std::fs::read_to_string(path)?;
    for (key, value) in parse_dotenv(&contents) {
        if std::env::var_os(&key).is_none() {
            // Safety: invoked during startup before any threads are spawned.
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }
    Ok(())
}

fn read_string(key: &'static str, default: &'static str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn read_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber(key, raw))
}

fn read_usize(key: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber(key, raw))
}

fn read_optional_string(key: &'static str) -> Option<String> {
    let value = std::env::var(key).unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn read_list(key: &'static str) -> Vec<String> {
    std::env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .filter_map(parse_dotenv_line)
        .collect()
}

fn parse_dotenv_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = parse_dotenv_value(value.trim());
    Some((key.to_string(), value))
}

fn parse_dotenv_value(value: &str) -> String {
    if let Some(stripped) = value.strip_prefix('"').and_then(|inner| inner.strip_suffix('"')) {
        return unescape_double_quoted(stripped);
    }
    if let Some(stripped) = value.strip_prefix('\'').and_then(|inner| inner.strip_suffix('\'')) {
        return stripped.to_string();
    }
    value.to_string()
}

fn unescape_double_quoted(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => output.push('\n'),
                Some('t') => output.push('\t'),
                Some('\\') => output.push('\\'),
                Some('"') => output.push('"'),
                Some(other) => {
                    output.push('\\');
                    output.push(other);
                }
                None => output.push('\\'),
            }
        } else {
            output.push(ch);
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::parse_dotenv_line;

    #[test]
    fn parse_dotenv_line_basic() {
        let (key, value) = parse_dotenv_line("SS4R_CLIENT_ID=abc").unwrap();
        assert_eq!(key, "SS4R_CLIENT_ID");
        assert_eq!(value, "abc");
    }

    #[test]
    fn parse_dotenv_line_export() {
        let (key, value) = parse_dotenv_line("export SS4R_MAX_PAGES=3").unwrap();
        assert_eq!(key, "SS4R_MAX_PAGES");
        assert_eq!(value, "3");
    }

    #[test]
    fn parse_dotenv_line_quotes() {
        let (_, value) = parse_dotenv_line(r#"SS4R_USER_AGENT="ss4r by u/spez""#).unwrap();
        assert_eq!(value, "ss4r by u/spez");
        let (_, value) = parse_dotenv_line("SS4R_CLIENT_SECRET='s3cr\\et'").unwrap();
        assert_eq!(value, "s3cr\\et");
    }

    #[test]
    fn parse_dotenv_line_escaped() {
        let (_, value) = parse_dotenv_line(r#"KEY="line\n\"quote\"""#).unwrap();
        assert_eq!(value, "line\n\"quote\"");
    }

    #[test]
    fn parse_dotenv_line_skips_comments_and_blanks() {
        assert!(parse_dotenv_line("# comment").is_none());
        assert!(parse_dotenv_line("   ").is_none());
        assert!(parse_dotenv_line("=value").is_none());
    }
}
