use ss4r_core::domain::post::PostType;
use ss4r_core::domain::search::SearchQuery;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryParseError {
    #[error("empty search query")]
    EmptyQuery,
    #[error("duplicate filter: {0}")]
    DuplicateFilter(&'static str),
    #[error("invalid subreddit filter: {0}")]
    InvalidSubreddit(String),
    #[error("invalid type filter: {0}")]
    InvalidType(String),
}

pub fn parse_query(input: &str) -> Result<SearchQuery, QueryParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QueryParseError::EmptyQuery);
    }

    let mut query = SearchQuery::default();
    for token in trimmed.split_whitespace() {
        if let Some(value) = subreddit_filter(token) {
            if query.subreddit.is_some() {
                return Err(QueryParseError::DuplicateFilter("subreddit"));
            }
            query.subreddit = Some(parse_subreddit(value)?);
            continue;
        }
        if let Some(value) = token.strip_prefix("type:") {
            if query.post_type.is_some() {
                return Err(QueryParseError::DuplicateFilter("type"));
            }
            let post_type = PostType::parse(value)
                .map_err(|_| QueryParseError::InvalidType(value.to_string()))?;
            query.post_type = Some(post_type);
            continue;
        }
        query.keywords.push(token.to_string());
    }

    Ok(query)
}

fn subreddit_filter(token: &str) -> Option<&str> {
    token
        .strip_prefix("sub:")
        .or_else(|| token.strip_prefix("subreddit:"))
        .or_else(|| token.strip_prefix("r/"))
        .or_else(|| token.strip_prefix("/r/"))
}

fn parse_subreddit(value: &str) -> Result<String, QueryParseError> {
    let name = value.trim().trim_end_matches('/');
    if name.is_empty()
        || !name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    {
        return Err(QueryParseError::InvalidSubreddit(value.to_string()));
    }
    Ok(name.to_ascii_lowercase())
}
