use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const REDDIT_BASE_URL: &str = "https://www.reddit.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Comment,
    Link,
}

impl PostType {
    /// Comments are `t1`; every other saved thing is treated as a link.
    pub fn from_kind(kind: &str) -> Self {
        if kind == "t1" {
            PostType::Comment
        } else {
            PostType::Link
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PostType::Comment => "comment",
            PostType::Link => "link",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "comment" | "comments" => Ok(PostType::Comment),
            "link" | "links" | "post" | "posts" => Ok(PostType::Link),
            other => Err(CoreError::InvalidPostType(other.to_string())),
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A saved item with its title and body already rendered to sanitized HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub title: String,
    pub content: Option<String>,
    pub id: String,
    pub subreddit: String,
    pub permalink: String,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
}

impl Post {
    pub fn is_link(&self) -> bool {
        self.post_type == PostType::Link
    }

    pub fn reddit_url(&self) -> String {
        if self.permalink.starts_with("http://") || self.permalink.starts_with("https://") {
            return self.permalink.clone();
        }
        format!("{REDDIT_BASE_URL}{}", self.permalink)
    }

    pub fn has_thumbnail(&self) -> bool {
        self.thumbnail.as_deref().is_some_and(is_web_url)
    }

    /// External target of a link post, only when it is an http(s) URL.
    pub fn link_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| self.is_link() && is_web_url(url))
    }
}

fn is_web_url(value: &str) -> bool {
    let lower = value.trim_start().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::{Post, PostType};

    fn link() -> Post {
        Post {
            post_type: PostType::Link,
            title: "Hello".to_string(),
            content: None,
            id: "t3_abc".to_string(),
            subreddit: "rust".to_string(),
            permalink: "/r/rust/comments/abc/hello/".to_string(),
            url: Some("https://example.com".to_string()),
            thumbnail: Some("self".to_string()),
        }
    }

    #[test]
    fn kind_maps_to_type() {
        assert_eq!(PostType::from_kind("t1"), PostType::Comment);
        assert_eq!(PostType::from_kind("t3"), PostType::Link);
        assert_eq!(PostType::from_kind("t4"), PostType::Link);
    }

    #[test]
    fn parse_accepts_plurals() {
        assert_eq!(PostType::parse("Comments").unwrap(), PostType::Comment);
        assert_eq!(PostType::parse("link").unwrap(), PostType::Link);
        assert!(PostType::parse("video").is_err());
    }

    #[test]
    fn reddit_url_joins_permalink() {
        assert_eq!(
            link().reddit_url(),
            "https://www.reddit.com/r/rust/comments/abc/hello/"
        );
    }

    #[test]
    fn sentinel_thumbnails_are_ignored() {
        let mut post = link();
        assert!(!post.has_thumbnail());
        post.thumbnail = Some("https://b.thumbs.redditmedia.com/x.jpg".to_string());
        assert!(post.has_thumbnail());
    }

    #[test]
    fn link_url_requires_web_scheme() {
        let mut post = link();
        assert_eq!(post.link_url(), post.url.as_deref());
        post.url = Some("javascript:alert(1)".to_string());
        assert_eq!(post.link_url(), None);
        post.url = Some("HTTPS://example.com/".to_string());
        assert_eq!(post.link_url(), Some("HTTPS://example.com/"));
    }

    #[test]
    fn serializes_type_field() {
        let json = serde_json::to_value(link()).unwrap();
        assert_eq!(json["type"], "link");
        assert_eq!(json["id"], "t3_abc");
    }
}
