use serde::Serialize;

use crate::domain::post::{Post, PostType};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub keywords: Vec<String>,
    pub subreddit: Option<String>,
    pub post_type: Option<PostType>,
}

impl SearchQuery {
    pub fn has_keywords(&self) -> bool {
        !self.keywords.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub total: usize,
    pub posts: Vec<Post>,
}
