pub mod post_index;
pub mod query_parser;

pub use post_index::{IndexHits, PostIndex, SearchIndexError};
pub use query_parser::{QueryParseError, parse_query};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchSort {
    #[default]
    Relevance,
    Saved,
}

impl SearchSort {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "relevance" => Some(Self::Relevance),
            "saved" | "latest" => Some(Self::Saved),
            _ => None,
        }
    }
}
