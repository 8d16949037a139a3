use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub kind: Option<String>,
    pub data: ListingData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub dist: Option<usize>,
    #[serde(default)]
    pub children: Vec<Thing>,
}

impl Listing {
    /// Page size as reported by the API, falling back to the child count.
    pub fn dist(&self) -> usize {
        self.data.dist.unwrap_or(self.data.children.len())
    }

    /// The `after` cursor, with empty strings treated as absent.
    pub fn after(&self) -> Option<&str> {
        self.data
            .after
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thing {
    pub kind: String,
    pub data: ThingData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThingData {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link_title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub selftext: Option<String>,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedditUser {
    pub name: String,
    #[serde(default)]
    pub icon_img: Option<String>,
    #[serde(default)]
    pub total_karma: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
