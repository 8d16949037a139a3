pub mod client;
pub mod listing;
pub mod parse;
pub mod source;

pub use client::{RedditClient, RedditConfig, RedditError, SavedPage};
pub use listing::{Listing, ListingData, RedditUser, Thing, ThingData, TokenResponse};
pub use parse::parse_saved_posts;
pub use source::SavedPostsSource;
