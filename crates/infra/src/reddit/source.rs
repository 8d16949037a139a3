use async_trait::async_trait;

use ss4r_core::domain::session::Session;

use crate::reddit::client::{RedditClient, RedditError, SavedPage};
use crate::reddit::listing::Listing;

/// Anything that can serve pages of a user's saved listing.
#[async_trait]
pub trait SavedPostsSource: Send + Sync {
    async fn saved_page(&self, session: &Session, page: &SavedPage)
    -> Result<Listing, RedditError>;
}

#[async_trait]
impl SavedPostsSource for RedditClient {
    async fn saved_page(
        &self,
        session: &Session,
        page: &SavedPage,
    ) -> Result<Listing, RedditError> {
        self.get_saved_posts(session, page).await
    }
}
