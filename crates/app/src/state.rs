use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::AppConfig;
use ss4r_infra::db::DbPool;
use ss4r_infra::reddit::RedditClient;
use ss4r_infra::search::PostIndex;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub search: Arc<PostIndex>,
    pub reddit: RedditClient,
    pub state_secret: Arc<String>,
    /// Held for the duration of a sync so runs never overlap.
    pub sync_lock: Arc<Mutex<()>>,
}

#[cfg(test)]
impl AppState {
    pub async fn for_tests(config: AppConfig) -> Self {
        let db = ss4r_infra::db::connect_in_memory().await.unwrap();
        ss4r_infra::db::run_migrations(&db).await.unwrap();
        let state_secret = config.state_secret.clone().unwrap_or_default();
        let reddit = RedditClient::new(reqwest::Client::new(), config.reddit());
        Self {
            config: Arc::new(config),
            db,
            search: Arc::new(PostIndex::open_in_memory().unwrap()),
            reddit,
            state_secret: Arc::new(state_secret),
            sync_lock: Arc::new(Mutex::new(())),
        }
    }
}
