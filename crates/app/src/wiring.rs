use std::sync::Arc;

use rand::RngCore;
use rand::rngs::OsRng;
use reqwest::Client;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

use crate::config::AppConfig;
use crate::state::AppState;
use ss4r_infra::db::{DbPoolError, connect};
use ss4r_infra::reddit::RedditClient;
use ss4r_infra::search::{PostIndex, SearchIndexError};

const STATE_SECRET_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("search index error: {0}")]
    SearchIndex(#[from] SearchIndexError),
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("db error: {0}")]
    Db(#[from] DbPoolError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn build_state(config: AppConfig) -> Result<AppState, WiringError> {
    std::fs::create_dir_all(&config.data_dir)?;
    let search = PostIndex::open_or_create(&config.index_dir)?;
    let db = connect(&config.database_url)?;
    let client = Client::builder().timeout(config.request_timeout).build()?;
    let reddit = RedditClient::new(client, config.reddit());
    let state_secret = match config.state_secret.clone() {
        Some(secret) => secret,
        None => {
            warn!("SS4R_STATE_SECRET not set; login links expire on restart");
            random_secret()
        }
    };
    Ok(AppState {
        config: Arc::new(config),
        db,
        search: Arc::new(search),
        reddit,
        state_secret: Arc::new(state_secret),
        sync_lock: Arc::new(Mutex::new(())),
    })
}

fn random_secret() -> String {
    let mut bytes = [0u8; STATE_SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
