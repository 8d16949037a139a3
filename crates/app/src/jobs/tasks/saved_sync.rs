use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::jobs::JobError;
use crate::state::AppState;
use ss4r_core::domain::merge::{PAGE_LIMIT, append_page, newest_id, prepend_newer};
use ss4r_core::domain::post::Post;
use ss4r_core::domain::session::{PendingAction, Session};
use ss4r_core::types::fullname::Fullname;
use ss4r_infra::db::{clear_posts, clear_session, load_posts, load_session, replace_posts};
use ss4r_infra::reddit::{RedditError, SavedPage, SavedPostsSource, parse_saved_posts};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncStats {
    pub pages: usize,
    pub fetched: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced(SyncStats),
    /// No usable session; the action resumes after the user logs in again.
    NeedsAuth(PendingAction),
}

#[derive(Debug)]
pub struct FetchedPosts {
    pub posts: Vec<Post>,
    pub stats: SyncStats,
}

pub async fn run(state: &AppState, action: PendingAction) -> Result<SyncOutcome, JobError> {
    let _guard = state.sync_lock.lock().await;
    let session = load_session(&state.db)
        .await?
        .filter(|session| session.is_authenticated(Utc::now()));
    let Some(session) = session else {
        return require_login(state, action).await;
    };

    let max_pages = state.config.max_pages;
    let fetched = match action {
        PendingAction::GetAllPosts => get_all_posts(&state.reddit, &session, max_pages).await,
        PendingAction::GetNewPosts => {
            let existing = load_posts(&state.db).await?;
            get_new_posts(&state.reddit, &session, existing, max_pages).await
        }
    };
    let fetched = match fetched {
        Ok(fetched) => fetched,
        Err(JobError::Reddit(RedditError::Unauthorized)) => {
            warn!(action = action.as_str(), "token rejected by api");
            return require_login(state, action).await;
        }
        Err(err) => return Err(err),
    };

    replace_posts(&state.db, &fetched.posts).await?;
    let search = state.search.clone();
    let posts = fetched.posts;
    tokio::task::spawn_blocking(move || search.rebuild(&posts)).await??;
    info!(
        action = action.as_str(),
        pages = fetched.stats.pages,
        fetched = fetched.stats.fetched,
        total = fetched.stats.total,
        "saved posts synced"
    );
    Ok(SyncOutcome::Synced(fetched.stats))
}

async fn require_login(state: &AppState, action: PendingAction) -> Result<SyncOutcome, JobError> {
    if action == PendingAction::GetAllPosts {
        clear_posts(&state.db).await?;
    }
    clear_session(&state.db).await?;
    info!(action = action.as_str(), "login required");
    Ok(SyncOutcome::NeedsAuth(action))
}

/// Walks the saved listing from the top, following `after` until it runs out.
pub async fn get_all_posts<S>(
    source: &S,
    session: &Session,
    max_pages: usize,
) -> Result<FetchedPosts, JobError>
where
    S: SavedPostsSource + ?Sized,
{
    let mut saved = Vec::new();
    let mut stats = SyncStats::default();
    let mut after: Option<Fullname> = None;
    let mut seen = HashSet::new();

    loop {
        let page = SavedPage {
            after: after.clone(),
            count: saved.len(),
            ..SavedPage::default()
        };
        let listing = source.saved_page(session, &page).await?;
        stats.pages += 1;
        let next = listing.after().map(str::to_string);
        let posts = parse_saved_posts(listing.data.children);
        stats.fetched += posts.len();
        append_page(&mut saved, posts);
        debug!(pages = stats.pages, collected = saved.len(), "saved page fetched");

        let Some(next) = next else {
            break;
        };
        if !seen.insert(next.clone()) {
            warn!(cursor = %next, "after cursor repeated; stopping");
            break;
        }
        if max_pages > 0 && stats.pages >= max_pages {
            break;
        }
        after = Some(Fullname::try_from(next.as_str())?);
    }

    stats.total = saved.len();
    Ok(FetchedPosts {
        posts: saved,
        stats,
    })
}

/// Fetches pages newer than the first stored post and prepends them, until a
/// page comes back short.
pub async fn get_new_posts<S>(
    source: &S,
    session: &Session,
    existing: Vec<Post>,
    max_pages: usize,
) -> Result<FetchedPosts, JobError>
where
    S: SavedPostsSource + ?Sized,
{
    if existing.is_empty() {
        info!("no stored posts; running full sync");
        return get_all_posts(source, session, max_pages).await;
    }

    let mut all = existing;
    let mut stats = SyncStats::default();
    loop {
        let Some(newest) = newest_id(&all).map(str::to_string) else {
            break;
        };
        let page = SavedPage {
            before: Some(Fullname::try_from(newest.as_str())?),
            ..SavedPage::default()
        };
        let listing = source.saved_page(session, &page).await?;
        stats.pages += 1;
        let dist = listing.dist();
        let newer = parse_saved_posts(listing.data.children);
        stats.fetched += newer.len();
        all = prepend_newer(newer, all);

        if dist < PAGE_LIMIT {
            break;
        }
        if newest_id(&all) == Some(newest.as_str()) {
            warn!(cursor = %newest, "before cursor did not advance; stopping");
            break;
        }
        if max_pages > 0 && stats.pages >= max_pages {
            break;
        }
    }

    stats.total = all.len();
    Ok(FetchedPosts { posts: all, stats })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{SyncOutcome, get_all_posts, get_new_posts, run};
    use crate::config::AppConfig;
    use crate::jobs::JobError;
    use crate::state::AppState;
    use ss4r_core::domain::post::{Post, PostType};
    use ss4r_core::domain::session::{PendingAction, Session};
    use ss4r_infra::db::{count_posts, load_session, replace_posts, save_session};
    use ss4r_infra::reddit::{Listing, RedditError, SavedPage, SavedPostsSource};

    struct FakeSource {
        pages: Mutex<VecDeque<Listing>>,
        requests: Mutex<Vec<SavedPage>>,
    }

    impl FakeSource {
        fn new(pages: Vec<Listing>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<SavedPage> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SavedPostsSource for FakeSource {
        async fn saved_page(
            &self,
            _session: &Session,
            page: &SavedPage,
        ) -> Result<Listing, RedditError> {
            self.requests.lock().unwrap().push(page.clone());
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(RedditError::MissingData("no more pages"))
        }
    }

    fn session() -> Session {
        Session::from_token(
            "token".to_string(),
            None,
            "spez".to_string(),
            None,
            3600,
            Utc::now(),
        )
    }

    fn listing(ids: &[String], after: Option<&str>) -> Listing {
        let children: Vec<_> = ids
            .iter()
            .map(|id| {
                json!({
                    "kind": "t1",
                    "data": {
                        "name": id,
                        "link_title": format!("title {id}"),
                        "body": "body",
                        "subreddit": "rust",
                        "permalink": format!("/r/rust/{id}")
                    }
                })
            })
            .collect();
        serde_json::from_value(json!({
            "kind": "Listing",
            "data": {"after": after, "dist": ids.len(), "children": children}
        }))
        .unwrap()
    }

    fn ids(prefix: &str, count: usize) -> Vec<String> {
        (0..count).map(|n| format!("t1_{prefix}{n}")).collect()
    }

    fn stored(id: &str) -> Post {
        Post {
            post_type: PostType::Comment,
            title: "stored".to_string(),
            content: None,
            id: id.to_string(),
            subreddit: "rust".to_string(),
            permalink: format!("/r/rust/{id}"),
            url: None,
            thumbnail: None,
        }
    }

    fn post_ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|post| post.id.as_str()).collect()
    }

    #[tokio::test]
    async fn full_sync_follows_after_until_absent() {
        let source = FakeSource::new(vec![
            listing(&ids("a", 2), Some("t1_a1")),
            listing(&ids("b", 2), Some("t1_b1")),
            listing(&ids("c", 1), None),
        ]);
        let fetched = get_all_posts(&source, &session(), 0).await.unwrap();
        assert_eq!(
            post_ids(&fetched.posts),
            vec!["t1_a0", "t1_a1", "t1_b0", "t1_b1", "t1_c0"]
        );
        assert_eq!(fetched.stats.pages, 3);
        assert_eq!(fetched.stats.total, 5);

        let requests = source.requests();
        assert!(requests[0].after.is_none());
        assert_eq!(requests[0].count, 0);
        assert_eq!(requests[1].after.as_ref().unwrap().as_str(), "t1_a1");
        assert_eq!(requests[1].count, 2);
        assert_eq!(requests[2].after.as_ref().unwrap().as_str(), "t1_b1");
        assert_eq!(requests[2].count, 4);
    }

    #[tokio::test]
    async fn full_sync_stops_on_repeated_cursor() {
        let source = FakeSource::new(vec![
            listing(&ids("a", 1), Some("t1_a0")),
            listing(&ids("b", 1), Some("t1_a0")),
            listing(&ids("c", 1), None),
        ]);
        let fetched = get_all_posts(&source, &session(), 0).await.unwrap();
        assert_eq!(fetched.stats.pages, 2);
        assert_eq!(post_ids(&fetched.posts), vec!["t1_a0", "t1_b0"]);
    }

    #[tokio::test]
    async fn full_sync_respects_page_cap() {
        let source = FakeSource::new(vec![
            listing(&ids("a", 1), Some("t1_a0")),
            listing(&ids("b", 1), Some("t1_b0")),
        ]);
        let fetched = get_all_posts(&source, &session(), 1).await.unwrap();
        assert_eq!(fetched.stats.pages, 1);
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test]
    async fn full_sync_rejects_malformed_cursor() {
        let source = FakeSource::new(vec![listing(&ids("a", 1), Some("t3_x&count=9"))]);
        let err = get_all_posts(&source, &session(), 0).await.unwrap_err();
        assert!(matches!(err, JobError::Cursor(_)));
    }

    #[tokio::test]
    async fn incremental_sync_prepends_until_short_page() {
        let first = ids("n", 100);
        let second = ids("m", 2);
        let source = FakeSource::new(vec![listing(&first, None), listing(&second, None)]);
        let existing = vec![stored("t1_old0"), stored("t1_old1")];

        let fetched = get_new_posts(&source, &session(), existing, 0)
            .await
            .unwrap();
        assert_eq!(fetched.stats.pages, 2);
        assert_eq!(fetched.stats.fetched, 102);
        assert_eq!(fetched.posts.len(), 104);
        assert_eq!(post_ids(&fetched.posts[..3]), vec!["t1_m0", "t1_m1", "t1_n0"]);
        assert_eq!(post_ids(&fetched.posts[102..]), vec!["t1_old0", "t1_old1"]);

        let requests = source.requests();
        assert_eq!(requests[0].before.as_ref().unwrap().as_str(), "t1_old0");
        assert_eq!(requests[1].before.as_ref().unwrap().as_str(), "t1_n0");
        assert!(requests.iter().all(|page| page.after.is_none()));
    }

    #[tokio::test]
    async fn incremental_sync_with_nothing_new() {
        let source = FakeSource::new(vec![listing(&[], None)]);
        let fetched = get_new_posts(&source, &session(), vec![stored("t1_old0")], 0)
            .await
            .unwrap();
        assert_eq!(post_ids(&fetched.posts), vec!["t1_old0"]);
        assert_eq!(fetched.stats.fetched, 0);
    }

    #[tokio::test]
    async fn incremental_sync_without_posts_runs_full_sync() {
        let source = FakeSource::new(vec![listing(&ids("a", 2), None)]);
        let fetched = get_new_posts(&source, &session(), Vec::new(), 0)
            .await
            .unwrap();
        assert_eq!(post_ids(&fetched.posts), vec!["t1_a0", "t1_a1"]);
        assert!(source.requests()[0].before.is_none());
    }

    async fn state_with_post(base: &str) -> AppState {
        let state = AppState::for_tests(AppConfig::for_tests(base)).await;
        replace_posts(&state.db, &[stored("t1_old0")]).await.unwrap();
        state
    }

    #[tokio::test]
    async fn signed_out_incremental_sync_keeps_posts() {
        let state = state_with_post("http://127.0.0.1:9").await;
        let outcome = run(&state, PendingAction::GetNewPosts).await.unwrap();
        assert_eq!(outcome, SyncOutcome::NeedsAuth(PendingAction::GetNewPosts));
        assert_eq!(count_posts(&state.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn signed_out_full_sync_clears_posts() {
        let state = state_with_post("http://127.0.0.1:9").await;
        let outcome = run(&state, PendingAction::GetAllPosts).await.unwrap();
        assert_eq!(outcome, SyncOutcome::NeedsAuth(PendingAction::GetAllPosts));
        assert_eq!(count_posts(&state.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejected_token_drops_session_and_asks_for_login() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/spez/saved"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        let state = state_with_post(&server.uri()).await;
        save_session(&state.db, &session()).await.unwrap();

        let outcome = run(&state, PendingAction::GetNewPosts).await.unwrap();
        assert_eq!(outcome, SyncOutcome::NeedsAuth(PendingAction::GetNewPosts));
        assert!(load_session(&state.db).await.unwrap().is_none());
        assert_eq!(count_posts(&state.db).await.unwrap(), 1);
    }
}
