pub mod migrations;
pub mod pool;
pub mod posts_repo;
pub mod session_repo;

pub use migrations::run_migrations;
pub use pool::{DbPool, DbPoolError, connect, connect_in_memory};
pub use posts_repo::{
    PostsRepoError, clear_posts, count_posts, load_posts, load_posts_by_ids, load_posts_page,
    replace_posts,
};
pub use session_repo::{SessionRepoError, clear_session, load_session, save_session};
