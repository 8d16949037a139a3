pub mod index_refresh;
pub mod saved_sync;
