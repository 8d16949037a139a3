pub mod menu;
pub mod merge;
pub mod post;
pub mod search;
pub mod session;
