pub mod db;
pub mod reddit;
pub mod render;
pub mod search;
