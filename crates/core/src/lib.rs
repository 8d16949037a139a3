pub mod domain;
pub mod error;
pub mod types;

pub use error::CoreError;
