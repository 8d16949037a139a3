use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid fullname: {0}")]
    InvalidFullname(String),
    #[error("unknown pending action: {0}")]
    UnknownAction(String),
    #[error("invalid post type: {0}")]
    InvalidPostType(String),
}
