pub mod oauth_state;
pub mod same_origin;
