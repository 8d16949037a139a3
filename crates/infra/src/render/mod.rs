pub mod markdown;
pub mod text;

pub use markdown::{render_block, render_inline, sanitize};
pub use text::html_to_text;
