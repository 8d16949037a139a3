use std::collections::HashSet;

use crate::domain::post::Post;

/// Number of items requested per listing page.
pub const PAGE_LIMIT: usize = 100;

pub fn append_page(all: &mut Vec<Post>, page: Vec<Post>) {
    all.extend(page);
}

/// Puts `newer` in front of `existing`. When an id shows up in both, the copy
/// from `newer` is kept and the stale one dropped.
pub fn prepend_newer(newer: Vec<Post>, existing: Vec<Post>) -> Vec<Post> {
    let mut seen = HashSet::with_capacity(newer.len() + existing.len());
    let mut merged = Vec::with_capacity(newer.len() + existing.len());
    for post in newer.into_iter().chain(existing) {
        if seen.insert(post.id.clone()) {
            merged.push(post);
        }
    }
    merged
}

pub fn newest_id(posts: &[Post]) -> Option<&str> {
    posts.first().map(|post| post.id.as_str())
}

#[cfg(test)]
mod tests {
    use super::{append_page, newest_id, prepend_newer};
    use crate::domain::post::{Post, PostType};

    fn post(id: &str, title: &str) -> Post {
        Post {
            post_type: PostType::Comment,
            title: title.to_string(),
            content: None,
            id: id.to_string(),
            subreddit: "rust".to_string(),
            permalink: format!("/r/rust/{id}"),
            url: None,
            thumbnail: None,
        }
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|post| post.id.as_str()).collect()
    }

    #[test]
    fn append_keeps_page_order() {
        let mut all = vec![post("t1_a", "a"), post("t1_b", "b")];
        append_page(&mut all, vec![post("t1_c", "c"), post("t1_d", "d")]);
        assert_eq!(ids(&all), vec!["t1_a", "t1_b", "t1_c", "t1_d"]);
    }

    #[test]
    fn prepend_keeps_relative_order() {
        let merged = prepend_newer(
            vec![post("t1_x", "x"), post("t1_y", "y")],
            vec![post("t1_a", "a"), post("t1_b", "b")],
        );
        assert_eq!(ids(&merged), vec!["t1_x", "t1_y", "t1_a", "t1_b"]);
    }

    #[test]
    fn prepend_prefers_newer_copy() {
        let merged = prepend_newer(
            vec![post("t1_b", "fresh")],
            vec![post("t1_a", "a"), post("t1_b", "stale")],
        );
        assert_eq!(ids(&merged), vec!["t1_b", "t1_a"]);
        assert_eq!(merged[0].title, "fresh");
    }

    #[test]
    fn newest_id_reads_first() {
        assert_eq!(newest_id(&[]), None);
        assert_eq!(newest_id(&[post("t1_a", "a"), post("t1_b", "b")]), Some("t1_a"));
    }
}
