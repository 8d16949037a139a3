use ss4r_core::domain::post::{Post, PostType};

use crate::reddit::listing::Thing;
use crate::render::{render_block, render_inline};

/// Converts listing children into posts, keeping the listing order.
pub fn parse_saved_posts(children: Vec<Thing>) -> Vec<Post> {
    children.into_iter().map(parse_thing).collect()
}

fn parse_thing(thing: Thing) -> Post {
    let post_type = PostType::from_kind(&thing.kind);
    let data = thing.data;
    let (raw_title, raw_content) = match post_type {
        PostType::Link => (data.title, data.selftext),
        PostType::Comment => (data.link_title, data.body),
    };
    let title = render_inline(raw_title.as_deref().unwrap_or_default());
    let content = raw_content
        .filter(|value| !value.trim().is_empty())
        .map(|value| render_block(&value));
    let (url, thumbnail) = match post_type {
        PostType::Link => (data.url, data.thumbnail),
        PostType::Comment => (None, None),
    };
    Post {
        post_type,
        title,
        content,
        id: data.name,
        subreddit: data.subreddit,
        permalink: data.permalink,
        url,
        thumbnail,
    }
}
