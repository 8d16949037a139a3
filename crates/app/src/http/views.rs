//! Server-rendered HTML for the post browser.
//!
//! Text coming from the user or the request is escaped with
//! `ammonia::clean_text`. Post titles and bodies are already sanitized at
//! parse time and are inserted as-is.

use std::fmt::Write;

use ammonia::clean_text;

use ss4r_core::domain::menu::{ClickTarget, Header, MenuItem, MenuState};
use ss4r_core::domain::post::Post;
use ss4r_core::domain::session::PendingAction;

const STYLE: &str = "body{margin:0;font-family:sans-serif}\
header{display:flex;gap:1rem;align-items:center;padding:.5rem 1rem;background:#f3f4f6}\
.brand{font-size:1.5rem;font-weight:900;text-decoration:none;color:inherit}\
.account{position:relative;z-index:2}\
.menu{position:absolute;top:100%;margin:0;padding:0;list-style:none;background:#f3f4f6;z-index:3}\
.backdrop{position:fixed;inset:0;z-index:1}\
.posts{list-style:none;padding:0 1rem}\
.post{display:flex;gap:1rem;padding:.75rem 0;border-bottom:1px solid #e5e7eb}\
.thumb{width:70px;height:70px;object-fit:cover}";

/// Where the page was requested from, so links can keep the current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Home { page: usize },
    Search { query: String, page: usize },
}

impl Location {
    pub fn href(&self, menu: MenuState) -> String {
        let mut href = match self {
            Location::Home { .. } => "/".to_string(),
            Location::Search { query, .. } => {
                format!("/search?q={}", urlencoding::encode(query))
            }
        };
        let mut params = Vec::new();
        let page = self.page();
        if page > 1 {
            params.push(format!("page={page}"));
        }
        if menu.is_visible() {
            params.push("menu=open".to_string());
        }
        if !params.is_empty() {
            href.push(if href.contains('?') { '&' } else { '?' });
            href.push_str(&params.join("&"));
        }
        href
    }

    pub fn page(&self) -> usize {
        match self {
            Location::Home { page } | Location::Search { page, .. } => *page,
        }
    }

    fn with_page(&self, page: usize) -> Self {
        match self {
            Location::Home { .. } => Location::Home { page },
            Location::Search { query, .. } => Location::Search {
                query: query.clone(),
                page,
            },
        }
    }

    fn query(&self) -> Option<&str> {
        match self {
            Location::Home { .. } => None,
            Location::Search { query, .. } => Some(query),
        }
    }
}

pub struct PageView<'a> {
    pub header: &'a Header,
    pub location: Location,
    pub posts: &'a [Post],
    pub total: usize,
    pub page_size: usize,
    pub notice: Option<&'a str>,
}

pub fn render_page(view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    let _ = write!(html, "<title>{}</title>", view.header.brand());
    let _ = write!(html, "<style>{STYLE}</style></head><body>");
    render_header(&mut html, view.header, &view.location);
    html.push_str("<main>");
    if let Some(notice) = view.notice {
        let _ = write!(html, "<p class=\"notice\">{}</p>", clean_text(notice));
    }
    render_posts(&mut html, view.posts);
    render_pager(&mut html, view);
    html.push_str("</main></body></html>");
    html
}

fn render_header(html: &mut String, header: &Header, location: &Location) {
    let menu = header.menu;
    if menu.is_visible() {
        let closed = menu.after_click(ClickTarget::Outside);
        let _ = write!(
            html,
            "<a class=\"backdrop\" aria-label=\"Close menu\" href=\"{}\"></a>",
            clean_text(&location.href(closed))
        );
    }
    html.push_str("<header>");
    let _ = write!(html, "<a class=\"brand\" href=\"/\">{}</a>", header.brand());
    html.push_str("<nav class=\"account\">");
    match header.user_label() {
        Some(label) => {
            let _ = write!(
                html,
                "<a class=\"account-toggle\" href=\"{}\">{}</a>",
                clean_text(&location.href(menu.toggled())),
                clean_text(&label)
            );
            if menu.is_visible() {
                html.push_str("<ul class=\"menu\">");
                for item in MenuItem::ALL {
                    let _ = write!(
                        html,
                        "<li><form method=\"post\" action=\"{}\"><button type=\"submit\">{}</button></form></li>",
                        item.action_path(),
                        clean_text(item.label())
                    );
                }
                html.push_str("</ul>");
            }
        }
        None => {
            let _ = write!(
                html,
                "<a class=\"login\" href=\"/login?action={}\">Log in</a>",
                PendingAction::GetAllPosts.as_str()
            );
        }
    }
    html.push_str("</nav>");
    let _ = write!(
        html,
        "<form class=\"search\" action=\"/search\" method=\"get\"><input type=\"search\" name=\"q\" placeholder=\"Search\" value=\"{}\"></form>",
        clean_text(location.query().unwrap_or_default())
    );
    html.push_str("</header>");
}

fn render_posts(html: &mut String, posts: &[Post]) {
    if posts.is_empty() {
        html.push_str("<p class=\"empty\">No saved posts.</p>");
        return;
    }
    html.push_str("<ol class=\"posts\">");
    for post in posts {
        render_post(html, post);
    }
    html.push_str("</ol>");
}

fn render_post(html: &mut String, post: &Post) {
    let _ = write!(
        html,
        "<li class=\"post {}\" id=\"{}\">",
        post.post_type.as_str(),
        clean_text(&post.id)
    );
    if post.has_thumbnail() {
        let thumbnail = post.thumbnail.as_deref().unwrap_or_default();
        let _ = write!(
            html,
            "<img class=\"thumb\" loading=\"lazy\" alt=\"\" src=\"{}\">",
            clean_text(thumbnail)
        );
    }
    html.push_str("<article>");
    let _ = write!(
        html,
        "<a class=\"subreddit\" href=\"https://www.reddit.com/r/{sub}\">r/{sub}</a>",
        sub = clean_text(&post.subreddit)
    );
    let _ = write!(
        html,
        "<h2><a href=\"{}\" rel=\"noopener noreferrer\">{}</a></h2>",
        clean_text(&post.reddit_url()),
        post.title
    );
    if let Some(url) = post.link_url() {
        let _ = write!(
            html,
            "<a class=\"link\" href=\"{}\" rel=\"noopener noreferrer\">{}</a>",
            clean_text(url),
            clean_text(url)
        );
    }
    if let Some(content) = &post.content {
        let _ = write!(html, "<div class=\"content\">{content}</div>");
    }
    html.push_str("</article></li>");
}

fn render_pager(html: &mut String, view: &PageView<'_>) {
    let page = view.location.page().max(1);
    let page_size = view.page_size.max(1);
    let has_next = page.saturating_mul(page_size) < view.total;
    if page == 1 && !has_next {
        return;
    }
    html.push_str("<nav class=\"pager\">");
    let closed = MenuState::default();
    if page > 1 {
        let _ = write!(
            html,
            "<a rel=\"prev\" href=\"{}\">Newer</a>",
            clean_text(&view.location.with_page(page - 1).href(closed))
        );
    }
    if has_next {
        let _ = write!(
            html,
            "<a rel=\"next\" href=\"{}\">Older</a>",
            clean_text(&view.location.with_page(page + 1).href(closed))
        );
    }
    html.push_str("</nav>");
}

#[cfg(test)]
mod tests {
    use super::{Location, PageView, render_page};
    use ammonia::clean_text;
    use ss4r_core::domain::menu::{Header, MenuItem, MenuState};
    use ss4r_core::domain::post::{Post, PostType};

    fn post() -> Post {
        Post {
            post_type: PostType::Link,
            title: "Hello <em>world</em>".to_string(),
            content: Some("<p>body</p>".to_string()),
            id: "t3_abc".to_string(),
            subreddit: "rust".to_string(),
            permalink: "/r/rust/comments/abc/".to_string(),
            url: Some("https://example.com/a".to_string()),
            thumbnail: Some("https://example.com/thumb.jpg".to_string()),
        }
    }

    fn render(header: &Header, location: Location, posts: &[Post], total: usize) -> String {
        render_page(&PageView {
            header,
            location,
            posts,
            total,
            page_size: 1,
            notice: None,
        })
    }

    #[test]
    fn closed_menu_shows_toggle_only() {
        let header = Header::new(Some("spez".to_string()), MenuState::default());
        let html = render(&header, Location::Home { page: 1 }, &[post()], 1);
        assert!(html.contains(">SS4R</a>"));
        assert!(html.contains(&clean_text("u/spez")));
        assert!(html.contains(&clean_text("/?menu=open")));
        assert!(!html.contains("class=\"menu\""));
        assert!(!html.contains("class=\"backdrop\""));
    }

    #[test]
    fn open_menu_lists_items_and_backdrop() {
        let header = Header::new(Some("spez".to_string()), MenuState::new(true));
        let html = render(&header, Location::Home { page: 1 }, &[], 0);
        assert!(html.contains("class=\"menu\""));
        for item in MenuItem::ALL {
            assert!(html.contains(item.action_path()));
        }
        let backdrop = format!(
            "class=\"backdrop\" aria-label=\"Close menu\" href=\"{}\"",
            clean_text("/")
        );
        assert!(html.contains(&backdrop));
    }

    #[test]
    fn anonymous_header_links_to_login() {
        let header = Header::new(None, MenuState::default());
        let html = render(&header, Location::Home { page: 1 }, &[], 0);
        assert!(html.contains("/login?action=getAllPosts"));
        assert!(html.contains("No saved posts."));
    }

    #[test]
    fn post_markup_keeps_sanitized_html() {
        let header = Header::new(None, MenuState::default());
        let html = render(&header, Location::Home { page: 1 }, &[post()], 1);
        assert!(html.contains("Hello <em>world</em>"));
        assert!(html.contains("<div class=\"content\"><p>body</p></div>"));
        assert!(html.contains("class=\"thumb\""));
    }

    #[test]
    fn script_urls_are_not_linked() {
        let header = Header::new(None, MenuState::default());
        let mut hostile = post();
        hostile.url = Some("javascript:alert(document.cookie)".to_string());
        let html = render(&header, Location::Home { page: 1 }, &[hostile], 1);
        assert!(!html.contains("javascript"));
        assert!(!html.contains("class=\"link\""));
        let html = render(&header, Location::Home { page: 1 }, &[post()], 1);
        let link = format!(
            "class=\"link\" href=\"{}\"",
            clean_text("https://example.com/a")
        );
        assert!(html.contains(&link));
    }

    #[test]
    fn search_value_is_escaped() {
        let header = Header::new(None, MenuState::default());
        let location = Location::Search {
            query: "\"><script>".to_string(),
            page: 1,
        };
        let html = render(&header, location, &[], 0);
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn pager_links_follow_location() {
        let location = Location::Search {
            query: "async rust".to_string(),
            page: 2,
        };
        assert_eq!(
            location.href(MenuState::new(true)),
            "/search?q=async%20rust&page=2&menu=open"
        );
        let header = Header::new(None, MenuState::default());
        let html = render(&header, location, &[post()], 3);
        assert!(html.contains("rel=\"prev\""));
        assert!(html.contains("rel=\"next\""));
    }
}
