//! Markdown to sanitized HTML.
//!
//! Post bodies use Reddit-flavoured markdown. The output of every function
//! here is run through ammonia, so callers may embed it into a page as-is.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};

const LINK_REL: &str = "noopener noreferrer";

/// Renders a full markdown document (comment body, self text).
pub fn render_block(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options());
    let events = parser.map(|event| match event {
        Event::Start(Tag::CodeBlock(_)) => Event::Html(CowStr::Borrowed("<pre><code>")),
        Event::End(TagEnd::CodeBlock) => Event::Html(CowStr::Borrowed("</code></pre>\n")),
        other => other,
    });
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, events);
    sanitize(&output)
}

/// Renders a single line of inline markdown (titles). No `<p>` wrapper and no
/// block constructs: a title starting with `#`, `1.`, a fence or a rule keeps
/// that text.
pub fn render_inline(markdown: &str) -> String {
    let line = markdown.replace(['\r', '\n'], " ");
    let line = line.trim();
    let line = if opens_block(line) {
        escape_block_start(line)
    } else {
        line.to_string()
    };
    let parser = Parser::new_ext(&line, markdown_options());
    let events = parser.filter(|event| {
        !matches!(
            event,
            Event::Start(Tag::Paragraph) | Event::End(TagEnd::Paragraph)
        )
    });
    let mut output = String::with_capacity(line.len() + 16);
    html::push_html(&mut output, events);
    sanitize(output.trim_end())
}

pub fn sanitize(html: &str) -> String {
    ammonia::Builder::default()
        .link_rel(Some(LINK_REL))
        .clean(html)
        .to_string()
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

/// A single line that does not parse as a plain paragraph starts with block
/// syntax (heading, list, quote, fence, rule, html block).
fn opens_block(line: &str) -> bool {
    !line.is_empty()
        && !matches!(
            Parser::new_ext(line, markdown_options()).next(),
            Some(Event::Start(Tag::Paragraph))
        )
}

fn escape_block_start(line: &str) -> String {
    let digits = line.chars().take_while(|ch| ch.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if rest.starts_with(". ") || rest.starts_with(") ") || rest == "." || rest == ")" {
            return format!("{}\\{}", &line[..digits], rest);
        }
    }
    match line.chars().next() {
        Some(first) if first.is_ascii_punctuation() => format!("\\{line}"),
        _ => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_block_start, opens_block, render_block, render_inline, sanitize};

    #[test]
    fn renders_paragraphs_and_emphasis() {
        let html = render_block("Hello **world**\n\nSecond");
        assert!(html.contains("<p>Hello <strong>world</strong></p>"));
        assert!(html.contains("<p>Second</p>"));
    }

    #[test]
    fn code_blocks_drop_language_class() {
        let html = render_block("```rust\nfn main() {}\n```");
        assert!(html.contains("<pre><code>fn main() {}\n</code></pre>"));
        assert!(!html.contains("language-"));
    }

    #[test]
    fn inline_code_is_escaped_once() {
        let html = render_block("use `a && b` here");
        assert!(html.contains("<code>a &amp;&amp; b</code>"));
    }

    #[test]
    fn strikethrough_and_tables() {
        let html = render_block("~~gone~~\n\n| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn strips_script_tags() {
        let html = render_block("<script>alert(1)</script>\n\nsafe");
        assert!(!html.contains("<script"));
        assert!(html.contains("safe"));
    }

    #[test]
    fn strips_event_handlers() {
        let html = render_block("<img src=\"x.png\" onerror=\"alert(1)\">");
        assert!(!html.contains("onerror"));
    }

    #[test]
    fn strips_javascript_links() {
        let html = render_block("[click](javascript:alert(1))");
        assert!(!html.contains("javascript:"));
        assert!(html.contains("click"));
    }

    #[test]
    fn links_get_rel() {
        let html = render_block("[rust](https://www.rust-lang.org)");
        assert!(html.contains("href=\"https://www.rust-lang.org\""));
        assert!(html.contains("rel=\"noopener noreferrer\""));
    }

    #[test]
    fn inline_has_no_paragraph() {
        let html = render_inline("A *quick* title");
        assert_eq!(html, "A <em>quick</em> title");
    }

    #[test]
    fn inline_keeps_heading_marker() {
        assert_eq!(render_inline("# not a heading"), "# not a heading");
        assert_eq!(render_inline("1. first"), "1. first");
    }

    #[test]
    fn inline_keeps_fences_and_rules_as_text() {
        assert_eq!(render_inline("```rust"), "```rust");
        assert_eq!(render_inline("~~~ tildes"), "~~~ tildes");
        assert_eq!(render_inline("___"), "___");
        assert_eq!(render_inline("* not a list"), "* not a list");
        assert_eq!(render_inline("> not a quote"), "&gt; not a quote");
    }

    #[test]
    fn inline_leading_emphasis_still_renders() {
        assert_eq!(render_inline("*Quick* title"), "<em>Quick</em> title");
        assert_eq!(render_inline("`code` first"), "<code>code</code> first");
    }

    #[test]
    fn inline_escapes_markup() {
        let html = render_inline("Tom & Jerry <iframe src=\"x\"></iframe>");
        assert!(html.contains("Tom &amp; Jerry"));
        assert!(!html.contains("<iframe"));
    }

    #[test]
    fn escape_block_start_only_touches_markers() {
        assert_eq!(escape_block_start("> quote"), "\\> quote");
        assert_eq!(escape_block_start("2) two"), "2\\) two");
        assert_eq!(escape_block_start("2024 recap"), "2024 recap");
        assert_eq!(escape_block_start("plain"), "plain");
        assert_eq!(escape_block_start("```"), "\\```");
    }

    #[test]
    fn opens_block_detects_block_syntax() {
        assert!(opens_block("# heading"));
        assert!(opens_block("---"));
        assert!(opens_block("```"));
        assert!(!opens_block("2024 recap"));
        assert!(!opens_block("*emphasis* first"));
        assert!(!opens_block(""));
    }

    #[test]
    fn sanitize_drops_style_blocks() {
        let html = sanitize("<style>body{}</style><b>ok</b>");
        assert_eq!(html, "<b>ok</b>");
    }
}
