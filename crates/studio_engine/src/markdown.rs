//! Markdown to HTML markup for assistant replies.

pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// Schemes a rendered link or image may point at. Anything else is replaced
/// by `#`. Relative references carry no scheme and are kept.
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// True when `url` cannot run script once placed in `href` or `src`.
pub fn is_safe_url(url: &str) -> bool {
    // Browsers drop whitespace and control characters inside the scheme.
    let compact: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let Some((scheme, _)) = compact.split_once(':') else {
        return true;
    };
    if scheme.contains(['/', '?', '#']) {
        return true;
    }
    SAFE_SCHEMES.contains(&scheme) || compact.starts_with("data:image/")
}

/// Escapes text for HTML element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing into a String cannot fail.
    let _ = pulldown_cmark_escape::escape_html(&mut out, text);
    out
}

/// CommonMark renderer. Raw HTML in the input is emitted as escaped text and
/// link or image targets with an unsafe scheme are replaced by `#`.
#[cfg(feature = "markdown")]
#[derive(Debug, Default, Clone, Copy)]
pub struct RichRenderer;

#[cfg(feature = "markdown")]
impl MarkdownRenderer for RichRenderer {
    fn render(&self, markdown: &str) -> String {
        use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let events = Parser::new_ext(markdown, options).map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) if !is_safe_url(&dest_url) => Event::Start(Tag::Link {
                link_type,
                dest_url: CowStr::Borrowed("#"),
                title,
                id,
            }),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) if !is_safe_url(&dest_url) => Event::Start(Tag::Image {
                link_type,
                dest_url: CowStr::Borrowed("#"),
                title,
                id,
            }),
            other => other,
        });
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events);
        out
    }
}

/// Preformatted text with angle brackets escaped.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainRenderer;

impl MarkdownRenderer for PlainRenderer {
    fn render(&self, markdown: &str) -> String {
        let escaped = markdown.replace('<', "&lt;").replace('>', "&gt;");
        format!("<pre style=\"white-space: pre-wrap; word-wrap: break-word;\">{escaped}</pre>")
    }
}

/// Picks the renderer once at startup. Without the `markdown` feature the
/// plain renderer is always used.
#[cfg(feature = "markdown")]
pub fn select_renderer(prefer_rich: bool) -> Box<dyn MarkdownRenderer> {
    if prefer_rich {
        Box::new(RichRenderer)
    } else {
        Box::new(PlainRenderer)
    }
}

#[cfg(not(feature = "markdown"))]
pub fn select_renderer(_prefer_rich: bool) -> Box<dyn MarkdownRenderer> {
    Box::new(PlainRenderer)
}
