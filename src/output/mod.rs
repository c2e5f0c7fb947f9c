pub mod report;

use serde::Serialize;

use crate::fragment::Fragment;
use crate::view::PageView;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Xml,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".xml") {
        return Some(OutputFormat::Xml);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// Everything a renderer needs about a finished scroll.
#[derive(Clone, Debug, Serialize)]
pub struct FeedSnapshot<'a> {
    pub offset: u64,
    pub exhausted: bool,
    pub sentinel: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
    pub posts: &'a [Fragment],
}

impl<'a> FeedSnapshot<'a> {
    pub fn new(view: &'a PageView, offset: u64, exhausted: bool) -> Self {
        Self {
            offset,
            exhausted,
            sentinel: &view.sentinel,
            error: view.error.as_deref(),
            posts: &view.container,
        }
    }
}

pub fn render(format: OutputFormat, feed: &FeedSnapshot<'_>) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(feed),
        OutputFormat::Json => render_json(feed),
        OutputFormat::Xml => render_xml(feed),
        OutputFormat::Html => report::render_html(feed),
    }
}

pub fn render_text(feed: &FeedSnapshot<'_>) -> Vec<u8> {
    let mut out = String::new();
    for post in feed.posts {
        out.push_str(&post.title);
        out.push_str(": ");
        out.push_str(&post.content);
        out.push('\n');
    }
    if let Some(error) = feed.error {
        out.push_str("error: ");
        out.push_str(error);
        out.push('\n');
    }
    out.push_str(feed.sentinel);
    out.push('\n');
    out.into_bytes()
}

pub fn render_json(feed: &FeedSnapshot<'_>) -> Vec<u8> {
    serde_json::to_vec_pretty(feed).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub(crate) fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn render_xml(feed: &FeedSnapshot<'_>) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str(&format!(
        "<feed offset=\"{}\" exhausted=\"{}\">\n",
        feed.offset, feed.exhausted
    ));
    for post in feed.posts {
        out.push_str("  <post>\n");
        out.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
        out.push_str(&format!(
            "    <content>{}</content>\n",
            escape_xml(&post.content)
        ));
        out.push_str("  </post>\n");
    }
    if let Some(error) = feed.error {
        out.push_str(&format!("  <error>{}</error>\n", escape_xml(error)));
    }
    out.push_str(&format!(
        "  <sentinel>{}</sentinel>\n",
        escape_xml(feed.sentinel)
    ));
    out.push_str("</feed>\n");
    out.into_bytes()
}
