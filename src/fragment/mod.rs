use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::record::UserRecord;

pub const DEFAULT_TITLE_TEMPLATE: &str = "User - {id}";
pub const DEFAULT_CONTENT_TEMPLATE: &str = "{content}";

/// One rendered post, ready to be appended to the container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder {{{name}}} in {slot} template, expected {{id}} or {{content}}")]
    UnknownPlaceholder { slot: &'static str, name: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Piece {
    Id,
    Content,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Part {
    Literal(String),
    Field(Piece),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Slot {
    source: String,
    parts: Vec<Part>,
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"))
}

impl Slot {
    fn parse(slot: &'static str, source: &str) -> Result<Self, TemplateError> {
        let mut parts = Vec::new();
        let mut last = 0;
        for cap in placeholder_re().captures_iter(source) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let piece = match name.as_str() {
                "id" => Piece::Id,
                "content" => Piece::Content,
                other => {
                    return Err(TemplateError::UnknownPlaceholder {
                        slot,
                        name: other.to_string(),
                    })
                }
            };
            if whole.start() > last {
                parts.push(Part::Literal(source[last..whole.start()].to_string()));
            }
            parts.push(Part::Field(piece));
            last = whole.end();
        }
        if last < source.len() {
            parts.push(Part::Literal(source[last..].to_string()));
        }
        Ok(Self {
            source: source.to_string(),
            parts,
        })
    }

    fn fill(&self, record: &UserRecord) -> String {
        let mut out = String::with_capacity(self.source.len() + record.content.len());
        for part in &self.parts {
            match part {
                Part::Literal(s) => out.push_str(s),
                Part::Field(Piece::Id) => out.push_str(&record.id),
                Part::Field(Piece::Content) => out.push_str(&record.content),
            }
        }
        out
    }
}

/// The post template: a title slot and a content slot, each a pattern over
/// `{id}` and `{content}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    title: Slot,
    content: Slot,
}

impl Template {
    pub fn new(title: &str, content: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            title: Slot::parse("title", title)?,
            content: Slot::parse("content", content)?,
        })
    }

    pub fn title_pattern(&self) -> &str {
        &self.title.source
    }

    pub fn content_pattern(&self) -> &str {
        &self.content.source
    }
}

impl Default for Template {
    fn default() -> Self {
        Self {
            title: Slot {
                source: DEFAULT_TITLE_TEMPLATE.to_string(),
                parts: vec![
                    Part::Literal("User - ".to_string()),
                    Part::Field(Piece::Id),
                ],
            },
            content: Slot {
                source: DEFAULT_CONTENT_TEMPLATE.to_string(),
                parts: vec![Part::Field(Piece::Content)],
            },
        }
    }
}

/// Instantiates the template for one record.
pub fn render(template: &Template, record: &UserRecord) -> Fragment {
    Fragment {
        title: template.title.fill(record),
        content: template.content.fill(record),
    }
}
