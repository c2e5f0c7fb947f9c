use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::loader::LoadError;

/// One `[identifier, content]` pair as sent by the server.
///
/// Both fields are kept as text. Strings are taken as-is, `null` becomes the
/// empty string and booleans keep their JSON notation. Numbers are written
/// the way a browser prints them: `1.0` is `1`, and fractions or exponents
/// only show up where the value needs them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub content: String,
}

impl UserRecord {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// Records in the order the server returned them. Empty means exhausted.
pub type ResultPage = Vec<UserRecord>;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    Null,
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Text(s) => s,
            Scalar::Number(n) => number_text(&n),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Null => String::new(),
        }
    }
}

fn number_text(n: &serde_json::Number) -> String {
    if n.is_u64() || n.is_i64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        // plain decimal up to 1e21, exponent form beyond
        Some(f) if f.is_finite() && f.abs() < 1e21 => format!("{f}"),
        _ => n.to_string(),
    }
}

struct PairVisitor;

impl<'de> Visitor<'de> for PairVisitor {
    type Value = UserRecord;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a two-element [identifier, content] array")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let id: Scalar = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let content: Scalar = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(3, &self));
        }
        Ok(UserRecord {
            id: id.into(),
            content: content.into(),
        })
    }
}

impl<'de> Deserialize<'de> for UserRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(PairVisitor)
    }
}

/// Parses a whole response body. Nothing is returned on error, so callers
/// never see half a page.
pub fn parse_page(body: &[u8]) -> Result<ResultPage, LoadError> {
    serde_json::from_slice::<ResultPage>(body).map_err(|e| LoadError::MalformedBody { source: e })
}
