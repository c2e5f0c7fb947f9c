use std::str::FromStr;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Url;

/// Resolves the results path against the page URL the way a browser
/// resolves `fetch("/load")`: absolute paths replace the base path,
/// relative ones are joined onto it.
pub fn endpoint_url(base: &str, path: &str) -> Result<Url, String> {
    let base = Url::parse(base.trim()).map_err(|e| format!("invalid base URL '{base}': {e}"))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", base.scheme()));
    }
    let path = path.trim();
    if path.is_empty() {
        return Ok(base);
    }
    base.join(path)
        .map_err(|e| format!("invalid path '{path}': {e}"))
}

/// Parses a `Key: Value` header.
pub fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (key, value) = raw
        .split_once(':')
        .ok_or_else(|| "expected format 'Key: Value'".to_string())?;
    let key = HeaderName::from_str(key.trim()).map_err(|_| format!("invalid header name '{}'", key.trim()))?;
    let value =
        HeaderValue::from_str(value.trim()).map_err(|_| "invalid header value".to_string())?;
    Ok((key, value))
}

pub fn parse_query_param(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("query parameter name is empty".to_string());
    }
    if name.chars().any(|c| matches!(c, '&' | '=' | '#' | '?') || c.is_whitespace()) {
        return Err(format!("invalid query parameter name '{name}'"));
    }
    Ok(name.to_string())
}
