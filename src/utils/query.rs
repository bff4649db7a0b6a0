//! Query string helpers shared by redirect rewriting and provider URLs

use serde_json::{Map, Value};

/// Append `parameters` to `base_url` as an encoded query string
///
/// Parameters keep their insertion order. Each value is rendered as text
/// (arrays joined with `,`, objects as JSON, `null` as empty) and then
/// percent-encoded. Returns `base_url` unchanged when there is nothing to add.
#[must_use]
pub fn encode_query_parameters(base_url: &str, parameters: Option<&Map<String, Value>>) -> String {
    let Some(parameters) = parameters.filter(|p| !p.is_empty()) else {
        return base_url.to_string();
    };

    let encoded = parameters
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(&value_to_text(value))))
        .collect::<Vec<_>>()
        .join("&");

    format!("{base_url}?{encoded}")
}

/// Render a JSON value the way it should appear in a query string
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) | Value::Bool(_) | Value::Number(_) => value.to_string(),
    }
}

/// Parse a raw query string (without the leading `?`) into ordered pairs
#[must_use]
pub fn parse_query_pairs(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Merge two ordered parameter lists
///
/// Keys from `base` come first. A key present in `overlay` takes the overlay
/// value but keeps the position of its first occurrence; keys new in
/// `overlay` are appended. Repeated keys collapse to their last value.
#[must_use]
pub fn merge_query_pairs(
    base: Vec<(String, String)>,
    overlay: Vec<(String, String)>,
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = Vec::with_capacity(base.len() + overlay.len());

    for (key, value) in base.into_iter().chain(overlay) {
        if let Some(existing) = merged.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            merged.push((key, value));
        }
    }

    merged
}

/// Serialize ordered pairs as `application/x-www-form-urlencoded`
#[must_use]
pub fn serialize_query_pairs(pairs: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
