use crate::error::FetchError;
use crate::Metadata;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Ordered key-name needles for each metadata field.
///
/// A field resolves to the first key, in document order, whose lower-cased
/// name contains one of its needles. Needles are tried in list order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeyRules {
    pub title: Vec<String>,
    pub description: Vec<String>,
    pub image_url: Vec<String>,
    pub canonical_url: Vec<String>,
    pub theme_color: Vec<String>,
}

impl Default for KeyRules {
    fn default() -> Self {
        Self {
            title: vec!["title".into()],
            description: vec!["description".into()],
            image_url: vec!["image".into()],
            canonical_url: vec!["url".into()],
            theme_color: vec!["color".into()],
        }
    }
}

/// Normalizes the metadata service's loosely typed response into [`Metadata`].
#[derive(Debug, Clone, Default)]
pub struct MetadataExtractor {
    rules: KeyRules,
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: KeyRules) -> Self {
        Self { rules }
    }

    /// Parses a raw response body.
    pub fn extract_from_body(&self, body: &str) -> Result<Metadata, FetchError> {
        let json: Value = serde_json::from_str(body)
            .map_err(|e| FetchError::Network(format!("Invalid JSON response: {e}")))?;
        self.extract(&json)
    }

    /// Resolves the card fields from a parsed response.
    ///
    /// The service wraps its payload in `data`; a bare object is accepted too.
    pub fn extract(&self, json: &Value) -> Result<Metadata, FetchError> {
        let data = match json.get("data") {
            Some(Value::Object(data)) => data,
            Some(other) => {
                return Err(FetchError::Network(format!(
                    "Expected `data` to be an object, got {}",
                    kind_of(other)
                )))
            }
            None => json.as_object().ok_or_else(|| {
                FetchError::Network(format!("Expected a JSON object, got {}", kind_of(json)))
            })?,
        };

        debug!(keys = data.len(), "Resolving metadata fields");

        Ok(Metadata {
            title: resolve(data, &self.rules.title),
            description: resolve(data, &self.rules.description),
            image_url: resolve(data, &self.rules.image_url),
            canonical_url: resolve(data, &self.rules.canonical_url),
            theme_color: resolve(data, &self.rules.theme_color),
        })
    }
}

fn resolve(data: &Map<String, Value>, needles: &[String]) -> Option<String> {
    let (key, value) = needles.iter().find_map(|needle| {
        let needle = needle.to_lowercase();
        data.iter()
            .find(|(key, _)| key.to_lowercase().contains(&needle))
    })?;

    let text = as_text(value);
    if text.is_none() {
        debug!(key = %key, "Matched key has no usable value");
    }
    text
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
