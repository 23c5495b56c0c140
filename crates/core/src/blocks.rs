//! Class tokens carried in block-editor comment attributes, e.g.
//! `<!-- wp:group {"className":"mt-8","align":"wide"} -->`.

use crate::extractor::split_tokens;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static BLOCK_OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--\s+wp:[a-z][a-z0-9_-]*(?:/[a-z][a-z0-9_-]*)?\s+(\{.*?\})\s+/?-->")
        .expect("valid block opener regex")
});

/// Attribute objects of every block opener, nested blocks included.
pub fn block_attributes(content: &str) -> Vec<Map<String, Value>> {
    BLOCK_OPENER
        .captures_iter(content)
        .filter_map(|caps| {
            let raw = caps.get(1)?.as_str();
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(attrs)) => Some(attrs),
                _ => {
                    tracing::debug!("skipping unparseable block attributes: {}", raw);
                    None
                }
            }
        })
        .collect()
}

/// Tokens implied by block attributes: custom class names, alignment and palette colours.
pub fn extract_block_classes(content: &str) -> Vec<String> {
    let mut classes = Vec::new();
    if !content.contains("wp:") {
        return classes;
    }
    for attrs in block_attributes(content) {
        if let Some(names) = non_empty_str(&attrs, "className") {
            classes.extend(split_tokens(names));
        }
        if let Some(align) = non_empty_str(&attrs, "align") {
            classes.push(format!("align{}", align));
        }
        if let Some(color) = non_empty_str(&attrs, "backgroundColor") {
            classes.push(format!("has-{}-background-color", color));
        }
        if let Some(color) = non_empty_str(&attrs, "textColor") {
            classes.push(format!("has-{}-color", color));
        }
        if let Some(Value::Object(data)) = attrs.get("data") {
            collect_data_classes(data, &mut classes);
        }
    }
    classes
}

fn non_empty_str<'a>(attrs: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    attrs.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

// Block data keys are field names, so only class-ish keys count here.
fn collect_data_classes(data: &Map<String, Value>, out: &mut Vec<String>) {
    for (key, value) in data {
        match value {
            Value::Object(inner) => collect_data_classes(inner, out),
            Value::Array(items) => {
                for item in items {
                    if let Value::Object(inner) = item {
                        collect_data_classes(inner, out);
                    }
                }
            }
            Value::String(text) if is_class_key(key) => out.extend(split_tokens(text)),
            _ => {}
        }
    }
}

fn is_class_key(key: &str) -> bool {
    key == "className" || key.contains("class") || key.contains("style")
}
