//! Recursive walk over custom-field trees (groups, repeaters, flexible content).

use crate::extractor::{extract_classes, split_tokens};
use serde_json::{Map, Value};

/// Deepest container level that is still visited; the top-level tree is level 0.
pub const MAX_DEPTH: usize = 10;

/// Key every flexible-content layout row carries.
pub const LAYOUT_KEY: &str = "acf_fc_layout";

/// Case-insensitive substrings marking a field whose value is a bare class list.
#[derive(Debug, Clone, Default)]
pub struct ClassFieldPatterns {
    patterns: Vec<String>,
}

impl ClassFieldPatterns {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| p.as_ref().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { patterns }
    }

    pub fn matches(&self, field_name: &str) -> bool {
        let name = field_name.to_lowercase();
        self.patterns.iter().any(|p| name.contains(p.as_str()))
    }
}

/// Shape of one field value, decided once before walking it.
#[derive(Debug)]
pub enum FieldShape<'a> {
    FlatValue(&'a str),
    /// Flexible content: every row names its layout.
    LayoutList(Vec<&'a Map<String, Value>>),
    /// Repeater: sequential rows of sub-fields.
    RowList(Vec<&'a Map<String, Value>>),
    /// Group or any other container, walked entry by entry.
    NestedObject(Vec<(Option<&'a str>, &'a Value)>),
    /// Embedded post object; only its body is scanned.
    ContentReference(&'a str),
}

impl<'a> FieldShape<'a> {
    /// `None` for values that never hold classes: null, bools, numbers, empties.
    pub fn classify(value: &'a Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(FieldShape::FlatValue(s)),
            Value::Array(items) if !items.is_empty() => Some(classify_sequence(items.iter(), || {
                items.iter().map(|v| (None, v)).collect()
            })),
            Value::Object(map) if !map.is_empty() => {
                if is_content_reference(map) {
                    let body = map.get("post_content").and_then(Value::as_str).unwrap_or("");
                    return Some(FieldShape::ContentReference(body));
                }
                if let Some(rows) = sequential_values(map) {
                    return Some(classify_sequence(rows.into_iter(), || {
                        map.iter().map(|(k, v)| (Some(k.as_str()), v)).collect()
                    }));
                }
                Some(FieldShape::NestedObject(
                    map.iter().map(|(k, v)| (Some(k.as_str()), v)).collect(),
                ))
            }
            _ => None,
        }
    }
}

fn classify_sequence<'a, I, F>(items: I, nested: F) -> FieldShape<'a>
where
    I: Iterator<Item = &'a Value>,
    F: FnOnce() -> Vec<(Option<&'a str>, &'a Value)>,
{
    let rows: Option<Vec<&Map<String, Value>>> = items.map(Value::as_object).collect();
    match rows {
        Some(rows) if rows.iter().all(|r| r.contains_key(LAYOUT_KEY)) => {
            FieldShape::LayoutList(rows)
        }
        Some(rows) => FieldShape::RowList(rows),
        None => FieldShape::NestedObject(nested()),
    }
}

fn is_content_reference(map: &Map<String, Value>) -> bool {
    map.contains_key("ID") && map.contains_key("post_content")
}

/// Values of an object keyed exactly `"0"..="n-1"`, in index order.
fn sequential_values(map: &Map<String, Value>) -> Option<Vec<&Value>> {
    let mut indexed = Vec::with_capacity(map.len());
    for (key, value) in map {
        let index: usize = key.parse().ok()?;
        indexed.push((index, value));
    }
    indexed.sort_by_key(|(i, _)| *i);
    if indexed.iter().enumerate().any(|(pos, (i, _))| pos != *i) {
        return None;
    }
    Some(indexed.into_iter().map(|(_, v)| v).collect())
}

fn is_field_name(key: &str) -> bool {
    key.parse::<i64>().is_err()
}

/// Harvests class tokens from a custom-field tree.
#[derive(Debug, Clone, Default)]
pub struct FieldWalker {
    class_fields: ClassFieldPatterns,
}

impl FieldWalker {
    pub fn new(class_fields: ClassFieldPatterns) -> Self {
        Self { class_fields }
    }

    pub fn walk(&self, fields: &Value) -> Vec<String> {
        self.walk_at(fields, 0)
    }

    /// Walks `value` as if it sat at container level `depth`.
    pub fn walk_at(&self, value: &Value, depth: usize) -> Vec<String> {
        let mut out = Vec::new();
        self.walk_value(None, value, depth, &mut out);
        out
    }

    fn walk_value(&self, key: Option<&str>, value: &Value, depth: usize, out: &mut Vec<String>) {
        let Some(shape) = FieldShape::classify(value) else {
            return;
        };
        match shape {
            FieldShape::FlatValue(text) => {
                out.extend(extract_classes(text));
                if key.is_some_and(|k| is_field_name(k) && self.class_fields.matches(k)) {
                    out.extend(split_tokens(text.trim()));
                }
            }
            FieldShape::ContentReference(body) => out.extend(extract_classes(body)),
            FieldShape::LayoutList(rows) | FieldShape::RowList(rows) => {
                for row in rows {
                    // relationship fields list whole posts; only their bodies count
                    if is_content_reference(row) {
                        let body = row.get("post_content").and_then(Value::as_str);
                        out.extend(extract_classes(body.unwrap_or("")));
                        continue;
                    }
                    let entries = row.iter().map(|(k, v)| (Some(k.as_str()), v));
                    self.walk_entries(entries, depth, out);
                }
            }
            FieldShape::NestedObject(entries) => self.walk_entries(entries.into_iter(), depth, out),
        }
    }

    fn walk_entries<'a, I>(&self, entries: I, depth: usize, out: &mut Vec<String>)
    where
        I: Iterator<Item = (Option<&'a str>, &'a Value)>,
    {
        if depth > MAX_DEPTH {
            return;
        }
        for (key, value) in entries {
            self.walk_value(key, value, depth + 1, out);
        }
    }
}

/// Extracts markup classes from every string in a tree, with no field heuristics.
pub fn collect_markup(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_into(value, &mut out);
    out
}

fn collect_into(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(extract_classes(s)),
        Value::Array(items) => items.iter().for_each(|v| collect_into(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_into(v, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn walker() -> FieldWalker {
        FieldWalker::new(ClassFieldPatterns::new(&["class", "style"]))
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn class_named_fields_contribute_bare_tokens() {
        let fields = json!({
            "wrapper_CLASS": "  container mx-auto ",
            "title": "Hello world",
            "body": "<p class=\"lead\">x</p>",
        });
        assert_eq!(
            sorted(walker().walk(&fields)),
            vec!["container", "lead", "mx-auto"]
        );
    }

    #[test]
    fn scalars_and_empties_are_skipped() {
        for v in [json!(null), json!(true), json!(3), json!(""), json!([]), json!({})] {
            assert!(FieldShape::classify(&v).is_none());
        }
        let fields = json!({"class": 12, "style": false, "css": null, "x": ""});
        assert!(walker().walk(&fields).is_empty());
    }

    #[test]
    fn repeater_rows_are_classified_and_walked() {
        let rows = json!([{"a": 1}, {"a": 2}]);
        assert!(matches!(FieldShape::classify(&rows), Some(FieldShape::RowList(r)) if r.len() == 2));

        let fields = json!({"slides": [
            {"button_class": "btn"},
            {"caption": "<span class=\"italic\"></span>"}
        ]});
        assert_eq!(sorted(walker().walk(&fields)), vec!["btn", "italic"]);
    }

    #[test]
    fn flexible_content_layouts_are_classified_and_walked() {
        let layouts = json!([{"acf_fc_layout": "x", "a": 1}]);
        assert!(matches!(FieldShape::classify(&layouts), Some(FieldShape::LayoutList(_))));

        let fields = json!({"sections": [
            {"acf_fc_layout": "hero", "section_class": "bg-blue-500 text-white"},
            {"acf_fc_layout": "text", "content": "<div class='prose'></div>"}
        ]});
        assert_eq!(
            sorted(walker().walk(&fields)),
            vec!["bg-blue-500", "prose", "text-white"]
        );
    }

    #[test]
    fn mixed_rows_without_discriminator_on_every_row_are_repeaters() {
        let rows = json!([{"acf_fc_layout": "x"}, {"a": 1}]);
        assert!(matches!(FieldShape::classify(&rows), Some(FieldShape::RowList(_))));
    }

    #[test]
    fn sequential_object_keys_are_rows() {
        let rows = json!({"1": {"a": "x"}, "0": {"a": "y"}});
        assert!(matches!(FieldShape::classify(&rows), Some(FieldShape::RowList(_))));
        let gap = json!({"0": {"a": "x"}, "2": {"a": "y"}});
        assert!(matches!(FieldShape::classify(&gap), Some(FieldShape::NestedObject(_))));
    }

    #[test]
    fn scalar_lists_are_nested_objects() {
        let list = json!(["<b class=\"font-bold\"></b>", 4]);
        assert!(matches!(FieldShape::classify(&list), Some(FieldShape::NestedObject(_))));
        assert_eq!(walker().walk(&json!({"choices": list})), vec!["font-bold"]);
    }

    #[test]
    fn numeric_keys_are_not_field_names() {
        let fields = json!({"class_list": ["p-2 m-2"]});
        // the inner string sits under index 0, not under a class-named key
        assert!(walker().walk(&fields).is_empty());
    }

    #[test]
    fn content_reference_scans_body_only() {
        let post = json!({
            "ID": 42,
            "post_title": "<h1 class=\"ignored\"></h1>",
            "post_content": "<section class=\"py-12\"></section>"
        });
        assert!(matches!(FieldShape::classify(&post), Some(FieldShape::ContentReference(_))));
        assert_eq!(walker().walk(&json!({"related": post})), vec!["py-12"]);
    }

    #[test]
    fn post_lists_scan_bodies_only() {
        let fields = json!({"related_posts": [
            {
                "ID": 1,
                "post_title": "<b class=\"title-leak\"></b>",
                "post_excerpt": "<i class=\"excerpt-leak\"></i>",
                "post_content": "<p class=\"body\"></p>"
            },
            {"ID": 2, "post_content": "<p class='lead'></p>", "post_class": "bare-class"}
        ]});
        assert_eq!(sorted(walker().walk(&fields)), vec!["body", "lead"]);
    }

    #[test]
    fn group_fields_recurse() {
        let fields = json!({"hero": {"settings": {"style": "h-screen"}}});
        assert_eq!(walker().walk(&fields), vec!["h-screen"]);
    }

    fn nested(levels: usize) -> Value {
        let mut node = json!({"html": format!("<i class=\"l{}\"></i>", levels)});
        for level in (0..levels).rev() {
            node = json!({
                "html": format!("<i class=\"l{}\"></i>", level),
                "child": node,
            });
        }
        node
    }

    #[test]
    fn depth_guard_stops_after_level_ten() {
        let tokens = sorted(walker().walk(&nested(11)));
        let mut expected: Vec<String> = (0..=10).map(|l| format!("l{}", l)).collect();
        expected.sort();
        assert_eq!(tokens, expected);
        assert!(!tokens.contains(&"l11".to_string()));
    }

    #[test]
    fn depth_guard_counts_rows_as_levels() {
        // rows of a repeater sit one level below the field holding the repeater
        let tokens = walker().walk_at(&json!({"rows": [{"class": "deep"}]}), MAX_DEPTH);
        assert!(tokens.is_empty());
        let tokens = walker().walk_at(&json!({"rows": [{"class": "deep"}]}), MAX_DEPTH - 1);
        assert_eq!(tokens, vec!["deep"]);
    }

    #[test]
    fn collect_markup_ignores_field_names() {
        let widget = json!({
            "2": {"title": "x", "text": "<p class=\"mb-4\"></p>", "css_class": "not-a-token"},
            "_multiwidget": 1
        });
        assert_eq!(collect_markup(&widget), vec!["mb-4"]);
    }
}
