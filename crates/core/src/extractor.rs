//! Pulls raw class tokens out of markup: `class="..."` attributes and the
//! Blade `@class([...])` directive.

use once_cell::sync::Lazy;
use regex::Regex;

static CLASS_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"class=(?:"([^"]+)"|'([^']+)')"#).expect("valid class attribute regex"));

static CLASS_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@class\(\[([^\]]+)\]\)").expect("valid @class regex"));

static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)"|'([^']+)'"#).expect("valid quoted string regex"));

/// Raw tokens in document order. Duplicates are kept; callers filter.
pub fn extract_classes(content: &str) -> Vec<String> {
    let mut classes = Vec::new();
    if content.is_empty() {
        return classes;
    }

    for caps in CLASS_ATTR.captures_iter(content) {
        if let Some(value) = caps.get(1).or_else(|| caps.get(2)) {
            classes.extend(split_tokens(value.as_str()));
        }
    }

    for caps in CLASS_DIRECTIVE.captures_iter(content) {
        let Some(list) = caps.get(1) else { continue };
        for quoted in QUOTED.captures_iter(list.as_str()) {
            if let Some(value) = quoted.get(1).or_else(|| quoted.get(2)) {
                classes.extend(split_tokens(value.as_str()));
            }
        }
    }

    classes
}

/// Splits a class list on runs of whitespace.
pub fn split_tokens(value: &str) -> impl Iterator<Item = String> + '_ {
    value.split_whitespace().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_runs_of_whitespace() {
        assert_eq!(
            extract_classes(r#"<div class="btn  primary"></div>"#),
            vec!["btn", "primary"]
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(extract_classes("").is_empty());
        assert!(extract_classes("<p>no classes here</p>").is_empty());
    }

    #[test]
    fn single_and_double_quotes() {
        let html = r#"<a class='link underline'>x</a><span class="text-sm">y</span>"#;
        assert_eq!(
            extract_classes(html),
            vec!["link", "underline", "text-sm"]
        );
    }

    #[test]
    fn mismatched_quotes_are_not_matched() {
        assert!(extract_classes(r#"<div class="broken'></div>"#).is_empty());
        assert!(extract_classes(r#"<div class=plain></div>"#).is_empty());
    }

    #[test]
    fn newlines_and_tabs_separate_tokens() {
        let html = "<div class=\"grid\n\tgap-4 \r\nmd:grid-cols-2\"></div>";
        assert_eq!(extract_classes(html), vec!["grid", "gap-4", "md:grid-cols-2"]);
    }

    #[test]
    fn blade_class_directive() {
        let blade = r#"<div @class(['p-4 rounded', "font-bold" => $active, 'hidden' => !$show])></div>"#;
        assert_eq!(
            extract_classes(blade),
            vec!["p-4", "rounded", "font-bold", "hidden"]
        );
    }

    #[test]
    fn attribute_and_directive_tokens_are_combined() {
        let blade = r#"<x-card class="shadow" @class(['ring-1'])/>"#;
        let mut tokens = extract_classes(blade);
        tokens.sort();
        assert_eq!(tokens, vec!["ring-1", "shadow"]);
    }

    #[test]
    fn duplicates_survive_extraction() {
        let html = r#"<i class="a b"></i><i class="a"></i>"#;
        assert_eq!(extract_classes(html), vec!["a", "b", "a"]);
    }
}
