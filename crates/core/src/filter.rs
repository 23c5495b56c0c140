//! Exclude rules and the final trim / exclude / dedupe / sort pass.

use regex::Regex;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("exclude pattern {pattern:?} is not a valid regex: {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("exclude pattern {pattern:?} has unsupported flag '{flag}'")]
    UnsupportedFlag { pattern: String, flag: char },
}

/// Ordered exclude list; a token is dropped on the first rule that matches it.
#[derive(Debug, Clone, Default)]
pub struct ExcludeRules {
    rules: Vec<Regex>,
}

impl ExcludeRules {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
        let rules = patterns
            .iter()
            .map(|p| compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn is_excluded(&self, token: &str) -> bool {
        self.rules.iter().any(|r| r.is_match(token))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Accepts bare regexes (`^wp-`) and delimited ones with flags (`/^wp-/`,
/// `#^Foo#i`, `(^foo)i`). Flags `i m s x U` map to inline flags; `u` and `D`
/// are no-ops since matching is always unicode-aware and `$` without `m`
/// already anchors at the very end. Any other flag is rejected.
fn compile(pattern: &str) -> Result<Regex, PatternError> {
    let (body, flags) = split_delimited(pattern).unwrap_or((pattern, ""));
    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' | 'x' | 'U' => inline.push(flag),
            'u' | 'D' => {}
            other => {
                return Err(PatternError::UnsupportedFlag {
                    pattern: pattern.to_string(),
                    flag: other,
                })
            }
        }
    }
    let source = if inline.is_empty() {
        body.to_string()
    } else {
        format!("(?{}){}", inline, body)
    };
    Regex::new(&source).map_err(|source| PatternError::Invalid {
        pattern: pattern.to_string(),
        source,
    })
}

fn split_delimited(pattern: &str) -> Option<(&str, &str)> {
    let open = pattern.chars().next()?;
    let close = match open {
        '/' | '#' | '~' | '%' | '@' | '!' | '|' | '+' => open,
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        // a bare regex may legitimately start with punctuation such as '^'
        _ => return None,
    };
    let rest = &pattern[open.len_utf8()..];
    let end = rest.rfind(close)?;
    let flags = &rest[end + close.len_utf8()..];
    if !flags.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((&rest[..end], flags))
}

/// Trims, drops empty and excluded tokens, dedupes and sorts ascending.
pub fn filter_classes<I, S>(classes: I, rules: &ExcludeRules) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let kept: BTreeSet<String> = classes
        .into_iter()
        .filter_map(|c| {
            let class = c.as_ref().trim();
            if class.is_empty() || rules.is_excluded(class) {
                None
            } else {
                Some(class.to_string())
            }
        })
        .collect();
    kept.into_iter().collect()
}
