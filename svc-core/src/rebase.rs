//! Base URL rewriting for catalog documents
//!
//! Every string value starting with the `from` prefix has that prefix
//! replaced by `to`. Object keys and non-string values are never touched, and
//! the output has exactly the shape of the input.

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::debug;
use url::Url;

use crate::error::{Result, SvcError};

/// What a rebase pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebaseStats {
    /// Number of string values rewritten
    pub total_replacements: usize,
    /// Distinct original strings that matched the prefix
    pub urls_found: BTreeSet<String>,
}

impl RebaseStats {
    pub fn is_empty(&self) -> bool {
        self.total_replacements == 0
    }
}

/// Validated `from` and `to` prefixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseOptions {
    from: String,
    to: String,
}

impl RebaseOptions {
    /// Both prefixes must parse as absolute URLs.
    ///
    /// The prefixes are kept as given; parsing would normalize them (a bare
    /// origin gains a trailing `/`) and change what matches.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Result<Self> {
        let from = from.into();
        let to = to.into();
        validate_url(&from)?;
        validate_url(&to)?;
        Ok(Self { from, to })
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    /// Rewrite `document`, returning the new document and what changed
    pub fn rebase(&self, document: &Value) -> (Value, RebaseStats) {
        rebase_urls(document, &self.from, &self.to)
    }

    /// The rewritten form of a single matching string
    pub fn rewrite(&self, value: &str) -> Option<String> {
        rewrite_prefix(value, &self.from, &self.to)
    }
}

/// Rewrite every string in `document` that starts with `from`.
///
/// No validation is done here; [`RebaseOptions`] checks the prefixes.
pub fn rebase_urls(document: &Value, from: &str, to: &str) -> (Value, RebaseStats) {
    let mut stats = RebaseStats::default();
    let rebased = rebase_value(document, from, to, &mut stats);
    (rebased, stats)
}

fn rebase_value(value: &Value, from: &str, to: &str, stats: &mut RebaseStats) -> Value {
    match value {
        Value::String(s) => match rewrite_prefix(s, from, to) {
            Some(rewritten) => {
                debug!("{} -> {}", s, rewritten);
                stats.total_replacements += 1;
                stats.urls_found.insert(s.clone());
                Value::String(rewritten)
            }
            None => value.clone(),
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| rebase_value(item, from, to, stats))
                .collect(),
        ),
        Value::Object(map) => {
            let mut rebased = Map::with_capacity(map.len());
            for (key, item) in map {
                rebased.insert(key.clone(), rebase_value(item, from, to, stats));
            }
            Value::Object(rebased)
        }
        other => other.clone(),
    }
}

fn rewrite_prefix(value: &str, from: &str, to: &str) -> Option<String> {
    value
        .strip_prefix(from)
        .map(|rest| format!("{to}{rest}"))
}

fn validate_url(value: &str) -> Result<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|source| SvcError::InvalidUrl {
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_rebase_nested_document() {
        let input = json!({"a": "https://x.com/1", "b": {"c": ["https://x.com/2", "https://y.com/3"]}});

        let (output, stats) = rebase_urls(&input, "https://x.com", "https://z.org");

        assert_eq!(
            output,
            json!({"a": "https://z.org/1", "b": {"c": ["https://z.org/2", "https://y.com/3"]}})
        );
        assert_eq!(stats.total_replacements, 2);
        assert_eq!(
            stats.urls_found.into_iter().collect::<Vec<_>>(),
            vec!["https://x.com/1".to_string(), "https://x.com/2".to_string()]
        );
    }

    #[test]
    fn test_rebase_leaves_keys_and_scalars() {
        let input = json!({
            "https://x.com/key": 1,
            "flag": true,
            "nothing": null,
            "text": "see https://x.com/inline"
        });

        let (output, stats) = rebase_urls(&input, "https://x.com", "https://z.org");

        assert_eq!(output, input);
        assert!(stats.is_empty());
    }

    #[test]
    fn test_rebase_counts_repeats_once_in_found() {
        let input = json!(["https://x.com/a", "https://x.com/a"]);
        let (_, stats) = rebase_urls(&input, "https://x.com", "https://z.org");
        assert_eq!(stats.total_replacements, 2);
        assert_eq!(stats.urls_found.len(), 1);
    }

    #[test]
    fn test_rebase_preserves_key_order() {
        let input: Value =
            serde_json::from_str(r#"{"z": "https://x.com/z", "a": "https://x.com/a"}"#).unwrap();
        let (output, _) = rebase_urls(&input, "https://x.com", "https://z.org");
        let keys: Vec<_> = output.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_options_reject_invalid_urls() {
        assert!(RebaseOptions::new("https://x.com", "https://z.org").is_ok());
        assert!(matches!(
            RebaseOptions::new("not a url", "https://z.org"),
            Err(SvcError::InvalidUrl { .. })
        ));
        assert!(matches!(
            RebaseOptions::new("https://x.com", "/relative"),
            Err(SvcError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_options_keep_prefix_verbatim() {
        let options = RebaseOptions::new("https://x.com", "https://z.org").unwrap();
        assert_eq!(options.from(), "https://x.com");
        assert_eq!(
            options.rewrite("https://x.com/criteria/a/1/").as_deref(),
            Some("https://z.org/criteria/a/1/")
        );
        assert_eq!(options.rewrite("https://y.com/"), None);
    }
}
