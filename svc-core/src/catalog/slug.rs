//! URL-path-safe slugs from human-readable names

use once_cell::sync::Lazy;
use regex::Regex;

// ASCII only: anything outside [a-z0-9] after case folding is a separator,
// which keeps every slug safe to use as a directory name.
static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

/// Lower-case `name`, collapse every run of non-alphanumeric characters into a
/// single `-`, and trim leading/trailing separators.
///
/// The result may be empty (e.g. for a name made only of punctuation); callers
/// decide whether that is acceptable.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_separator_runs() {
        assert_eq!(
            slugify("Forced Labor — Prevention"),
            "forced-labor-prevention"
        );
    }

    #[test]
    fn test_slugify_trims_edges() {
        assert_eq!(slugify("  (Health & Safety)  "), "health-safety");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_slugify_keeps_digits() {
        assert_eq!(slugify("Section 4.2b"), "section-4-2b");
    }

    #[test]
    fn test_slugify_non_ascii_letters_are_separators() {
        assert_eq!(slugify("Émissions Café"), "missions-caf");
    }
}
