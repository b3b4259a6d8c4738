//! Hashtag extraction from note bodies, plus the synthetic tags.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Character that introduces a tag in note content.
pub const TAG_DELIMITER: char = '#';

/// Synthetic tag every note belongs to.
pub const ALL_TAG: &str = "all";

/// Synthetic tag for notes without any real tag.
pub const UNTAGGED_TAG: &str = "untagged";

/// Pseudo-parent marking a tag as explicitly root-level in the hierarchy.
pub const ROOT_TAG: &str = "root";

// A delimiter at line start or after whitespace, followed by a run of
// characters that are neither delimiters nor whitespace. Requiring the
// preceding whitespace rejects `##foo` and `a#b`.
static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)(?:^|\s)#[^#\s]+").expect("tag pattern is valid"));

/// Extracts the distinct hashtags in `content`.
///
/// Tags keep the delimiter and their original case. Repeated occurrences
/// collapse into one entry.
///
/// # Examples
///
/// ```
/// use kasten::domain::extract_tags;
///
/// let tags = extract_tags("#foo bar #foo\n#Baz");
/// assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["#Baz", "#foo"]);
/// ```
pub fn extract_tags(content: &str) -> BTreeSet<String> {
    TAG_PATTERN
        .find_iter(content)
        .map(|m| m.as_str().trim_start().to_string())
        .collect()
}

/// Returns true for the tags the core injects itself.
pub fn is_synthetic_tag(tag: &str) -> bool {
    tag == ALL_TAG || tag == UNTAGGED_TAG
}
