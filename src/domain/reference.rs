//! Bracketed `[[Title]]` references between notes.

use std::collections::HashSet;

const OPEN: &str = "[[";
const CLOSE: &str = "]]";

/// A resolved reference found in a note body.
///
/// `offset` is the byte offset of the opening `[[` that introduces the
/// reference, after collapsing any extra leading brackets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub offset: usize,
    pub title: String,
}

/// Extracts the references in `content` whose titles are in `known_titles`.
///
/// The scan looks for `[[`, collapses a run of three or more `[` down to the
/// final two, and takes everything up to the next `]]` as the candidate
/// title. Candidates are kept only on an exact match against
/// `known_titles`. An opener without a closing `]]` ends the scan, so
/// nothing after it is searched. There is no escape syntax.
///
/// # Examples
///
/// ```
/// use kasten::domain::extract_references;
/// use std::collections::HashSet;
///
/// let titles: HashSet<String> = ["B".to_string()].into();
/// let refs = extract_references("see [[B]] and [[C]]", &titles);
/// assert_eq!(refs.len(), 1);
/// assert_eq!(refs[0].offset, 4);
/// assert_eq!(refs[0].title, "B");
/// ```
pub fn extract_references(content: &str, known_titles: &HashSet<String>) -> Vec<Reference> {
    let mut references = Vec::new();
    scan_candidates(content, |offset, candidate| {
        if known_titles.contains(candidate) {
            references.push(Reference {
                offset,
                title: candidate.to_string(),
            });
        }
    });
    references
}

/// Returns every bracketed candidate in `content`, resolved or not.
///
/// Uses the same scan as [`extract_references`].
pub fn extract_candidates(content: &str) -> Vec<Reference> {
    let mut candidates = Vec::new();
    scan_candidates(content, |offset, candidate| {
        candidates.push(Reference {
            offset,
            title: candidate.to_string(),
        });
    });
    candidates
}

fn scan_candidates<'a>(content: &'a str, mut on_candidate: impl FnMut(usize, &'a str)) {
    let bytes = content.as_bytes();
    let mut pos = 0;

    while let Some(found) = content[pos..].find(OPEN) {
        let mut open = pos + found;
        while bytes.get(open + OPEN.len()) == Some(&b'[') {
            open += 1;
        }

        let title_start = open + OPEN.len();
        let Some(len) = content[title_start..].find(CLOSE) else {
            break;
        };
        let title_end = title_start + len;

        on_candidate(open, &content[title_start..title_end]);
        pos = title_end + CLOSE.len();
    }
}

/// Formats a title as a bracketed reference token.
pub fn reference_token(title: &str) -> String {
    format!("{OPEN}{title}{CLOSE}")
}
