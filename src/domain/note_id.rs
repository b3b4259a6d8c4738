//! Opaque note identifier with serde support.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// A unique identifier for a note.
///
/// Identifiers are opaque: storage backends may hand out any non-empty
/// string. Identifiers minted locally are ULIDs, which keeps them sortable
/// by creation time.
///
/// # Examples
///
/// ```
/// use kasten::domain::NoteId;
///
/// let id: NoteId = "note-1".parse().unwrap();
/// assert_eq!(id.as_str(), "note-1");
///
/// let fresh = NoteId::new();
/// assert_eq!(fresh.as_str().len(), 26);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(String);

impl NoteId {
    /// Creates a new ULID-based NoteId with the current timestamp.
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first 10 characters of the identifier, for compact display.
    pub fn prefix(&self) -> &str {
        match self.0.char_indices().nth(10) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteId(\"{}\")", self.0)
    }
}

/// Error returned when parsing an invalid identifier.
#[derive(Debug, Clone)]
pub struct ParseNoteIdError {
    value: String,
}

impl ParseNoteIdError {
    /// Returns the invalid value that caused this error.
    pub fn invalid_value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ParseNoteIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid id '{}': id cannot be empty", self.value)
    }
}

impl std::error::Error for ParseNoteIdError {}

impl FromStr for NoteId {
    type Err = ParseNoteIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseNoteIdError {
                value: s.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl Serialize for NoteId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn new_creates_ulid_string() {
        let id = NoteId::new();
        assert_eq!(id.as_str().len(), 26);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn parse_accepts_opaque_strings() {
        let id: NoteId = "drive:1AbC".parse().unwrap();
        assert_eq!(id.to_string(), "drive:1AbC");
    }

    #[test]
    fn parse_trims_whitespace() {
        let id: NoteId = "  42 ".parse().unwrap();
        assert_eq!(id.as_str(), "42");
    }

    #[test]
    fn parse_rejects_empty() {
        let err = "   ".parse::<NoteId>().unwrap_err();
        assert_eq!(err.invalid_value(), "   ");
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn prefix_of_short_id_is_whole_id() {
        let id: NoteId = "abc".parse().unwrap();
        assert_eq!(id.prefix(), "abc");
    }

    #[test]
    fn prefix_of_ulid_is_ten_chars() {
        let id: NoteId = "01HQ3K5M7NXJK4QZPW8V2R6T9Y".parse().unwrap();
        assert_eq!(id.prefix(), "01HQ3K5M7N");
    }

    #[test]
    fn generated_ids_are_unique() {
        let ids: HashSet<NoteId> = (0..100).map(|_| NoteId::new()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn serde_rejects_empty_on_deserialize() {
        let result: Result<NoteId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn debug_format() {
        let id: NoteId = "n1".parse().unwrap();
        assert_eq!(format!("{:?}", id), "NoteId(\"n1\")");
    }
}
