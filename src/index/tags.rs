//! Tag groups derived from note content, arranged by an explicit hierarchy.
//!
//! Tag membership comes from the hashtags in each note. Nesting comes from a
//! separate, user-edited [`NestedTagGroups`] mapping which may name tags that
//! have no notes and may contain cycles.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::{ALL_TAG, Note, NoteId, ROOT_TAG, UNTAGGED_TAG, extract_tags};

/// How a tag's aggregate change time is folded over its subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recency {
    /// Most recent change wins.
    #[default]
    Newest,
    /// Oldest change wins; the running-minimum fold of older clients.
    Oldest,
}

impl Recency {
    fn fold(self, acc: Option<i64>, value: i64) -> Option<i64> {
        Some(match (self, acc) {
            (_, None) => value,
            (Recency::Newest, Some(acc)) => acc.max(value),
            (Recency::Oldest, Some(acc)) => acc.min(value),
        })
    }
}

/// Explicit parent tag → ordered child tags mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NestedTagGroups(BTreeMap<String, Vec<String>>);

impl NestedTagGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the children listed under `parent`.
    pub fn children(&self, parent: &str) -> &[String] {
        self.0.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns every parent listing `child`, including the root pseudo-tag.
    pub fn parents_of(&self, child: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, children)| children.iter().any(|c| c == child))
            .map(|(parent, _)| parent.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Moves `child` from `old_parent` to `new_parent`.
    ///
    /// Adds the child under the new parent if it is not already there, then
    /// removes it from the old parent if present. Running it twice leaves the
    /// mapping unchanged. Returns true if the mapping changed.
    pub fn change_parent_tag(&mut self, old_parent: &str, new_parent: &str, child: &str) -> bool {
        let before = self.clone();

        let siblings = self.0.entry(new_parent.to_string()).or_default();
        if !siblings.iter().any(|c| c == child) {
            siblings.push(child.to_string());
        }

        if old_parent != new_parent
            && let Some(siblings) = self.0.get_mut(old_parent)
        {
            siblings.retain(|c| c != child);
        }

        *self != before
    }

    /// Replaces all parents of `child` with `new_parents`.
    ///
    /// With an empty `new_parents` the child ends up under no parent at all,
    /// which makes it an implicit root tag. Returns true if the mapping
    /// changed.
    pub fn update_parent_tags(&mut self, child: &str, new_parents: &[String]) -> bool {
        let before = self.clone();

        for siblings in self.0.values_mut() {
            siblings.retain(|c| c != child);
        }
        for parent in new_parents {
            let siblings = self.0.entry(parent.clone()).or_default();
            if !siblings.iter().any(|c| c == child) {
                siblings.push(child.to_string());
            }
        }

        *self != before
    }
}

impl<const N: usize> From<[(&str, &[&str]); N]> for NestedTagGroups {
    fn from(entries: [(&str, &[&str]); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(parent, children)| {
                    (
                        parent.to_string(),
                        children.iter().map(|c| c.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }
}

/// The notes carrying one tag, with the subtree's aggregate change time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagGroup {
    pub tag: String,
    /// Note ids in collection order.
    pub note_ids: Vec<NoteId>,
    pub newest_note_change_timestamp: i64,
}

/// Returns the tags a note belongs to after applying `ignored_tags`.
///
/// Ignored tags are dropped first; `untagged` is added when nothing is left
/// and `all` is always added, so neither synthetic tag can be ignored.
pub fn tags_for_note(content: &str, ignored_tags: &HashSet<String>) -> Vec<String> {
    let mut tags: Vec<String> = extract_tags(content)
        .into_iter()
        .filter(|t| !ignored_tags.contains(t))
        .collect();
    if tags.is_empty() {
        tags.push(UNTAGGED_TAG.to_string());
    }
    tags.push(ALL_TAG.to_string());
    tags
}

/// Builds tag groups for a note collection.
pub fn extract_tag_groups(
    notes: &[Note],
    ignored_tags: &HashSet<String>,
    hierarchy: &NestedTagGroups,
    recency: Recency,
) -> HashMap<String, TagGroup> {
    let mut members: HashMap<String, Vec<&Note>> = HashMap::new();
    for note in notes {
        for tag in tags_for_note(note.content(), ignored_tags) {
            members.entry(tag).or_default().push(note);
        }
    }

    members
        .iter()
        .map(|(tag, tag_notes)| {
            let mut seen = HashSet::new();
            let timestamp = subtree_timestamp(tag, &members, hierarchy, recency, &mut seen)
                .unwrap_or_default();
            let group = TagGroup {
                tag: tag.clone(),
                note_ids: tag_notes.iter().map(|n| n.id().clone()).collect(),
                newest_note_change_timestamp: timestamp,
            };
            (tag.clone(), group)
        })
        .collect()
}

// Depth-first fold over `tag` and its descendants. A tag already in `seen`
// contributes nothing, which terminates cycles. Tags with no notes
// contribute only through their own children.
fn subtree_timestamp<'a>(
    tag: &'a str,
    members: &HashMap<String, Vec<&Note>>,
    hierarchy: &'a NestedTagGroups,
    recency: Recency,
    seen: &mut HashSet<&'a str>,
) -> Option<i64> {
    if !seen.insert(tag) {
        return None;
    }

    let mut acc = None;
    if let Some(tag_notes) = members.get(tag) {
        for note in tag_notes {
            acc = recency.fold(acc, note.last_changed());
        }
    }
    for child in hierarchy.children(tag) {
        if let Some(value) = subtree_timestamp(child, members, hierarchy, recency, seen) {
            acc = recency.fold(acc, value);
        }
    }
    acc
}

/// Tag groups for one snapshot of (notes, ignored tags, hierarchy).
#[derive(Debug, Clone, Default)]
pub struct TagHierarchyIndex {
    tag_to_tag_group: HashMap<String, TagGroup>,
    hierarchy: NestedTagGroups,
}

impl TagHierarchyIndex {
    pub fn new(
        notes: &[Note],
        ignored_tags: &HashSet<String>,
        hierarchy: NestedTagGroups,
        recency: Recency,
    ) -> Self {
        let tag_to_tag_group = extract_tag_groups(notes, ignored_tags, &hierarchy, recency);
        Self {
            tag_to_tag_group,
            hierarchy,
        }
    }

    pub fn get_tag_group_for_tag(&self, tag: &str) -> Option<&TagGroup> {
        self.tag_to_tag_group.get(tag)
    }

    /// Returns all tag groups sorted by tag.
    pub fn tag_groups(&self) -> Vec<&TagGroup> {
        let mut groups: Vec<&TagGroup> = self.tag_to_tag_group.values().collect();
        groups.sort_by(|a, b| a.tag.cmp(&b.tag));
        groups
    }

    pub fn hierarchy(&self) -> &NestedTagGroups {
        &self.hierarchy
    }

    /// Returns the tag groups shown at the top level, sorted by tag.
    ///
    /// A tag is at the top level if no parent lists it, or if the root
    /// pseudo-tag lists it, even when other parents list it too. Hierarchy
    /// entries for tags without notes are not shown.
    pub fn root_tags(&self) -> Vec<&TagGroup> {
        let explicit_roots: HashSet<&str> = self
            .hierarchy
            .children(ROOT_TAG)
            .iter()
            .map(String::as_str)
            .collect();
        let has_parent: HashSet<&str> = self
            .hierarchy
            .iter()
            .filter(|(parent, _)| parent.as_str() != ROOT_TAG)
            .flat_map(|(_, children)| children.iter().map(String::as_str))
            .collect();

        self.tag_groups()
            .into_iter()
            .filter(|g| explicit_roots.contains(g.tag.as_str()) || !has_parent.contains(g.tag.as_str()))
            .collect()
    }

    /// Returns the child tag groups of `tag` in hierarchy order.
    ///
    /// Children without notes are skipped.
    pub fn child_tags(&self, tag: &str) -> Vec<&TagGroup> {
        self.hierarchy
            .children(tag)
            .iter()
            .filter_map(|child| self.tag_to_tag_group.get(child))
            .collect()
    }
}
