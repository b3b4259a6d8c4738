//! Derived indexes over the note collection: reference graph, tag groups, renames

mod graph;
mod rename;
mod tags;

pub use graph::{GraphNode, NoteGraphIndex};
pub use rename::{ContentRewrite, RenamePlan, plan_rename};
pub use tags::{
    NestedTagGroups, Recency, TagGroup, TagHierarchyIndex, extract_tag_groups, tags_for_note,
};
