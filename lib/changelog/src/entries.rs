use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Tag of the group holding changes made after the most recent tag.
pub const UNRELEASED: &str = "Unreleased";

/// Description of the single change given to a group whose changes were all skipped.
pub const SKIPPED_PLACEHOLDER: &str = "[All changes in this group have been skipped]";

/// A single changelog entry derived from a commit.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Change {
    /// First line of the commit message.
    pub description: String,
}

impl Change {
    pub fn new<S: Into<String>>(description: S) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// All changes between two tag boundaries, or between HEAD and the most recent tag.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChangeGroup {
    /// Tag the group starts at, [`UNRELEASED`] for the head group.
    pub tag: String,

    /// Date of the tagged commit. `None` for the unreleased group.
    pub date: Option<String>,

    /// Changes by label, in the order each label was first seen.
    pub labeled_changes: IndexMap<String, Vec<Change>>,
}

impl ChangeGroup {
    pub fn unreleased() -> Self {
        Self {
            tag: UNRELEASED.to_string(),
            date: None,
            labeled_changes: IndexMap::new(),
        }
    }

    pub fn tagged(tag: &str, date: &str) -> Self {
        Self {
            tag: tag.to_string(),
            date: Some(date.to_string()),
            labeled_changes: IndexMap::new(),
        }
    }

    pub fn push(&mut self, label: String, change: Change) {
        self.labeled_changes.entry(label).or_default().push(change);
    }

    pub fn has_changes(&self) -> bool {
        !self.labeled_changes.is_empty()
    }

    /// Labels with their changes, in first seen order.
    pub fn sections(&self) -> Vec<LabeledChanges<'_>> {
        self.labeled_changes
            .iter()
            .map(|(label, changes)| LabeledChanges { label, changes })
            .collect()
    }
}

// labeled changes are written as an ordered list of sections as maps lose their key order once
// they pass through the template context
impl Serialize for ChangeGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ChangeGroup", 3)?;
        state.serialize_field("tag", &self.tag)?;
        state.serialize_field("date", &self.date)?;
        state.serialize_field("sections", &self.sections())?;
        state.end()
    }
}

#[derive(Debug, Serialize)]
pub struct LabeledChanges<'a> {
    pub label: &'a str,
    pub changes: &'a [Change],
}
