use serde_derive::{Deserialize, Serialize};

/// A commit as handed out by a history traversal.
///
/// Commits are produced by the SCM driver while walking history and are never mutated afterwards.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ScmCommit {
    /// Commit ID
    pub id: String,

    /// Commit message
    pub message: String,

    /// Committer date formatted as `YYYY-MM-DD`
    pub date: String,

    /// Name of the tag pointing exactly at this commit, if any
    pub tag: Option<String>,
}

impl ScmCommit {
    /// First line of the commit message.
    pub fn description(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ScmTag {
    /// The name of the tag
    pub name: String,

    /// ID of the commit the tag resolves to
    pub commit_id: String,

    /// Whether the tag is an annotated tag object rather than a lightweight reference
    pub annotated: bool,
}
