use std::fs;
use std::ops::ControlFlow;
use std::path::Path;

use indexmap::IndexMap;

use crate::commit::{ScmCommit, ScmTag};
use crate::drivers::git::GitScmRepository;
use crate::errors::{ScmError, ScmResult};

pub mod git;

/// Callback invoked once per commit during [`ScmRepository::traverse_history`].
///
/// Returning `Ok(ControlFlow::Break(()))` ends the traversal early without it being an error.
/// Any `Err` aborts the traversal and is returned from `traverse_history`.
pub type CommitVisitor<'a> = dyn FnMut(ScmCommit) -> ScmResult<ControlFlow<()>> + 'a;

pub trait ScmRepository {
    /// Display name of the project the repository holds.
    fn name(&self) -> String;

    /// Parses and returns a commit-tag map keyed by commit ID.
    fn tags(&self) -> ScmResult<IndexMap<String, ScmTag>>;

    /// Walks history from the newest commit to the oldest, handing each commit to `visitor`
    /// with its tag attached.
    fn traverse_history(&self, visitor: &mut CommitVisitor<'_>) -> ScmResult<()>;

    /// Working directory of the repository. `None` for bare repositories.
    fn workdir(&self) -> Option<&Path>;

    fn scm(&self) -> &'static str;
}

#[remain::sorted]
pub enum Scm {
    Git(GitScmRepository),
}

impl Scm {
    pub fn get(cwd: &Path) -> ScmResult<Self> {
        // TODO: it might be better to try and discover directory such as
        // `git rev-parse --show-toplevel` and `git rev-parse --git-dir`
        let git_dir = cwd.file_name().is_some_and(|name| name == ".git")
            || cwd.extension().is_some_and(|ext| ext == "git");
        if git_dir || fs::metadata(cwd.join(".git")).is_ok() {
            return Ok(Scm::Git(GitScmRepository::new(cwd)?));
        }

        Err(ScmError::Unsupported(cwd.to_string_lossy().to_string()))
    }
}

impl ScmRepository for Scm {
    fn name(&self) -> String {
        match self {
            Scm::Git(r) => r.name(),
        }
    }

    fn tags(&self) -> ScmResult<IndexMap<String, ScmTag>> {
        match self {
            Scm::Git(r) => r.tags(),
        }
    }

    fn traverse_history(&self, visitor: &mut CommitVisitor<'_>) -> ScmResult<()> {
        match self {
            Scm::Git(r) => r.traverse_history(visitor),
        }
    }

    fn workdir(&self) -> Option<&Path> {
        match self {
            Scm::Git(r) => r.workdir(),
        }
    }

    fn scm(&self) -> &'static str {
        match self {
            Scm::Git(r) => r.scm(),
        }
    }
}
