use std::mem;
use std::ops::ControlFlow;

use regex::Regex;
use scm::commit::ScmCommit;
use scm::drivers::ScmRepository;
use tracing::{debug, trace};

use crate::entries::{Change, ChangeGroup, SKIPPED_PLACEHOLDER};
use crate::errors::{ChangelogErrors, ChangelogResult};
use crate::settings::GroupingSettings;

/// Label for changes whose message has no capture for the group by pattern.
pub const DEFAULT_LABEL: &str = "Misc";

#[derive(Clone, Debug, PartialEq, Eq)]
enum TraversalState {
    /// Commits are dropped until the boundary of this tag is reached.
    AwaitingUntil(String),
    Recording,
}

fn compile(name: &'static str, pattern: Option<&str>) -> ChangelogResult<Option<Regex>> {
    pattern
        .map(|p| {
            Regex::new(p).map_err(|source| ChangelogErrors::InvalidPattern {
                name,
                pattern: p.to_string(),
                source,
            })
        })
        .transpose()
}

/// Turns a newest-first commit stream into change groups, one per tag boundary.
///
/// A builder handles exactly one traversal: feed every commit to [`visit`](Self::visit) until it
/// breaks or the stream ends, then call [`finish`](Self::finish).
#[derive(Debug)]
pub struct ChangeGroupBuilder {
    since_tag: Option<String>,
    state: TraversalState,
    group_by: Option<Regex>,
    skip: Option<Regex>,
    current: ChangeGroup,
    completed: Vec<ChangeGroup>,
}

impl ChangeGroupBuilder {
    /// Fails if either pattern does not compile.
    pub fn new(settings: &GroupingSettings) -> ChangelogResult<Self> {
        let group_by = compile("group by", settings.group_by())?;
        let skip = compile("skip", settings.skip())?;
        let state = match settings.until_tag() {
            Some(until) => TraversalState::AwaitingUntil(until.to_string()),
            None => TraversalState::Recording,
        };

        Ok(Self {
            since_tag: settings.since_tag().map(String::from),
            state,
            group_by,
            skip,
            current: ChangeGroup::unreleased(),
            completed: vec![],
        })
    }

    /// Processes the next commit. Breaks once the since tag is reached.
    pub fn visit(&mut self, commit: &ScmCommit) -> ControlFlow<()> {
        if let Some(tag) = &commit.tag {
            if matches!(&self.state, TraversalState::AwaitingUntil(until) if until == tag) {
                debug!("reached until tag {}", tag);
                self.state = TraversalState::Recording;
            }

            if self.since_tag.as_ref() == Some(tag) {
                debug!("reached since tag {}", tag);
                return ControlFlow::Break(());
            }

            self.seal(ChangeGroup::tagged(tag, &commit.date));
        }

        if let TraversalState::AwaitingUntil(until) = &self.state {
            if *until != self.current.tag {
                trace!("skipping commit {} newer than {}", &commit.id, until);
                return ControlFlow::Continue(());
            }
        }

        if let Some(skip) = &self.skip {
            if skip.is_match(&commit.message) {
                debug!("skipping commit {}", &commit.id);
                return ControlFlow::Continue(());
            }
        }

        let label = self.label(&commit.message);
        self.current.push(label, Change::new(commit.description()));

        ControlFlow::Continue(())
    }

    /// Closes the open group, keeping it only if it recorded something, and opens `next`.
    fn seal(&mut self, next: ChangeGroup) {
        let sealed = mem::replace(&mut self.current, next);
        if sealed.has_changes() {
            self.completed.push(sealed);
        } else {
            trace!("dropping empty group {}", &sealed.tag);
        }
    }

    fn label(&self, message: &str) -> String {
        match &self.group_by {
            Some(group_by) => group_by
                .captures(message)
                .and_then(|captures| captures.get(1))
                .map_or_else(|| DEFAULT_LABEL.to_string(), |m| m.as_str().to_string()),
            None => String::new(),
        }
    }

    /// Seals the open group and returns every group, newest first.
    ///
    /// The open group is always emitted. If nothing was recorded in it a placeholder change is
    /// added so it doesn't render empty.
    pub fn finish(mut self) -> Vec<ChangeGroup> {
        if !self.current.has_changes() {
            self.current
                .push(String::new(), Change::new(SKIPPED_PLACEHOLDER));
        }

        self.completed.push(self.current);
        self.completed
    }
}

/// Walks the repository's history and groups its commits by tag.
///
/// Patterns are compiled before the walk starts so an invalid pattern never produces partial
/// output.
pub fn build_change_groups(
    repository: &dyn ScmRepository,
    settings: &GroupingSettings,
) -> ChangelogResult<Vec<ChangeGroup>> {
    let mut builder = ChangeGroupBuilder::new(settings)?;
    repository.traverse_history(&mut |commit| Ok(builder.visit(&commit)))?;
    Ok(builder.finish())
}
