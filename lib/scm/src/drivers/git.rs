use std::path::Path;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{
    Commit as Git2Commit, ErrorCode, ObjectType, Repository as Git2Repository, Sort, Time,
};
use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::commit::{ScmCommit, ScmTag};
use crate::drivers::{CommitVisitor, ScmRepository};
use crate::errors::ScmResult;
use crate::GIT;

const DATE_FORMAT: &str = "%Y-%m-%d";

impl From<&Git2Commit<'_>> for ScmCommit {
    fn from(value: &Git2Commit) -> Self {
        ScmCommit {
            id: value.id().to_string(),
            message: String::from_utf8_lossy(value.message_bytes()).to_string(),
            date: format_date(value.committer().when()),
            tag: None,
        }
    }
}

/// Formats a git timestamp as a calendar date in the offset it was recorded with.
fn format_date(time: Time) -> String {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or(Utc.fix());
    DateTime::from_timestamp(time.seconds(), 0)
        .unwrap_or_default()
        .with_timezone(&offset)
        .format(DATE_FORMAT)
        .to_string()
}

/// Title cases each word of `name` where words are separated by any non-alphanumeric character.
fn title_case(name: &str) -> String {
    let mut titled = String::with_capacity(name.len());
    let mut word_start = true;
    for c in name.chars() {
        if word_start {
            titled.extend(c.to_uppercase());
        } else {
            titled.extend(c.to_lowercase());
        }
        word_start = !c.is_alphanumeric();
    }
    titled
}

pub struct GitScmRepository {
    inner: Git2Repository,
}

impl GitScmRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> ScmResult<Self> {
        Ok(Self {
            inner: Git2Repository::open(&path)?,
        })
    }

    /// Whether HEAD points at a commit. An unborn branch has no history to walk.
    fn has_head(&self) -> ScmResult<bool> {
        match self.inner.head() {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl ScmRepository for GitScmRepository {
    fn name(&self) -> String {
        let root = self
            .inner
            .workdir()
            .unwrap_or_else(|| self.inner.path());
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().trim_end_matches(".git").to_string())
            .unwrap_or_default();

        title_case(&name)
    }

    /// Parses and returns a commit-tag map.
    ///
    /// It collects lightweight and annotated tags. Annotated tags are peeled through the tag
    /// object to the commit they target. Tag names are visited in ascending order so when several
    /// tags point at one commit the greatest name wins.
    fn tags(&self) -> ScmResult<IndexMap<String, ScmTag>> {
        let mut names = self
            .inner
            .tag_names(None)?
            .iter()
            .flatten()
            .map(String::from)
            .collect::<Vec<String>>();
        names.sort();

        let mut tags: IndexMap<String, ScmTag> = IndexMap::new();
        for name in names {
            let reference = self
                .inner
                .find_reference(&format!("refs/tags/{name}"))?
                .resolve()?;
            let Some(oid) = reference.target() else {
                continue;
            };

            let object = self.inner.find_object(oid, None)?;
            let (commit, annotated) = match object.kind() {
                Some(ObjectType::Tag) => match object.peel_to_commit() {
                    Ok(commit) => (commit, true),
                    Err(e) => {
                        debug!("tag {} does not point at a commit: {}", &name, e);
                        continue;
                    }
                },
                Some(ObjectType::Commit) => match object.into_commit() {
                    Ok(commit) => (commit, false),
                    Err(_) => continue,
                },
                _ => {
                    debug!("tag {} does not point at a commit", &name);
                    continue;
                }
            };

            let commit_id = commit.id().to_string();
            if let Some(previous) = tags.get(&commit_id) {
                warn!(
                    "commit {} is tagged by both {} and {}, using {}",
                    &commit_id, &previous.name, &name, &name
                );
            }

            let tag = ScmTag {
                name,
                commit_id,
                annotated,
            };
            debug!(
                "indexed {} tag {} at {}",
                if tag.annotated { "annotated" } else { "lightweight" },
                &tag.name,
                &tag.commit_id
            );
            tags.insert(tag.commit_id.clone(), tag);
        }

        Ok(tags)
    }

    fn traverse_history(&self, visitor: &mut CommitVisitor<'_>) -> ScmResult<()> {
        let tags = self.tags()?;

        if !self.has_head()? {
            debug!("repository has no commits");
            return Ok(());
        }

        let mut revwalk = self.inner.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push_head()?;

        for oid in revwalk {
            let git_commit = self.inner.find_commit(oid?)?;
            let mut commit = ScmCommit::from(&git_commit);
            commit.tag = tags.get(&commit.id).map(|t| t.name.clone());
            trace!("visiting commit {} ({:?})", &commit.id, &commit.tag);

            if visitor(commit)?.is_break() {
                debug!("history traversal stopped at commit {}", git_commit.id());
                break;
            }
        }

        Ok(())
    }

    fn workdir(&self) -> Option<&Path> {
        self.inner.workdir()
    }

    fn scm(&self) -> &'static str {
        GIT
    }
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;

    use test_case::test_case;
    use testing::git::GitFixture;

    use super::{format_date, title_case};
    use crate::commit::ScmCommit;
    use crate::drivers::git::GitScmRepository;
    use crate::drivers::ScmRepository;
    use crate::errors::ScmError;

    fn collect(scm: &GitScmRepository) -> Vec<ScmCommit> {
        let mut commits = vec![];
        scm.traverse_history(&mut |c| {
            commits.push(c);
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();
        commits
    }

    #[test_case("my-project" => "My-Project"; "hyphenated")]
    #[test_case("gitchanges" => "Gitchanges"; "single word")]
    #[test_case("some_PROJECT name" => "Some_Project Name"; "mixed separators")]
    #[test_case("" => ""; "empty")]
    fn should_title_case(name: &str) -> String {
        title_case(name)
    }

    #[test_case(1_700_000_000, 0 => "2023-11-14"; "utc")]
    #[test_case(1_700_000_000, 120 => "2023-11-15"; "ahead of utc crosses midnight")]
    #[test_case(1_700_000_000, -600 => "2023-11-14"; "behind utc")]
    fn should_format_date_in_committer_offset(seconds: i64, offset_minutes: i32) -> String {
        format_date(git2::Time::new(seconds, offset_minutes))
    }

    #[test]
    fn should_name_repository_after_directory() {
        let fixture = GitFixture::with_dir_name("my-project");
        let scm = GitScmRepository::new(fixture.path()).unwrap();
        assert_eq!("My-Project", scm.name());
    }

    #[test]
    fn should_resolve_lightweight_and_annotated_tags() {
        let fixture = GitFixture::new();
        let first = fixture.commit("first");
        fixture.tag("v0.1.0");
        let second = fixture.commit("second");
        fixture.annotated_tag("v0.2.0", "release 0.2.0");

        let scm = GitScmRepository::new(fixture.path()).unwrap();
        let tags = scm.tags().unwrap();

        assert_eq!(2, tags.len());
        let lightweight = tags.get(&first.to_string()).unwrap();
        assert_eq!("v0.1.0", lightweight.name);
        assert!(!lightweight.annotated);

        let annotated = tags.get(&second.to_string()).unwrap();
        assert_eq!("v0.2.0", annotated.name);
        assert!(annotated.annotated);
        assert_eq!(second.to_string(), annotated.commit_id);
    }

    #[test]
    fn should_prefer_greatest_tag_name_when_commit_has_several_tags() {
        let fixture = GitFixture::new();
        let commit = fixture.commit("first");
        fixture.tag("v1.0.0");
        fixture.annotated_tag("release-1", "release");

        let scm = GitScmRepository::new(fixture.path()).unwrap();
        let tags = scm.tags().unwrap();

        assert_eq!(1, tags.len());
        assert_eq!("v1.0.0", tags.get(&commit.to_string()).unwrap().name);
    }

    #[test]
    fn should_traverse_newest_first_with_tags_attached() {
        let fixture = GitFixture::new();
        fixture.commit("feat: Z");
        fixture.commit("feat: Y");
        fixture.tag("v1");
        fixture.commit("fix: X");
        fixture.commit("release v2\n\nwith a body");
        fixture.annotated_tag("v2", "second release");

        let scm = GitScmRepository::new(fixture.path()).unwrap();
        let commits = collect(&scm);

        let summary = commits
            .iter()
            .map(|c| (c.description().to_string(), c.tag.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            vec![
                ("release v2".to_string(), Some("v2".to_string())),
                ("fix: X".to_string(), None),
                ("feat: Y".to_string(), Some("v1".to_string())),
                ("feat: Z".to_string(), None),
            ],
            summary
        );
        assert_eq!("release v2\n\nwith a body", commits[0].message);
    }

    #[test]
    fn should_date_commits_in_committer_offset() {
        let fixture = GitFixture::new();
        fixture.commit_at("late night commit", 1_700_000_000, 120);

        let scm = GitScmRepository::new(fixture.path()).unwrap();
        let commits = collect(&scm);

        assert_eq!(1, commits.len());
        assert_eq!("2023-11-15", commits[0].date);
    }

    #[test]
    fn should_stop_traversal_on_break() {
        let fixture = GitFixture::new();
        fixture.commit("one");
        fixture.commit("two");
        fixture.commit("three");

        let scm = GitScmRepository::new(fixture.path()).unwrap();
        let mut visited = vec![];
        scm.traverse_history(&mut |c| {
            visited.push(c.message.clone());
            if visited.len() == 2 {
                return Ok(ControlFlow::Break(()));
            }
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();

        assert_eq!(vec!["three".to_string(), "two".to_string()], visited);
    }

    #[test]
    fn should_propagate_visitor_errors() {
        let fixture = GitFixture::new();
        fixture.commit("one");
        fixture.commit("two");

        let scm = GitScmRepository::new(fixture.path()).unwrap();
        let mut visited = 0;
        let result = scm.traverse_history(&mut |_| {
            visited += 1;
            Err(ScmError::GitError(git2::Error::from_str("corrupt object")))
        });

        assert!(matches!(result, Err(ScmError::GitError(_))));
        assert_eq!(1, visited);
    }

    #[test]
    fn should_treat_repository_without_commits_as_empty_history() {
        let fixture = GitFixture::new();
        let scm = GitScmRepository::new(fixture.path()).unwrap();
        assert!(collect(&scm).is_empty());
    }
}
