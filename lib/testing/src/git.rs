use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature, Time};
use tempfile::TempDir;

// 2020-09-13T12:26:40Z
const START_TIMESTAMP: i64 = 1_600_000_000;
const ONE_DAY: i64 = 86_400;

/// A git repository in a temporary directory that is removed on drop.
///
/// Every commit is made one day after the previous one so history order is stable regardless of
/// how quickly the test runs.
pub struct GitFixture {
    // held so the directory lives as long as the fixture
    _dir: TempDir,
    path: PathBuf,
    repo: Repository,
    clock: Cell<i64>,
}

impl GitFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().to_path_buf();
        Self::init(dir, path)
    }

    /// Creates the repository in a child directory called `name`, for tests that care about the
    /// repository's directory name.
    pub fn with_dir_name(name: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join(name);
        fs::create_dir_all(&path).expect("create repository dir");
        Self::init(dir, path)
    }

    fn init(dir: TempDir, path: PathBuf) -> Self {
        let repo = Repository::init(&path).expect("init git");
        Self {
            _dir: dir,
            path,
            repo,
            clock: Cell::new(START_TIMESTAMP),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn signature(&self) -> Signature<'static> {
        let seconds = self.clock.get();
        Signature::new("Test", "test@example.com", &Time::new(seconds, 0)).expect("signature")
    }

    /// Commits an empty tree on top of HEAD.
    pub fn commit(&self, message: &str) -> Oid {
        self.clock.set(self.clock.get() + ONE_DAY);
        self.commit_with_signature(message, &self.signature())
    }

    /// Commits with an explicit committer time and UTC offset.
    pub fn commit_at(&self, message: &str, seconds: i64, offset_minutes: i32) -> Oid {
        let signature = Signature::new(
            "Test",
            "test@example.com",
            &Time::new(seconds, offset_minutes),
        )
        .expect("signature");
        self.commit_with_signature(message, &signature)
    }

    fn commit_with_signature(&self, message: &str, signature: &Signature) -> Oid {
        let tree_id = self
            .repo
            .treebuilder(None)
            .and_then(|builder| builder.write())
            .expect("write tree");
        let tree = self.repo.find_tree(tree_id).expect("find tree");
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents = parent.iter().collect::<Vec<_>>();

        self.repo
            .commit(Some("HEAD"), signature, signature, message, &tree, &parents)
            .expect("commit")
    }

    /// Adds a lightweight tag pointing at HEAD.
    pub fn tag(&self, name: &str) -> Oid {
        let head = self.repo.revparse_single("HEAD").expect("resolve HEAD");
        self.repo
            .tag_lightweight(name, &head, false)
            .expect("lightweight tag")
    }

    /// Adds an annotated tag pointing at HEAD.
    pub fn annotated_tag(&self, name: &str, message: &str) -> Oid {
        let head = self.repo.revparse_single("HEAD").expect("resolve HEAD");
        self.repo
            .tag(name, &head, &self.signature(), message, false)
            .expect("annotated tag")
    }
}

impl Default for GitFixture {
    fn default() -> Self {
        Self::new()
    }
}
