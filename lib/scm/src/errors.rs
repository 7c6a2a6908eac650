use std::io;

use thiserror::Error;

#[remain::sorted]
#[derive(Debug, Error)]
pub enum ScmError {
    /// Error variant that represents errors coming out of libgit2.
    #[error("Git error: `{0}`")]
    GitError(#[from] git2::Error),

    #[error(transparent)]
    IoError(#[from] io::Error),

    #[error("Could not find supported SCM at {0}")]
    Unsupported(String),
}

pub type ScmResult<T> = Result<T, ScmError>;
