use std::path::PathBuf;

use changelog::errors::ChangelogErrors;
use scm::errors::ScmError;
use thiserror::Error;

#[remain::sorted]
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    ChangelogError(#[from] ChangelogErrors),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("{} already exists, pass --force to overwrite it", .0.display())]
    OutputExists(PathBuf),

    #[error(transparent)]
    ScmError(#[from] ScmError),
}

pub type CliResult<T> = Result<T, CliError>;
