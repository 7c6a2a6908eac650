use std::path::PathBuf;

use scm::errors::ScmError;
use thiserror::Error;

#[remain::sorted]
#[derive(Debug, Error)]
pub enum ChangelogErrors {
    /// A group by or skip pattern is not a valid regular expression.
    #[error("failed to compile {name} pattern `{pattern}`: {source}")]
    InvalidPattern {
        name: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid settings file {}: {source}", path.display())]
    InvalidSettings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Error that may occur while I/O operations.
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    TemplatingError(#[from] gitchanges_templating::TemplatingError),

    /// The history source failed part way through the walk.
    #[error("failed during history traversal: {0}")]
    TraversalError(#[from] ScmError),
}

pub type ChangelogResult<T> = Result<T, ChangelogErrors>;
