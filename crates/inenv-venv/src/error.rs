use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VenvError>;

/// Errors returned by [`crate::VirtualEnv`] operations.
#[derive(Debug, Error)]
pub enum VenvError {
    /// The operation needs the on-disk environment, which has not been created.
    #[error("virtualenv at {} has not been created", path.display())]
    NotCreated { path: PathBuf },

    #[error("no Python interpreter found (tried {tried})")]
    InterpreterNotFound { tried: String },

    #[error("creating virtualenv '{name}' failed ({status}): {stderr}")]
    CreateFailed {
        name: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache file {} is not valid: {source}", path.display())]
    CorruptCache {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl VenvError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// True for [`VenvError::NotCreated`]; callers recover by calling `create()`.
    pub fn is_not_created(&self) -> bool {
        matches!(self, Self::NotCreated { .. })
    }
}
