use std::path::PathBuf;

use thiserror::Error;

use crate::task::TaskId;

/// Coarse classification the front end uses to phrase warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Selection,
    Io,
    Parse,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task text cannot be empty")]
    EmptyText,

    #[error("no task at position {position} ({visible} visible)")]
    OutOfRange { position: usize, visible: usize },

    #[error("task {0} is no longer in the store")]
    UnknownTask(TaskId),

    #[error("failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `task` is the zero-based index of the record that failed, when the
    /// file was a well-formed array.
    #[error("failed to parse {}{}", .path.display(), at_task(.task))]
    Parse {
        path: PathBuf,
        task: Option<usize>,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::EmptyText => ErrorKind::Validation,
            StoreError::OutOfRange { .. } | StoreError::UnknownTask(_) => ErrorKind::Selection,
            StoreError::Io { .. } => ErrorKind::Io,
            StoreError::Parse { .. } => ErrorKind::Parse,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

fn at_task(task: &Option<usize>) -> String {
    match task {
        Some(idx) => format!(" (task #{})", idx + 1),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
#[error("unknown category: {0} (expected General, Work, Study or Personal)")]
pub struct UnknownCategory(pub String);
