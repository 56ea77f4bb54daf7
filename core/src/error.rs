//! Typed failures reported by collaborators and the browser controller.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a [`crate::fs::DirectoryLister`] or [`crate::fs::EntryOperations`].
#[derive(Debug, Error)]
pub enum FsError {
    #[error("{0:?} does not exist")]
    NotFound(PathBuf),
    #[error("{0:?} already exists")]
    AlreadyExists(PathBuf),
    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),
    #[error("invalid entry name {0:?}")]
    InvalidName(String),
    #[error("cannot place {source_path:?} inside itself at {destination:?}")]
    DestinationInsideSource { source_path: PathBuf, destination: PathBuf },
    #[error("{action} {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => FsError::NotFound(path),
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists(path),
            _ => FsError::Io { action, path, source },
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no image available in {0:?}")]
    NoImage(PathBuf),
    #[error("processing captured image {path:?}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("capture i/o on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("launching {program} for {path:?}: {source}")]
    Launch {
        program: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Error surfaced by [`crate::controller::BrowserController`] operations.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Viewer(#[from] ViewerError),
    #[error("captured path {0:?} has no file name")]
    InvalidCapturePath(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_specific_variants() {
        let missing = FsError::io("reading", "/nope", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(missing, FsError::NotFound(_)));

        let exists = FsError::io("creating", "/dup", io::Error::from(io::ErrorKind::AlreadyExists));
        assert!(matches!(exists, FsError::AlreadyExists(_)));

        let denied =
            FsError::io("removing", "/locked", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(denied.to_string().starts_with("removing"));
    }
}
