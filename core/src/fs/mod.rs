//! File system access layer: listing and mutating entries under a data directory.

pub mod local;
pub mod memory;
mod util;

use std::path::Path;

pub use local::LocalFileSystem;
pub use memory::MemoryFileSystem;
pub use util::{
    Token, ensure_not_nested, is_hidden, natural_cmp, sort_entries, tokenize, validate_name,
};

use crate::types::Entry;

/// Shared result type for fs operations.
pub type Result<T> = std::result::Result<T, crate::error::FsError>;

/// Produces the entries of a folder below `root`.
pub trait DirectoryLister: Send + Sync {
    /// List `root/relative_path`. An empty `relative_path` lists `root` itself.
    fn list(&self, root: &Path, relative_path: &str) -> Result<Vec<Entry>>;
}

/// Creates, removes, copies, and moves entries.
///
/// Every method addresses entries as `(parent directory, name)` pairs. Creation is exclusive:
/// targets that already exist are reported as [`crate::error::FsError::AlreadyExists`].
pub trait EntryOperations: Send + Sync {
    fn create_dir(&self, parent: &Path, name: &str) -> Result<Entry>;
    fn create_file(&self, parent: &Path, name: &str, content: &[u8]) -> Result<Entry>;
    fn remove_file(&self, parent: &Path, name: &str) -> Result<()>;
    /// Remove a directory together with everything below it.
    fn remove_dir(&self, parent: &Path, name: &str) -> Result<()>;
    fn move_dir(
        &self,
        parent: &Path,
        name: &str,
        dest_parent: &Path,
        dest_name: &str,
    ) -> Result<Entry>;
    fn move_file(
        &self,
        parent: &Path,
        name: &str,
        dest_parent: &Path,
        dest_name: &str,
    ) -> Result<Entry>;
    fn copy_dir(
        &self,
        parent: &Path,
        name: &str,
        dest_parent: &Path,
        dest_name: &str,
    ) -> Result<Entry>;
    fn copy_file(
        &self,
        parent: &Path,
        name: &str,
        dest_parent: &Path,
        dest_name: &str,
    ) -> Result<Entry>;
}

/// Resolve `relative_path` below `root`, treating the empty string as `root` itself.
pub fn resolve(root: &Path, relative_path: &str) -> std::path::PathBuf {
    relative_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}
