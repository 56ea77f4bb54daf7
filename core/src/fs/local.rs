//! Entry listing and mutation backed by the host file system.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::FsError;
use crate::types::Entry;

use super::{DirectoryLister, EntryOperations, Result, util};

/// [`DirectoryLister`] and [`EntryOperations`] over `std::fs`.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    show_hidden: bool,
}

impl Default for LocalFileSystem {
    fn default() -> Self {
        Self { show_hidden: true }
    }
}

impl LocalFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether dot-files are included in listings.
    pub fn with_hidden(mut self, show_hidden: bool) -> Self {
        self.show_hidden = show_hidden;
        self
    }
}

impl DirectoryLister for LocalFileSystem {
    fn list(&self, root: &Path, relative_path: &str) -> Result<Vec<Entry>> {
        let dir = super::resolve(root, relative_path);
        ensure_dir(&dir)?;

        let mut entries = Vec::new();
        for item in fs::read_dir(&dir).map_err(|err| FsError::io("reading", &dir, err))? {
            let item = item.map_err(|err| FsError::io("reading", &dir, err))?;
            let name = item.file_name().to_string_lossy().into_owned();
            if !self.show_hidden && util::is_hidden(&name) {
                continue;
            }
            entries.push(entry_for(item.path(), name));
        }

        util::sort_entries(&mut entries);
        debug!(target: "fs::local", dir = %dir.display(), count = entries.len(), "listed directory");
        Ok(entries)
    }
}

impl EntryOperations for LocalFileSystem {
    fn create_dir(&self, parent: &Path, name: &str) -> Result<Entry> {
        util::validate_name(name)?;
        let target = parent.join(name);
        fs::create_dir(&target).map_err(|err| FsError::io("creating directory", &target, err))?;
        info!(target: "fs::local", path = %target.display(), "created directory");
        Ok(Entry::directory(name, target))
    }

    fn create_file(&self, parent: &Path, name: &str, content: &[u8]) -> Result<Entry> {
        util::validate_name(name)?;
        let target = parent.join(name);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .map_err(|err| FsError::io("creating file", &target, err))?;
        file.write_all(content).map_err(|err| FsError::io("writing", &target, err))?;
        info!(target: "fs::local", path = %target.display(), bytes = content.len(), "created file");
        Ok(Entry::file(name, target))
    }

    fn remove_file(&self, parent: &Path, name: &str) -> Result<()> {
        util::validate_name(name)?;
        let target = parent.join(name);
        fs::remove_file(&target).map_err(|err| FsError::io("removing file", &target, err))?;
        info!(target: "fs::local", path = %target.display(), "removed file");
        Ok(())
    }

    fn remove_dir(&self, parent: &Path, name: &str) -> Result<()> {
        util::validate_name(name)?;
        let target = parent.join(name);
        ensure_dir(&target)?;
        fs::remove_dir_all(&target)
            .map_err(|err| FsError::io("removing directory", &target, err))?;
        info!(target: "fs::local", path = %target.display(), "removed directory");
        Ok(())
    }

    fn move_dir(
        &self,
        parent: &Path,
        name: &str,
        dest_parent: &Path,
        dest_name: &str,
    ) -> Result<Entry> {
        let (source, dest) = transfer_paths(parent, name, dest_parent, dest_name)?;
        ensure_dir(&source)?;
        util::ensure_not_nested(&source, &dest)?;

        match fs::rename(&source, &dest) {
            Ok(()) => {}
            Err(err) if crosses_devices(&err) => {
                copy_tree_or_discard(&source, &dest)?;
                // A partly removed source still has its complete copy at `dest`.
                fs::remove_dir_all(&source)
                    .map_err(|err| FsError::io("removing directory", &source, err))?;
            }
            Err(err) => return Err(FsError::io("moving", &source, err)),
        }
        info!(target: "fs::local", from = %source.display(), to = %dest.display(), "moved directory");
        Ok(Entry::directory(dest_name, dest))
    }

    fn move_file(
        &self,
        parent: &Path,
        name: &str,
        dest_parent: &Path,
        dest_name: &str,
    ) -> Result<Entry> {
        let (source, dest) = transfer_paths(parent, name, dest_parent, dest_name)?;
        ensure_file(&source)?;

        match fs::rename(&source, &dest) {
            Ok(()) => {}
            Err(err) if crosses_devices(&err) => {
                fs::copy(&source, &dest).map_err(|err| FsError::io("copying", &dest, err))?;
                if let Err(err) = fs::remove_file(&source) {
                    let _ = fs::remove_file(&dest);
                    return Err(FsError::io("removing file", &source, err));
                }
            }
            Err(err) => return Err(FsError::io("moving", &source, err)),
        }
        info!(target: "fs::local", from = %source.display(), to = %dest.display(), "moved file");
        Ok(Entry::file(dest_name, dest))
    }

    fn copy_dir(
        &self,
        parent: &Path,
        name: &str,
        dest_parent: &Path,
        dest_name: &str,
    ) -> Result<Entry> {
        let (source, dest) = transfer_paths(parent, name, dest_parent, dest_name)?;
        ensure_dir(&source)?;
        util::ensure_not_nested(&source, &dest)?;

        copy_tree_or_discard(&source, &dest)?;
        info!(target: "fs::local", from = %source.display(), to = %dest.display(), "copied directory");
        Ok(Entry::directory(dest_name, dest))
    }

    fn copy_file(
        &self,
        parent: &Path,
        name: &str,
        dest_parent: &Path,
        dest_name: &str,
    ) -> Result<Entry> {
        let (source, dest) = transfer_paths(parent, name, dest_parent, dest_name)?;
        ensure_file(&source)?;

        fs::copy(&source, &dest).map_err(|err| FsError::io("copying", &dest, err))?;
        info!(target: "fs::local", from = %source.display(), to = %dest.display(), "copied file");
        Ok(Entry::file(dest_name, dest))
    }
}

fn entry_for(path: PathBuf, name: String) -> Entry {
    let (is_file, is_directory) = match fs::metadata(&path) {
        Ok(meta) => (meta.is_file(), meta.is_dir()),
        // Dangling symlinks are listed but are neither.
        Err(_) => (false, false),
    };
    Entry { name, is_file, is_directory, native_path: path }
}

/// Validate both names, require an existing destination folder and a vacant target.
fn transfer_paths(
    parent: &Path,
    name: &str,
    dest_parent: &Path,
    dest_name: &str,
) -> Result<(PathBuf, PathBuf)> {
    util::validate_name(name)?;
    util::validate_name(dest_name)?;
    ensure_dir(dest_parent)?;

    let dest = dest_parent.join(dest_name);
    if fs::symlink_metadata(&dest).is_ok() {
        return Err(FsError::AlreadyExists(dest));
    }
    Ok((parent.join(name), dest))
}

fn ensure_dir(path: &Path) -> Result<()> {
    let meta = fs::metadata(path).map_err(|err| FsError::io("reading", path, err))?;
    if meta.is_dir() { Ok(()) } else { Err(FsError::NotADirectory(path.to_path_buf())) }
}

fn ensure_file(path: &Path) -> Result<()> {
    let meta = fs::metadata(path).map_err(|err| FsError::io("reading", path, err))?;
    if meta.is_file() { Ok(()) } else { Err(FsError::NotFound(path.to_path_buf())) }
}

/// `rename` cannot cross mount points; only then is a move done as copy + delete.
fn crosses_devices(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices
}

/// Copy `source` to a new `dest`, removing whatever was copied if any part fails.
fn copy_tree_or_discard(source: &Path, dest: &Path) -> Result<()> {
    fs::create_dir(dest).map_err(|err| FsError::io("creating directory", dest, err))?;
    copy_contents(source, dest).inspect_err(|_| {
        let _ = fs::remove_dir_all(dest);
    })
}

fn copy_contents(source: &Path, dest: &Path) -> Result<()> {
    for item in fs::read_dir(source).map_err(|err| FsError::io("reading", source, err))? {
        let item = item.map_err(|err| FsError::io("reading", source, err))?;
        let from = item.path();
        let to = dest.join(item.file_name());
        let file_type = item.file_type().map_err(|err| FsError::io("reading", &from, err))?;
        if file_type.is_dir() {
            fs::create_dir(&to).map_err(|err| FsError::io("creating directory", &to, err))?;
            copy_contents(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|err| FsError::io("copying", &to, err))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lists_entries_in_natural_order() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for name in ["file10.txt", "file2.txt", "File1.txt"] {
            fs::write(root.join(name), b"test").unwrap();
        }
        fs::create_dir(root.join("album")).unwrap();

        let entries = LocalFileSystem::new().list(root, "").expect("list root");
        let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["album", "File1.txt", "file2.txt", "file10.txt"]);
        assert!(entries[0].is_directory && !entries[0].is_file);
        assert!(entries[1].is_file && !entries[1].is_directory);
        assert_eq!(entries[1].native_path, root.join("File1.txt"));
    }

    #[test]
    fn hidden_entries_can_be_filtered() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".nomedia"), b"").unwrap();
        fs::write(dir.path().join("visible.txt"), b"").unwrap();

        let all = LocalFileSystem::new().list(dir.path(), "").unwrap();
        assert_eq!(all.len(), 2);

        let visible = LocalFileSystem::new().with_hidden(false).list(dir.path(), "").unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "visible.txt");
    }

    #[test]
    fn only_cross_device_renames_fall_back_to_copying() {
        assert!(crosses_devices(&io::Error::from(io::ErrorKind::CrossesDevices)));
        assert!(!crosses_devices(&io::Error::from(io::ErrorKind::PermissionDenied)));
        assert!(!crosses_devices(&io::Error::from(io::ErrorKind::NotFound)));
    }

    #[cfg(unix)]
    #[test]
    fn failed_directory_copy_leaves_no_partial_target() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("album/sub")).unwrap();
        fs::write(root.join("album/sub/a.jpg"), b"a").unwrap();
        std::os::unix::fs::symlink(root.join("missing.jpg"), root.join("album/sub/b.jpg"))
            .unwrap();
        fs::create_dir(root.join("dest")).unwrap();

        let err = LocalFileSystem::new()
            .copy_dir(root, "album", &root.join("dest"), "album")
            .unwrap_err();

        assert!(matches!(err, FsError::NotFound(_)));
        assert!(!root.join("dest/album").exists());
        assert!(root.join("album/sub/a.jpg").exists());
    }

    #[test]
    fn listing_a_file_is_rejected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("plain.txt"), b"").unwrap();

        let err = LocalFileSystem::new().list(dir.path(), "plain.txt").unwrap_err();
        assert!(matches!(err, FsError::NotADirectory(_)));
    }
}
