//! In-memory file tree implementing the fs capabilities.
//!
//! Listings preserve insertion order, which makes the type convenient for exercising the
//! controller without touching the disk.

use std::path::{Component, Path, PathBuf};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::FsError;
use crate::types::Entry;

use super::{DirectoryLister, EntryOperations, Result, util};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir(Vec<(String, Node)>),
}

impl Node {
    fn lookup(&self, parts: &[String]) -> Option<&Node> {
        match parts.split_first() {
            None => Some(self),
            Some((head, rest)) => match self {
                Node::Dir(children) => children
                    .iter()
                    .find(|(name, _)| name == head)
                    .and_then(|(_, node)| node.lookup(rest)),
                Node::File(_) => None,
            },
        }
    }

    fn lookup_mut(&mut self, parts: &[String]) -> Option<&mut Node> {
        match parts.split_first() {
            None => Some(self),
            Some((head, rest)) => match self {
                Node::Dir(children) => children
                    .iter_mut()
                    .find(|(name, _)| name == head)
                    .and_then(|(_, node)| node.lookup_mut(rest)),
                Node::File(_) => None,
            },
        }
    }

    fn is_dir(&self) -> bool {
        matches!(self, Node::Dir(_))
    }
}

/// Thread-safe in-memory [`DirectoryLister`] and [`EntryOperations`].
#[derive(Debug)]
pub struct MemoryFileSystem {
    tree: RwLock<Node>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self { tree: RwLock::new(Node::Dir(Vec::new())) }
    }
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `path` and any missing parents.
    pub fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut tree = self.tree.write();
        let mut node = &mut *tree;
        let mut walked = PathBuf::from("/");
        for part in components(path) {
            walked.push(&part);
            let Node::Dir(children) = node else {
                return Err(FsError::NotADirectory(walked));
            };
            let idx = match children.iter().position(|(name, _)| *name == part) {
                Some(idx) => idx,
                None => {
                    children.push((part, Node::Dir(Vec::new())));
                    children.len() - 1
                }
            };
            node = &mut children[idx].1;
        }
        if node.is_dir() { Ok(()) } else { Err(FsError::NotADirectory(walked)) }
    }

    /// Write a file at `path`, creating missing parent folders and replacing existing content.
    pub fn write(&self, path: &Path, content: impl Into<Vec<u8>>) -> Result<()> {
        let (parent, name) = split(path)?;
        self.create_dir_all(&parent)?;

        let mut tree = self.tree.write();
        let children = dir_mut(&mut tree, &parent)?;
        let content = content.into();
        match children.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, Node::Dir(_))) => return Err(FsError::AlreadyExists(path.to_path_buf())),
            Some((_, node)) => *node = Node::File(content),
            None => children.push((name, Node::File(content))),
        }
        Ok(())
    }

    /// Contents of the file at `path`, if it exists.
    pub fn read(&self, path: &Path) -> Option<Vec<u8>> {
        match self.tree.read().lookup(&components(path)) {
            Some(Node::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.tree.read().lookup(&components(path)).is_some()
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        self.tree.read().lookup(&components(path)).is_some_and(Node::is_dir)
    }

    fn transfer(
        &self,
        parent: &Path,
        name: &str,
        dest_parent: &Path,
        dest_name: &str,
        want_dir: bool,
        remove_source: bool,
    ) -> Result<Entry> {
        util::validate_name(name)?;
        util::validate_name(dest_name)?;
        let source = parent.join(name);
        let dest = dest_parent.join(dest_name);
        if want_dir {
            util::ensure_not_nested(&source, &dest)?;
        }

        let mut tree = self.tree.write();
        let node = match tree.lookup(&components(&source)) {
            None => return Err(FsError::NotFound(source)),
            Some(node) if node.is_dir() != want_dir => {
                return Err(if want_dir {
                    FsError::NotADirectory(source)
                } else {
                    FsError::NotFound(source)
                });
            }
            Some(node) => node.clone(),
        };
        if dir_mut(&mut tree, dest_parent)?.iter().any(|(existing, _)| existing == dest_name) {
            return Err(FsError::AlreadyExists(dest));
        }

        if remove_source {
            let children = dir_mut(&mut tree, parent)?;
            children.retain(|(existing, _)| existing != name);
        }
        dir_mut(&mut tree, dest_parent)?.push((dest_name.to_string(), node));

        debug!(
            target: "fs::memory",
            from = %source.display(),
            to = %dest.display(),
            moved = remove_source,
            "transferred entry"
        );
        Ok(Entry { name: dest_name.to_string(), is_file: !want_dir, is_directory: want_dir, native_path: dest })
    }

    fn remove(&self, parent: &Path, name: &str, want_dir: bool) -> Result<()> {
        util::validate_name(name)?;
        let target = parent.join(name);
        let mut tree = self.tree.write();
        let children = dir_mut(&mut tree, parent)?;
        let idx = children
            .iter()
            .position(|(existing, _)| existing == name)
            .ok_or_else(|| FsError::NotFound(target.clone()))?;
        match (&children[idx].1, want_dir) {
            (Node::Dir(_), false) => return Err(FsError::NotFound(target)),
            (Node::File(_), true) => return Err(FsError::NotADirectory(target)),
            _ => {}
        }
        children.remove(idx);
        Ok(())
    }

    fn create(&self, parent: &Path, name: &str, node: Node) -> Result<Entry> {
        util::validate_name(name)?;
        let target = parent.join(name);
        let is_directory = node.is_dir();
        let mut tree = self.tree.write();
        let children = dir_mut(&mut tree, parent)?;
        if children.iter().any(|(existing, _)| existing == name) {
            return Err(FsError::AlreadyExists(target));
        }
        children.push((name.to_string(), node));
        Ok(Entry { name: name.to_string(), is_file: !is_directory, is_directory, native_path: target })
    }
}

impl DirectoryLister for MemoryFileSystem {
    fn list(&self, root: &Path, relative_path: &str) -> Result<Vec<Entry>> {
        let dir = super::resolve(root, relative_path);
        let tree = self.tree.read();
        match tree.lookup(&components(&dir)) {
            None => Err(FsError::NotFound(dir)),
            Some(Node::File(_)) => Err(FsError::NotADirectory(dir)),
            Some(Node::Dir(children)) => Ok(children
                .iter()
                .map(|(name, node)| Entry {
                    name: name.clone(),
                    is_file: !node.is_dir(),
                    is_directory: node.is_dir(),
                    native_path: dir.join(name),
                })
                .collect()),
        }
    }
}

impl EntryOperations for MemoryFileSystem {
    fn create_dir(&self, parent: &Path, name: &str) -> Result<Entry> {
        self.create(parent, name, Node::Dir(Vec::new()))
    }

    fn create_file(&self, parent: &Path, name: &str, content: &[u8]) -> Result<Entry> {
        self.create(parent, name, Node::File(content.to_vec()))
    }

    fn remove_file(&self, parent: &Path, name: &str) -> Result<()> {
        self.remove(parent, name, false)
    }

    fn remove_dir(&self, parent: &Path, name: &str) -> Result<()> {
        self.remove(parent, name, true)
    }

    fn move_dir(
        &self,
        parent: &Path,
        name: &str,
        dest_parent: &Path,
        dest_name: &str,
    ) -> Result<Entry> {
        self.transfer(parent, name, dest_parent, dest_name, true, true)
    }

    fn move_file(
        &self,
        parent: &Path,
        name: &str,
        dest_parent: &Path,
        dest_name: &str,
    ) -> Result<Entry> {
        self.transfer(parent, name, dest_parent, dest_name, false, true)
    }

    fn copy_dir(
        &self,
        parent: &Path,
        name: &str,
        dest_parent: &Path,
        dest_name: &str,
    ) -> Result<Entry> {
        self.transfer(parent, name, dest_parent, dest_name, true, false)
    }

    fn copy_file(
        &self,
        parent: &Path,
        name: &str,
        dest_parent: &Path,
        dest_name: &str,
    ) -> Result<Entry> {
        self.transfer(parent, name, dest_parent, dest_name, false, false)
    }
}

fn components(path: &Path) -> Vec<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    parts
}

fn split(path: &Path) -> Result<(PathBuf, String)> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| FsError::InvalidName(path.display().to_string()))?;
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("/"));
    Ok((parent, name))
}

fn dir_mut<'a>(tree: &'a mut Node, path: &Path) -> Result<&'a mut Vec<(String, Node)>> {
    match tree.lookup_mut(&components(path)) {
        None => Err(FsError::NotFound(path.to_path_buf())),
        Some(Node::File(_)) => Err(FsError::NotADirectory(path.to_path_buf())),
        Some(Node::Dir(children)) => Ok(children),
    }
}
