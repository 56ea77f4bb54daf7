//! The browser screen: current folder, pending copy/move, and the last listing.
//!
//! Every mutation is delegated to a collaborator and followed by a refresh of the listing.
//! A rejected operation leaves the controller state untouched; nothing is retried.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::capture::{CaptureSource, SpoolCaptureSource};
use crate::config::BrowserConfig;
use crate::error::{BrowserError, FsError};
use crate::fs::{DirectoryLister, EntryOperations, LocalFileSystem};
use crate::nav;
use crate::notify::{LogNotifier, Notifier};
use crate::types::{
    BrowserState, CaptureOptions, Entry, PendingTransfer, Selection, Toast, TransferMode,
};
use crate::viewer::{self, CommandViewer, ExternalViewer};

pub type Result<T> = std::result::Result<T, BrowserError>;

/// Message shown when a transfer is pending and a file is picked as its destination.
pub const SELECT_FOLDER_MESSAGE: &str = "Please select a folder for your operation";

/// Capabilities the controller delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub lister: Arc<dyn DirectoryLister>,
    pub operations: Arc<dyn EntryOperations>,
    pub capture: Arc<dyn CaptureSource>,
    pub viewer: Arc<dyn ExternalViewer>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    /// Host file system, spool camera, platform opener, and log-backed toasts.
    pub fn local(config: &BrowserConfig) -> Self {
        let fs = Arc::new(LocalFileSystem::new().with_hidden(config.show_hidden));
        let viewer = match &config.viewer_program {
            Some(program) => CommandViewer::new(program.clone()),
            None => CommandViewer::default(),
        };

        Self {
            lister: fs.clone(),
            operations: fs,
            capture: Arc::new(SpoolCaptureSource::new(
                config.capture_inbox.clone(),
                config.capture_output.clone(),
            )),
            viewer: Arc::new(viewer),
            notifier: Arc::new(LogNotifier),
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct BrowserController {
    root: PathBuf,
    state: BrowserState,
    entries: Vec<Entry>,
    collaborators: Collaborators,
    capture_options: CaptureOptions,
    toast_template: Toast,
    new_file_extension: String,
}

impl BrowserController {
    /// Controller rooted at `config.data_directory`, showing `config.initial_folder`.
    ///
    /// Nothing is listed until [`BrowserController::load_documents`] is called.
    pub fn new(config: &BrowserConfig, collaborators: Collaborators) -> Self {
        let toast_template = Toast::new(String::new())
            .with_duration(config.toast.duration_ms)
            .with_position(config.toast.position);

        Self {
            root: config.data_directory.clone(),
            state: BrowserState {
                current_folder: config.initial_folder.trim_matches('/').to_string(),
                pending_transfer: None,
            },
            entries: Vec::new(),
            collaborators,
            capture_options: config.capture,
            toast_template,
            new_file_extension: config.new_file_extension.clone(),
        }
    }

    /// Controller showing the folder addressed by a route from [`nav::route_for`].
    pub fn from_route(
        config: &BrowserConfig,
        collaborators: Collaborators,
        route: &str,
    ) -> crate::Result<Self> {
        let mut controller = Self::new(config, collaborators);
        controller.state.current_folder = nav::folder_from_route(route)?;
        Ok(controller)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> &BrowserState {
        &self.state
    }

    pub fn current_folder(&self) -> &str {
        &self.state.current_folder
    }

    pub fn pending_transfer(&self) -> Option<&PendingTransfer> {
        self.state.pending_transfer.as_ref()
    }

    /// Entries from the last successful listing.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Route addressing the current folder.
    pub fn route(&self) -> String {
        nav::route_for(&self.state.current_folder)
    }

    /// Absolute path of the current folder.
    pub fn folder_path(&self) -> PathBuf {
        crate::fs::resolve(&self.root, &self.state.current_folder)
    }

    /// Refresh the listing of the current folder.
    ///
    /// The pending transfer is dropped before the request is made, whether or not the listing
    /// succeeds. On failure the previous entries stay in place.
    pub fn load_documents(&mut self) -> Result<&[Entry]> {
        self.state.pending_transfer = None;

        let listed = self
            .collaborators
            .lister
            .list(&self.root, &self.state.current_folder)
            .inspect_err(|err| {
                warn!(target: "controller", folder = %self.state.current_folder, "listing failed: {err}");
            })?;

        debug!(
            target: "controller",
            root = %self.root.display(),
            folder = %self.state.current_folder,
            count = listed.len(),
            "listed folder"
        );
        self.entries = listed;
        Ok(&self.entries)
    }

    pub fn create_folder(&mut self, name: &str) -> Result<Entry> {
        let parent = self.folder_path();
        let entry = self
            .collaborators
            .operations
            .create_dir(&parent, name)
            .inspect_err(|err| warn!(target: "controller", name, "creating folder failed: {err}"))?;
        info!(target: "controller", path = %entry.native_path.display(), "folder created");
        self.load_documents()?;
        Ok(entry)
    }

    pub fn create_file(&mut self, name: &str, content: &[u8]) -> Result<Entry> {
        let parent = self.folder_path();
        let entry = self
            .collaborators
            .operations
            .create_file(&parent, name, content)
            .inspect_err(|err| warn!(target: "controller", name, "creating file failed: {err}"))?;
        info!(target: "controller", path = %entry.native_path.display(), "file created");
        self.load_documents()?;
        Ok(entry)
    }

    /// Create a small text file stamped with the current time.
    ///
    /// The configured extension is appended when `name` does not already carry one. A blank
    /// `name` is rejected rather than producing a bare `.txt`.
    pub fn create_text_file(&mut self, name: &str) -> Result<Entry> {
        if name.trim().is_empty() {
            return Err(FsError::InvalidName(name.to_string()).into());
        }
        let has_extension = Path::new(name).extension().is_some();
        let file_name = if has_extension || self.new_file_extension.is_empty() {
            name.to_string()
        } else {
            format!("{name}.{}", self.new_file_extension)
        };
        let content = format!("My custom text - {}", crate::unix_millis());
        self.create_file(&file_name, content.as_bytes())
    }

    /// Remove `entry` from the current folder. Folders are removed with their contents.
    pub fn delete_entry(&mut self, entry: &Entry) -> Result<()> {
        let parent = self.folder_path();
        let operations = &self.collaborators.operations;
        let removed = if entry.is_directory {
            operations.remove_dir(&parent, &entry.name)
        } else {
            operations.remove_file(&parent, &entry.name)
        };
        removed.inspect_err(|err| {
            warn!(target: "controller", name = %entry.name, "delete failed: {err}");
        })?;

        info!(target: "controller", name = %entry.name, "entry deleted");
        self.load_documents()?;
        Ok(())
    }

    /// Remember `entry` as the subject of a copy (or move) awaiting its destination folder.
    pub fn start_transfer(&mut self, entry: Entry, should_move: bool) {
        let mode = TransferMode::from_move_flag(should_move);
        debug!(target: "controller", name = %entry.name, ?mode, "transfer pending");
        self.state.pending_transfer = Some(PendingTransfer { entry, mode });
    }

    /// React to the user tapping `entry`.
    ///
    /// With a transfer pending, `entry` is the destination and must be a folder. Otherwise
    /// folders are entered and files are handed to the external viewer.
    pub fn select_entry(&mut self, entry: &Entry) -> Result<Selection> {
        debug!(target: "controller", name = %entry.name, path = %entry.native_path.display(), "entry selected");

        if self.state.pending_transfer.is_some() {
            if !entry.is_directory {
                self.collaborators.notifier.notify(&Toast::new(SELECT_FOLDER_MESSAGE));
                return Ok(Selection::DestinationRejected);
            }
            return self.finish_transfer(entry);
        }

        if entry.is_file {
            let content_type = viewer::content_type_for(&entry.native_path);
            self.collaborators
                .viewer
                .open(&entry.native_path, &content_type)
                .inspect_err(|err| warn!(target: "controller", name = %entry.name, "open failed: {err}"))?;
            return Ok(Selection::Opened { path: entry.native_path.clone(), content_type });
        }

        self.open_folder(&entry.name)
    }

    /// Take a photo and move it into the current folder.
    pub fn import_capture(&mut self) -> Result<Entry> {
        let captured = self
            .collaborators
            .capture
            .capture(&self.capture_options)
            .inspect_err(|err| warn!(target: "controller", "capture failed: {err}"))?;

        let source_dir = captured.parent().map(Path::to_path_buf);
        let name = captured.file_name().and_then(|name| name.to_str()).map(str::to_owned);
        let (Some(source_dir), Some(name)) = (source_dir, name) else {
            return Err(BrowserError::InvalidCapturePath(captured));
        };

        let entry = self
            .collaborators
            .operations
            .move_file(&source_dir, &name, &self.folder_path(), &name)
            .inspect_err(|err| {
                warn!(target: "controller", name = %name, "importing capture failed: {err}");
            })?;
        info!(target: "controller", path = %entry.native_path.display(), "capture imported");
        self.load_documents()?;
        Ok(entry)
    }

    /// Show `text` as a toast with the configured duration and position.
    pub fn present_toast(&self, text: &str) {
        let toast = Toast { message: text.to_string(), ..self.toast_template.clone() };
        self.collaborators.notifier.notify(&toast);
    }

    fn open_folder(&mut self, name: &str) -> Result<Selection> {
        crate::fs::validate_name(name)?;
        let next = nav::join_folder(&self.state.current_folder, name);
        let previous = std::mem::replace(&mut self.state.current_folder, next);
        let loaded = self.load_documents().map(|entries| entries.len());
        if let Err(err) = loaded {
            self.state.current_folder = previous;
            return Err(err);
        }

        let folder = self.state.current_folder.clone();
        info!(target: "controller", folder = %folder, "navigated");
        Ok(Selection::Navigated { route: nav::route_for(&folder), folder })
    }

    fn finish_transfer(&mut self, destination: &Entry) -> Result<Selection> {
        let Some(PendingTransfer { entry, mode }) = self.state.pending_transfer.clone() else {
            return Ok(Selection::DestinationRejected);
        };

        let parent = self.folder_path();
        let target_dir = parent.join(&destination.name);
        let operations = &self.collaborators.operations;
        let transferred = match (mode, entry.is_directory) {
            (TransferMode::Move, true) => {
                operations.move_dir(&parent, &entry.name, &target_dir, &entry.name)
            }
            (TransferMode::Move, false) => {
                operations.move_file(&parent, &entry.name, &target_dir, &entry.name)
            }
            (TransferMode::Copy, true) => {
                operations.copy_dir(&parent, &entry.name, &target_dir, &entry.name)
            }
            (TransferMode::Copy, false) => {
                operations.copy_file(&parent, &entry.name, &target_dir, &entry.name)
            }
        }
        .inspect_err(|err| {
            warn!(target: "controller", name = %entry.name, ?mode, "transfer failed: {err}");
        })?;

        info!(
            target: "controller",
            name = %entry.name,
            ?mode,
            destination = %transferred.native_path.display(),
            "transfer finished"
        );
        self.state.pending_transfer = None;
        self.load_documents()?;
        Ok(Selection::Transferred { destination: transferred.native_path })
    }
}
