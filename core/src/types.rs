//! Shared data structures exchanged between the controller, its collaborators, and the UI layer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Snapshot of a single file or folder as reported by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    pub is_file: bool,
    pub is_directory: bool,
    pub native_path: PathBuf,
}

impl Entry {
    pub fn file(name: impl Into<String>, native_path: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), is_file: true, is_directory: false, native_path: native_path.into() }
    }

    pub fn directory(name: impl Into<String>, native_path: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), is_file: false, is_directory: true, native_path: native_path.into() }
    }
}

/// Whether a pending transfer copies or moves its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferMode {
    Copy,
    Move,
}

impl TransferMode {
    pub fn from_move_flag(should_move: bool) -> Self {
        if should_move { TransferMode::Move } else { TransferMode::Copy }
    }

    pub fn is_move(self) -> bool {
        matches!(self, TransferMode::Move)
    }
}

/// A copy or move waiting for the user to pick a destination folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransfer {
    pub entry: Entry,
    pub mode: TransferMode,
}

/// Mutable state owned by the browser controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserState {
    /// Folder relative to the data directory, `/`-separated. Empty means the root.
    pub current_folder: String,
    pub pending_transfer: Option<PendingTransfer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PictureSource {
    #[default]
    Camera,
    PhotoLibrary,
    SavedPhotoAlbum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Encoding {
    #[default]
    Jpeg,
    Png,
}

impl Encoding {
    pub fn extension(self) -> &'static str {
        match self {
            Encoding::Jpeg => "jpg",
            Encoding::Png => "png",
        }
    }
}

/// Options handed to a [`crate::capture::CaptureSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureOptions {
    /// JPEG quality in `1..=100`. Ignored for PNG output.
    pub quality: u8,
    pub source_type: PictureSource,
    pub encoding: Encoding,
    pub save_to_photo_album: bool,
    pub correct_orientation: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            quality: 20,
            source_type: PictureSource::Camera,
            encoding: Encoding::Jpeg,
            save_to_photo_album: false,
            correct_orientation: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToastPosition {
    Top,
    Middle,
    #[default]
    Bottom,
}

/// Transient notification shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    /// Display time in milliseconds. `None` keeps the toast until dismissed.
    pub duration_ms: Option<u64>,
    pub position: ToastPosition,
}

impl Toast {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), duration_ms: None, position: ToastPosition::default() }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_position(mut self, position: ToastPosition) -> Self {
        self.position = position;
        self
    }
}

/// Outcome of selecting an entry in the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A directory was opened; `route` is the navigation target for the UI.
    Navigated { folder: String, route: String },
    /// A file was handed to the external viewer.
    Opened { path: PathBuf, content_type: String },
    /// The pending transfer completed into `destination`.
    Transferred { destination: PathBuf },
    /// A transfer is pending and the chosen entry is not a folder.
    DestinationRejected,
}
