//! Core of a device file browser: list a data directory, create, delete, copy and move
//! entries, open files in external viewers, and import camera captures.

#![deny(missing_debug_implementations)]

use std::time::{SystemTime, UNIX_EPOCH};

pub mod capture;
pub mod codec;
pub mod config;
pub mod controller;
pub mod error;
pub mod fs;
pub mod log;
pub mod nav;
pub mod notify;
pub mod types;
pub mod viewer;

pub type Result<T> = std::result::Result<T, anyhow::Error>;

pub use config::BrowserConfig;
pub use controller::{BrowserController, Collaborators};
pub use error::{BrowserError, CaptureError, FsError, ViewerError};
pub use types::{
    BrowserState, CaptureOptions, Encoding, Entry, PendingTransfer, PictureSource, Selection,
    Toast, ToastPosition, TransferMode,
};

/// Returns the version of the core crate for telemetry and debugging.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub(crate) fn unix_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}
