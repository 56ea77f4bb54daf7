//! Image codec helpers used when importing captured photos.

pub mod image;

pub use image::{is_supported_image, reencode};

pub type Result<T> = crate::Result<T>;
