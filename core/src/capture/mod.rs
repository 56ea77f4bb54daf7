//! Photo capture sources.
//!
//! A [`CaptureSource`] hands back the path of a freshly produced image file; the controller
//! then moves that file into the folder being browsed. [`SpoolCaptureSource`] is the device
//! implementation: the camera drops shots into an inbox directory and each capture takes the
//! newest one, processes it according to [`CaptureOptions`], and writes the result to an output
//! directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::codec;
use crate::error::CaptureError;
use crate::types::{CaptureOptions, PictureSource};

pub type Result<T> = std::result::Result<T, CaptureError>;

/// Produces a local image file on request.
pub trait CaptureSource: Send + Sync {
    fn capture(&self, options: &CaptureOptions) -> Result<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct SpoolCaptureSource {
    inbox: PathBuf,
    output: PathBuf,
}

impl SpoolCaptureSource {
    pub fn new(inbox: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self { inbox: inbox.into(), output: output.into() }
    }

    pub fn inbox(&self) -> &Path {
        &self.inbox
    }

    fn newest_image(&self) -> Result<PathBuf> {
        let read = fs::read_dir(&self.inbox).map_err(|source| io_error(&self.inbox, source))?;
        read.filter_map(|item| item.ok())
            .filter(|item| item.file_type().map(|kind| kind.is_file()).unwrap_or(false))
            .map(|item| item.path())
            .filter(|path| codec::is_supported_image(path))
            .map(|path| {
                let modified = fs::metadata(&path)
                    .and_then(|meta| meta.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (modified, path)
            })
            .max()
            .map(|(_, path)| path)
            .ok_or_else(|| CaptureError::NoImage(self.inbox.clone()))
    }

    fn persist(&self, bytes: &[u8], extension: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output).map_err(|source| io_error(&self.output, source))?;

        let mut temp =
            NamedTempFile::new_in(&self.output).map_err(|source| io_error(&self.output, source))?;
        temp.write_all(bytes).map_err(|source| io_error(temp.path(), source))?;

        let stamp = crate::unix_millis();
        let mut attempt = 0u32;
        loop {
            let name = if attempt == 0 {
                format!("{stamp}.{extension}")
            } else {
                format!("{stamp}-{attempt}.{extension}")
            };
            let target = self.output.join(name);
            match temp.persist_noclobber(&target) {
                Ok(_) => return Ok(target),
                Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => {
                    temp = err.file;
                    attempt += 1;
                }
                Err(err) => return Err(io_error(&target, err.error)),
            }
        }
    }
}

impl CaptureSource for SpoolCaptureSource {
    fn capture(&self, options: &CaptureOptions) -> Result<PathBuf> {
        let original = self.newest_image()?;
        debug!(target: "capture", source = ?options.source_type, path = %original.display(), "picked image");

        let data = fs::read(&original).map_err(|source| io_error(&original, source))?;
        let bytes = codec::reencode(&original, &data, options).map_err(|err| {
            CaptureError::Decode { path: original.clone(), message: format!("{err:#}") }
        })?;
        let target = self.persist(&bytes, options.encoding.extension())?;

        if consumes_original(options) {
            fs::remove_file(&original).map_err(|source| io_error(&original, source))?;
        }

        info!(
            target: "capture",
            path = %target.display(),
            bytes = bytes.len(),
            quality = options.quality,
            "captured image"
        );
        Ok(target)
    }
}

/// A fresh camera shot is discarded from the spool unless it should also stay in the album.
fn consumes_original(options: &CaptureOptions) -> bool {
    options.source_type == PictureSource::Camera && !options.save_to_photo_album
}

fn io_error(path: &Path, source: std::io::Error) -> CaptureError {
    CaptureError::Io { path: path.to_path_buf(), source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Encoding;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::time::Duration;
    use tempfile::tempdir;

    fn write_png(path: &Path, width: u32, height: u32) {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb([10u8, 200, 30]));
        DynamicImage::ImageRgb8(buffer).save_with_format(path, ImageFormat::Png).unwrap();
    }

    #[test]
    fn captures_newest_image_and_consumes_it() {
        let dir = tempdir().unwrap();
        let inbox = dir.path().join("inbox");
        fs::create_dir(&inbox).unwrap();
        write_png(&inbox.join("old.png"), 2, 2);
        let older = SystemTime::now() - Duration::from_secs(60);
        fs::File::options()
            .write(true)
            .open(inbox.join("old.png"))
            .unwrap()
            .set_modified(older)
            .unwrap();
        write_png(&inbox.join("new.png"), 3, 5);
        fs::write(inbox.join("readme.txt"), b"ignored").unwrap();

        let source = SpoolCaptureSource::new(&inbox, dir.path().join("out"));
        assert_eq!(source.inbox(), inbox.as_path());
        let path = source.capture(&CaptureOptions::default()).expect("capture");

        assert_eq!(path.extension().unwrap(), "jpg");
        assert!(path.starts_with(dir.path().join("out")));
        let captured = image::open(&path).unwrap();
        assert_eq!((captured.width(), captured.height()), (3, 5));
        assert!(!inbox.join("new.png").exists());
        assert!(inbox.join("old.png").exists());
    }

    #[test]
    fn keeps_original_when_saving_to_album() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("shot.png"), 2, 2);

        let source = SpoolCaptureSource::new(dir.path(), dir.path().join("out"));
        let options = CaptureOptions {
            save_to_photo_album: true,
            encoding: Encoding::Png,
            ..CaptureOptions::default()
        };
        let path = source.capture(&options).unwrap();

        assert_eq!(path.extension().unwrap(), "png");
        assert!(dir.path().join("shot.png").exists());
    }

    #[test]
    fn consecutive_captures_get_distinct_names() {
        let dir = tempdir().unwrap();
        let options = CaptureOptions { save_to_photo_album: true, ..CaptureOptions::default() };
        write_png(&dir.path().join("shot.png"), 2, 2);

        let source = SpoolCaptureSource::new(dir.path(), dir.path().join("out"));
        let first = source.capture(&options).unwrap();
        let second = source.capture(&options).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn empty_inbox_reports_no_image() {
        let dir = tempdir().unwrap();
        let source = SpoolCaptureSource::new(dir.path(), dir.path().join("out"));

        let err = source.capture(&CaptureOptions::default()).unwrap_err();
        assert!(matches!(err, CaptureError::NoImage(_)));
    }
}
