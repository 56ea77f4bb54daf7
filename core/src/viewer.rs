//! Dispatching files to external viewer applications.

use std::path::Path;
use std::process::{Command, Stdio};

use mime_guess::MimeGuess;
use tracing::info;

use crate::error::ViewerError;

/// Opens a file with whatever application handles its content type.
pub trait ExternalViewer: Send + Sync {
    fn open(&self, path: &Path, content_type: &str) -> Result<(), ViewerError>;
}

/// Content type inferred from the file extension, `text/plain` when unknown.
pub fn content_type_for(path: &Path) -> String {
    MimeGuess::from_path(path).first_or_text_plain().essence_str().to_string()
}

/// Launches a desktop opener command with the file path as its last argument.
#[derive(Debug, Clone)]
pub struct CommandViewer {
    program: String,
    args: Vec<String>,
}

impl Default for CommandViewer {
    fn default() -> Self {
        if cfg!(target_os = "windows") {
            Self::new("cmd").with_args(["/C", "start", ""])
        } else if cfg!(target_os = "macos") {
            Self::new("open")
        } else {
            Self::new("xdg-open")
        }
    }
}

impl CommandViewer {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ExternalViewer for CommandViewer {
    fn open(&self, path: &Path, content_type: &str) -> Result<(), ViewerError> {
        // The opener detaches on its own; the child handle is not awaited.
        Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ViewerError::Launch {
                program: self.program.clone(),
                path: path.to_path_buf(),
                source,
            })?;
        info!(target: "viewer", program = %self.program, path = %path.display(), content_type, "opened file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_content_type_from_extension() {
        assert_eq!(content_type_for(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("notes.txt")), "text/plain");
        assert_eq!(content_type_for(Path::new("report.pdf")), "application/pdf");
        assert_eq!(content_type_for(Path::new("no_extension")), "text/plain");
    }

    #[test]
    fn default_viewer_uses_the_platform_opener() {
        let expected = if cfg!(target_os = "windows") {
            "cmd"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        assert_eq!(CommandViewer::default().program(), expected);
    }

    #[test]
    fn missing_program_fails_to_launch() {
        let viewer = CommandViewer::new("definitely-not-an-installed-opener");
        assert_eq!(viewer.program(), "definitely-not-an-installed-opener");
        let err = viewer.open(Path::new("/tmp/a.txt"), "text/plain").unwrap_err();
        assert!(matches!(err, ViewerError::Launch { .. }));
    }
}
