//! Temporary files that receive command artifacts.
//!
//! A [`TempFile`] owns its backing file and removes it when dropped, unless
//! deletion was turned off. It can be handed to a command as an input, used
//! as the output sink of an execution, copied elsewhere, or turned into an
//! HTTP download response with [`TempFile::send`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use cmdrelay_common::{InputSource, OutputSink};
use tempfile::TempPath;
use tracing::debug;

mod send;
mod sniff;

pub use send::{HeaderOverride, SendOptions, DEFAULT_HEADERS};
pub use sniff::{sniff_content_type, OCTET_STREAM};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Temporary file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Temporary file was already released")]
    Released,
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("Failed to build response: {0}")]
    Response(#[from] hyper::http::Error),
}

/// Where and how the backing file is named.
#[derive(Debug, Clone, Default)]
pub struct TempFileOptions {
    pub suffix: Option<String>,
    pub prefix: Option<String>,
    /// Directory for the file; the system temp directory when unset.
    pub dir: Option<PathBuf>,
}

impl TempFileOptions {
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }
}

/// A file on disk that lives as long as this value.
#[derive(Debug)]
pub struct TempFile {
    path: Option<TempPath>,
    delete: bool,
}

impl TempFile {
    /// Create a file holding `content` in the system temp directory.
    pub fn new(content: impl AsRef<[u8]>) -> Result<Self, SinkError> {
        Self::with_options(content, &TempFileOptions::default())
    }

    pub fn with_options(
        content: impl AsRef<[u8]>,
        options: &TempFileOptions,
    ) -> Result<Self, SinkError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(options.prefix.as_deref().unwrap_or("cmdrelay_"));
        if let Some(suffix) = &options.suffix {
            builder.suffix(suffix);
        }
        let mut file = match &options.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(content.as_ref())?;
        file.flush()?;

        let path = file.into_temp_path();
        debug!(target: "cmdrelay::sink", path = %path.display(), "created temporary file");
        Ok(Self {
            path: Some(path),
            delete: true,
        })
    }

    /// Full path of the backing file.
    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or(Path::new(""))
    }

    pub fn delete_on_drop(&self) -> bool {
        self.delete
    }

    /// Keep (`false`) or remove (`true`) the backing file when dropped.
    pub fn set_delete(&mut self, delete: bool) -> &mut Self {
        self.delete = delete;
        self
    }

    /// Current content of the backing file.
    pub fn content(&self) -> Result<Vec<u8>, SinkError> {
        Ok(fs::read(self.live_path()?)?)
    }

    /// Copy the backing file to `name`, which is left in place on drop.
    pub fn save_as<P: AsRef<Path>>(&self, name: P) -> Result<(), SinkError> {
        let source = self.live_path()?;
        fs::copy(source, name.as_ref())?;
        debug!(
            target: "cmdrelay::sink",
            from = %source.display(),
            to = %name.as_ref().display(),
            "saved temporary file"
        );
        Ok(())
    }

    fn live_path(&self) -> Result<&Path, SinkError> {
        self.path.as_deref().ok_or(SinkError::Released)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        if self.delete {
            if let Err(err) = path.close() {
                debug!(target: "cmdrelay::sink", error = %err, "failed to remove temporary file");
            }
        } else {
            match path.keep() {
                Ok(kept) => {
                    debug!(target: "cmdrelay::sink", path = %kept.display(), "kept temporary file")
                }
                Err(err) => {
                    debug!(target: "cmdrelay::sink", error = %err, "failed to keep temporary file")
                }
            }
        }
    }
}

impl OutputSink for TempFile {
    fn write_artifact(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let path = self.live_path().map_err(std::io::Error::other)?;
        fs::write(path, bytes)
    }

    fn describe(&self) -> String {
        self.path().display().to_string()
    }
}

impl InputSource for TempFile {
    fn input_string(&self) -> String {
        self.path().to_string_lossy().into_owned()
    }
}

impl std::fmt::Display for TempFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path().display())
    }
}
