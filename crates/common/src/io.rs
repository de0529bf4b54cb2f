//! Seams between a command and the artifacts it reads and writes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Destination that receives the artifact produced by one execution.
///
/// Sinks are owned by the caller and only borrowed for the duration of a
/// write. Each write replaces whatever the sink held before.
pub trait OutputSink {
    /// Replace the sink's content with `bytes`.
    fn write_artifact(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Human-readable identification for logs.
    fn describe(&self) -> String;
}

/// Sink backed by a file path; the file is created or truncated on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for FileSink {
    fn write_artifact(&mut self, bytes: &[u8]) -> io::Result<()> {
        fs::write(&self.path, bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl OutputSink for Vec<u8> {
    fn write_artifact(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.clear();
        self.extend_from_slice(bytes);
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

/// Anything that can name the input of a command: a literal, a path, or a
/// file handle that knows where its content lives.
pub trait InputSource {
    fn input_string(&self) -> String;
}

impl InputSource for str {
    fn input_string(&self) -> String {
        self.to_string()
    }
}

impl InputSource for String {
    fn input_string(&self) -> String {
        self.clone()
    }
}

impl InputSource for Path {
    fn input_string(&self) -> String {
        self.to_string_lossy().into_owned()
    }
}

impl InputSource for PathBuf {
    fn input_string(&self) -> String {
        self.as_path().input_string()
    }
}

impl<T: InputSource + ?Sized> InputSource for &T {
    fn input_string(&self) -> String {
        (**self).input_string()
    }
}
