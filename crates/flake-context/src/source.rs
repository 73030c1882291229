//! Source file access
//!
//! Rendering only needs a file's lines; the reader seam keeps the renderer
//! independent of the filesystem.

use crate::error::SourceUnavailable;
use std::path::Path;

/// Reads a source file as an ordered list of lines
#[cfg_attr(test, mockall::automock)]
pub trait SourceReader {
    /// Lines of the file at `path`, without line terminators
    ///
    /// # Errors
    /// Returns [`SourceUnavailable`] when the file is missing or unreadable.
    fn read_lines(&self, path: &Path) -> Result<Vec<String>, SourceUnavailable>;
}

impl<R: SourceReader + ?Sized> SourceReader for &R {
    fn read_lines(&self, path: &Path) -> Result<Vec<String>, SourceUnavailable> {
        (**self).read_lines(path)
    }
}

impl<R: SourceReader + ?Sized> SourceReader for Box<R> {
    fn read_lines(&self, path: &Path) -> Result<Vec<String>, SourceUnavailable> {
        (**self).read_lines(path)
    }
}

/// Reads sources straight from disk
///
/// Invalid UTF-8 is replaced rather than rejected so a stray byte never costs
/// a frame its context.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceReader;

impl SourceReader for FsSourceReader {
    fn read_lines(&self, path: &Path) -> Result<Vec<String>, SourceUnavailable> {
        let bytes = std::fs::read(path).map_err(|e| SourceUnavailable::new(path, e))?;
        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_owned)
            .collect())
    }
}
