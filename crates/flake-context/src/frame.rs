//! Stack frame records
//!
//! A frame chain is captured once when a failure happens and never mutated
//! afterwards. Frames are ordered from the outermost caller to the innermost
//! point of failure.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One entry of a failure's call chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackFrame {
    /// Source file as reported by the host runtime
    pub path: PathBuf,
    /// First line of the enclosing function or block (1-based)
    pub anchor_line: usize,
    /// Line executing when the failure occurred (1-based)
    pub error_line: usize,
}

impl StackFrame {
    /// Create a new frame
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, anchor_line: usize, error_line: usize) -> Self {
        Self {
            path: path.into(),
            anchor_line,
            error_line,
        }
    }

    /// Source file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Ordered, owned chain of frames (outermost first)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameChain(Vec<StackFrame>);

impl FrameChain {
    /// Capture a chain from frames ordered outer to inner
    #[inline]
    #[must_use]
    pub fn new(frames: Vec<StackFrame>) -> Self {
        Self(frames)
    }

    /// All frames, outermost first
    #[inline]
    #[must_use]
    pub fn frames(&self) -> &[StackFrame] {
        &self.0
    }

    /// Number of frames
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the chain has no frames
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Innermost frame (the point of failure)
    #[inline]
    #[must_use]
    pub fn innermost(&self) -> Option<&StackFrame> {
        self.0.last()
    }

    /// Iterate frames outer to inner
    pub fn iter(&self) -> std::slice::Iter<'_, StackFrame> {
        self.0.iter()
    }
}

impl FromIterator<StackFrame> for FrameChain {
    fn from_iter<I: IntoIterator<Item = StackFrame>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FrameChain {
    type Item = &'a StackFrame;
    type IntoIter = std::slice::Iter<'a, StackFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
