//! Subject frame classification
//!
//! The subject is the first frame (scanning outer to inner) whose file is the
//! failing scenario's own source. Paths are compared in project-relative,
//! lexically normalised form so absolute frame paths match the relative
//! scenario path the host reports.

use crate::error::ContextError;
use crate::frame::FrameChain;
use std::path::{Component, Path, PathBuf};

/// Picks the subject frame out of a chain
#[derive(Debug, Clone, Default)]
pub struct FrameClassifier {
    project_dir: PathBuf,
}

impl FrameClassifier {
    /// Create classifier rooted at the project directory
    #[inline]
    #[must_use]
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: normalise(&project_dir.into()),
        }
    }

    /// Project root frames are made relative to
    #[inline]
    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Index of the subject frame in `chain`
    ///
    /// Falls back to the innermost frame when no frame belongs to
    /// `scenario_path`.
    ///
    /// # Errors
    /// Returns [`ContextError::EmptyFrameChain`] when the chain has no frames.
    pub fn subject_index(
        &self,
        chain: &FrameChain,
        scenario_path: &Path,
    ) -> Result<usize, ContextError> {
        if chain.is_empty() {
            return Err(ContextError::EmptyFrameChain);
        }

        let target = self.project_relative(scenario_path);
        let index = chain
            .iter()
            .position(|frame| self.project_relative(frame.path()) == target)
            .unwrap_or(chain.len() - 1);

        Ok(index)
    }

    /// Project-relative, normalised form of `path`
    #[must_use]
    pub fn project_relative(&self, path: &Path) -> PathBuf {
        let path = normalise(path);
        match path.strip_prefix(&self.project_dir) {
            Ok(relative) if !self.project_dir.as_os_str().is_empty() => relative.to_path_buf(),
            _ => path,
        }
    }
}

/// Lexical normalisation: drops `.` and folds `..` without touching the disk
fn normalise(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` above a root stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}
