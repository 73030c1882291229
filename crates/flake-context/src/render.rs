//! Multi-frame failure context rendering
//!
//! Each frame becomes one block headed `# {file}:`. The subject frame shows
//! its enclosing block plus a few trailing lines; context frames show only
//! the line that was executing. Rows look like:
//!
//! ```text
//!     9|scenario_file_line 9
//! >  13|scenario_file_line 13
//! ```
//!
//! Rendering is a pure function of the chain and file contents.

use crate::classify::FrameClassifier;
use crate::error::ContextError;
use crate::frame::{FrameChain, StackFrame};
use crate::source::SourceReader;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Lines shown after the failing line of the subject frame
const TRAILING_LINES: usize = 3;

/// Lines shown before the anchor line of the subject frame
const LEADING_LINES: usize = 1;

/// How a frame is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameRole {
    /// The scenario's own frame, rendered with a window of lines
    Subject,
    /// Any other frame, rendered with its failing line only
    Context,
    /// Source could not be read; a placeholder was rendered
    Unavailable,
}

/// One rendered frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    /// Frame source path
    pub path: PathBuf,
    /// How the frame was rendered
    pub role: FrameRole,
    /// Block text, header included, no trailing newline
    pub text: String,
}

/// Rendered report for a whole chain, outer to inner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureContext {
    blocks: Vec<RenderedBlock>,
    subject: usize,
}

impl FailureContext {
    /// Rendered blocks, outermost first
    #[inline]
    #[must_use]
    pub fn blocks(&self) -> &[RenderedBlock] {
        &self.blocks
    }

    /// Index of the subject frame
    #[inline]
    #[must_use]
    pub fn subject_index(&self) -> usize {
        self.subject
    }

    /// Whole report as one string
    #[must_use]
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FailureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            f.write_str(&block.text)?;
        }
        Ok(())
    }
}

/// Renders frame chains against a source reader
#[derive(Debug, Clone)]
pub struct FailureContextRenderer<R> {
    reader: R,
    classifier: FrameClassifier,
}

impl<R: SourceReader> FailureContextRenderer<R> {
    /// Create renderer for sources under `project_dir`
    #[must_use]
    pub fn new(reader: R, project_dir: impl Into<PathBuf>) -> Self {
        Self::with_classifier(reader, FrameClassifier::new(project_dir))
    }

    /// Create renderer with an existing classifier
    #[inline]
    #[must_use]
    pub fn with_classifier(reader: R, classifier: FrameClassifier) -> Self {
        Self { reader, classifier }
    }

    /// Classifier used to pick the subject frame
    #[inline]
    #[must_use]
    pub fn classifier(&self) -> &FrameClassifier {
        &self.classifier
    }

    /// Classify and render `chain` for the scenario at `scenario_path`
    ///
    /// # Errors
    /// Returns [`ContextError::EmptyFrameChain`] for an empty chain. Unreadable
    /// sources never fail the render.
    pub fn render(
        &self,
        chain: &FrameChain,
        scenario_path: &Path,
    ) -> Result<FailureContext, ContextError> {
        let subject = self.classifier.subject_index(chain, scenario_path)?;
        Ok(self.render_classified(chain, subject))
    }

    /// Render `chain` with the frame at `subject` as the subject
    #[must_use]
    pub fn render_classified(&self, chain: &FrameChain, subject: usize) -> FailureContext {
        let blocks = chain
            .iter()
            .enumerate()
            .map(|(i, frame)| self.render_frame(frame, i == subject))
            .collect();

        FailureContext { blocks, subject }
    }

    fn render_frame(&self, frame: &StackFrame, is_subject: bool) -> RenderedBlock {
        let header = format!("# {}:", frame.path.display());

        let lines = match self.reader.read_lines(&frame.path) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!(
                    path = %frame.path.display(),
                    error = %e.source,
                    "source unavailable, rendering placeholder"
                );
                return RenderedBlock {
                    path: frame.path.clone(),
                    role: FrameRole::Unavailable,
                    text: format!("{header}\n  <source unavailable: {}>", e.source.kind()),
                };
            }
        };

        let (role, window) = if is_subject {
            (
                FrameRole::Subject,
                subject_window(frame.anchor_line, frame.error_line, lines.len()),
            )
        } else {
            let line = frame.error_line;
            let in_range = line >= 1 && line <= lines.len();
            (FrameRole::Context, in_range.then_some(line..=line))
        };

        let mut text = header;
        for lineno in window.into_iter().flatten() {
            text.push('\n');
            text.push_str(&render_row(lineno, &lines[lineno - 1], lineno == frame.error_line));
        }

        RenderedBlock {
            path: frame.path.clone(),
            role,
            text,
        }
    }
}

/// Subject window `[anchor - 1, error + 3]` clamped to `[1, len]`
///
/// An anchor below the error line starts the window at `error_line`, so the
/// marked row is shown whenever it lies inside the file. `None` when the
/// clamped window is empty.
#[must_use]
pub fn subject_window(
    anchor_line: usize,
    error_line: usize,
    len: usize,
) -> Option<RangeInclusive<usize>> {
    let start = anchor_line
        .saturating_sub(LEADING_LINES)
        .min(error_line)
        .max(1);
    let end = error_line.saturating_add(TRAILING_LINES).min(len);
    (start <= end).then_some(start..=end)
}

fn render_row(lineno: usize, text: &str, marked: bool) -> String {
    let marker = if marked { '>' } else { ' ' };
    format!("{marker} {lineno:>3}|{text}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceUnavailable;
    use crate::source::MockSourceReader;
    use pretty_assertions::assert_eq;
    use std::io;

    fn numbered(prefix: &str, count: usize) -> Vec<String> {
        (1..=count).map(|n| format!("{prefix} {n}")).collect()
    }

    #[test]
    fn window_law() {
        assert_eq!(subject_window(10, 13, 19), Some(9..=16));
        assert_eq!(subject_window(2, 4, 19), Some(1..=7));
    }

    #[test]
    fn window_is_clamped() {
        assert_eq!(subject_window(1, 1, 2), Some(1..=2));
        assert_eq!(subject_window(0, 0, 5), Some(1..=3));
        assert_eq!(subject_window(30, 31, 5), None);
        assert_eq!(subject_window(1, 1, 0), None);
    }

    #[test]
    fn window_keeps_error_line_when_anchor_is_below_it() {
        assert_eq!(subject_window(12, 4, 19), Some(4..=7));
        assert_eq!(subject_window(6, 5, 19), Some(5..=8));
        assert_eq!(subject_window(40, 18, 19), Some(18..=19));
    }

    #[test]
    fn rows_right_justify_line_numbers() {
        assert_eq!(render_row(9, "x", false), "    9|x");
        assert_eq!(render_row(13, "x", true), ">  13|x");
        assert_eq!(render_row(1234, "x", false), "  1234|x");
    }

    #[test]
    fn subject_block_shows_window() {
        let mut reader = MockSourceReader::new();
        reader
            .expect_read_lines()
            .returning(|_| Ok(numbered("line", 19)));

        let renderer = FailureContextRenderer::new(reader, "/tmp/tests");
        let chain = FrameChain::new(vec![StackFrame::new("/tmp/tests/scenarios/a.py", 2, 4)]);
        let context = renderer.render(&chain, Path::new("scenarios/a.py")).unwrap();

        assert_eq!(
            context.to_text(),
            [
                "# /tmp/tests/scenarios/a.py:",
                "    1|line 1",
                "    2|line 2",
                "    3|line 3",
                ">   4|line 4",
                "    5|line 5",
                "    6|line 6",
                "    7|line 7",
            ]
            .join("\n")
        );
        assert_eq!(context.blocks()[0].role, FrameRole::Subject);
    }

    #[test]
    fn unreadable_source_renders_placeholder() {
        let mut reader = MockSourceReader::new();
        reader.expect_read_lines().returning(|path| {
            if path.ends_with("gone.py") {
                Err(SourceUnavailable::new(
                    path,
                    io::Error::new(io::ErrorKind::NotFound, "missing"),
                ))
            } else {
                Ok(numbered("line", 10))
            }
        });

        let renderer = FailureContextRenderer::new(reader, "/p");
        let chain = FrameChain::new(vec![
            StackFrame::new("/p/helpers/gone.py", 1, 3),
            StackFrame::new("/p/scenarios/a.py", 4, 5),
        ]);
        let context = renderer.render(&chain, Path::new("scenarios/a.py")).unwrap();

        let placeholder = &context.blocks()[0];
        assert_eq!(placeholder.role, FrameRole::Unavailable);
        assert_eq!(placeholder.text.lines().count(), 2);
        assert!(placeholder.text.starts_with("# /p/helpers/gone.py:\n"));
        assert!(placeholder.text.contains("source unavailable"));
        assert_eq!(context.blocks()[1].role, FrameRole::Subject);
    }

    #[test]
    fn context_frame_out_of_range_renders_header_only() {
        let mut reader = MockSourceReader::new();
        reader.expect_read_lines().returning(|_| Ok(numbered("line", 3)));

        let renderer = FailureContextRenderer::new(reader, "/p");
        let chain = FrameChain::new(vec![
            StackFrame::new("/p/helpers/short.py", 1, 40),
            StackFrame::new("/p/scenarios/a.py", 1, 2),
        ]);
        let context = renderer.render(&chain, Path::new("scenarios/a.py")).unwrap();

        assert_eq!(context.blocks()[0].text, "# /p/helpers/short.py:");
    }

    #[test]
    fn each_frame_reads_its_own_file_once() {
        let mut reader = MockSourceReader::new();
        reader
            .expect_read_lines()
            .times(2)
            .returning(|_| Ok(numbered("line", 5)));

        let renderer = FailureContextRenderer::new(reader, "/p");
        let chain = FrameChain::new(vec![
            StackFrame::new("/p/a.py", 1, 2),
            StackFrame::new("/p/b.py", 1, 2),
        ]);
        let _ = renderer.render(&chain, Path::new("a.py")).unwrap();
    }
}
