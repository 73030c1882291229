//! Failure context rendering
//!
//! Turns the call chain captured at the point of a test failure into a
//! readable, multi-frame report:
//! - Frames are owned, immutable records ordered outermost to innermost
//! - One frame (the "subject") belongs to the failing scenario's own source
//!   and is rendered with surrounding lines
//! - Every other frame is rendered with only its failing line
//!
//! # Example
//!
//! ```rust,ignore
//! use flake_context::{FailureContextRenderer, FrameChain, FsSourceReader, StackFrame};
//!
//! let chain = FrameChain::new(vec![
//!     StackFrame::new("/srv/tests/scenarios/login.py", 10, 13),
//!     StackFrame::new("/srv/tests/helpers/http.py", 2, 6),
//! ]);
//!
//! let renderer = FailureContextRenderer::new(FsSourceReader, "/srv/tests");
//! let context = renderer.render(&chain, "scenarios/login.py".as_ref())?;
//! println!("{context}");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod classify;
pub mod error;
pub mod frame;
pub mod render;
pub mod source;

pub use classify::FrameClassifier;
pub use error::{ContextError, SourceUnavailable};
pub use frame::{FrameChain, StackFrame};
pub use render::{subject_window, FailureContext, FailureContextRenderer, FrameRole, RenderedBlock};
pub use source::{FsSourceReader, SourceReader};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
