//! Error types for parsing and rendering pages.

use std::fmt;

use crate::links::UnresolvedReference;

/// Position of a block in a document, used in error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Locator {
    /// Index of the block in [`Document::blocks`](crate::Document::blocks).
    pub block: usize,
    /// Source line of the block (1-indexed), if the document was parsed.
    pub line: Option<usize>,
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "block {} (line {line})", self.block),
            None => write!(f, "block {}", self.block),
        }
    }
}

/// Error raised while turning a page source into HTML.
///
/// Every variant is fatal for the document it occurred in and has no effect
/// on other documents.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Malformed block structure in the source.
    #[error("line {line}: {message}")]
    Parse {
        /// Offending line (1-indexed).
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// A link target that cannot be turned into a URL.
    #[error("{at}: {source}")]
    UnresolvedReference {
        /// Block containing the reference.
        at: Locator,
        /// Resolver failure.
        source: UnresolvedReference,
    },
    /// A reference-style link without a matching definition.
    #[error("{at}: no definition for reference link [{label}]")]
    DanglingReference {
        /// Block containing the link.
        at: Locator,
        /// The label as written.
        label: String,
    },
    /// A heading block whose level is outside `1..=6`.
    #[error("{at}: heading level must be between 1 and 6, got {level}")]
    InvalidHeadingLevel {
        /// Offending heading block.
        at: Locator,
        /// Level as given.
        level: u8,
    },
}

impl RenderError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
