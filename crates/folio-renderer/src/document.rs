//! Content model for guide pages.
//!
//! A [`Document`] is a flat, ordered list of [`Block`]s. Block nesting in the
//! source format is one level deep, so no tree is needed: the position of a
//! block in [`Document::blocks`] is its reading order.

use std::fmt;

/// A parsed guide page.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Document {
    /// Page title, shown in the banner and `<title>`.
    pub title: String,
    /// Blocks in reading order.
    pub blocks: Vec<Block>,
    /// Source line (1-indexed) of each block. Empty for documents built in code.
    #[cfg_attr(feature = "serde", serde(skip))]
    lines: Vec<usize>,
}

impl Document {
    /// Create a document without source line information.
    #[must_use]
    pub fn new(title: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            title: title.into(),
            blocks,
            lines: Vec::new(),
        }
    }

    /// Create a document that remembers where each block started.
    pub(crate) fn with_lines(title: String, blocks: Vec<Block>, lines: Vec<usize>) -> Self {
        debug_assert_eq!(blocks.len(), lines.len());
        Self {
            title,
            blocks,
            lines,
        }
    }

    /// Source line of the block at `index`, if known.
    #[must_use]
    pub fn line_of(&self, index: usize) -> Option<usize> {
        self.lines.get(index).copied()
    }
}

/// One structural unit of a page.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Block {
    /// Section heading rendered as `<hN>`.
    Heading {
        /// Heading level (1-6).
        level: u8,
        /// Plain heading text.
        text: String,
    },
    /// Markdown-flavored narrative text.
    Prose {
        /// Raw markdown source.
        markdown: String,
    },
    /// Illustrative code shown in a framed panel.
    ///
    /// The code is opaque text: it is escaped for display and never parsed.
    CodeExample {
        /// Caption shown above the code (may be empty).
        label: String,
        /// Where the full source lives, rendered as a "View source" link.
        source: Option<LinkTarget>,
        /// Language tag kept for downstream highlighting.
        language: String,
        /// Code text, verbatim.
        code: String,
    },
    /// Reference-style link definition usable from any prose block.
    LinkDefinition {
        /// Link label.
        id: String,
        /// Link destination.
        target: LinkTarget,
    },
}

/// Destination of a link: either a literal URL or a symbolic reference.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LinkTarget {
    /// URL used as written.
    Url(String),
    /// Reference resolved against configured base URLs.
    Reference(LinkReference),
}

impl LinkTarget {
    /// Parse a destination string.
    ///
    /// Strings shaped like `example_file(...)` or `repo_url(...)` become
    /// [`LinkTarget::Reference`]; everything else is a literal URL.
    ///
    /// # Example
    ///
    /// ```
    /// use folio_renderer::{LinkKind, LinkTarget};
    ///
    /// let target = LinkTarget::parse("example_file(inserts/src/lib.rs, 3, 9)").unwrap();
    /// let LinkTarget::Reference(reference) = target else { panic!() };
    /// assert_eq!(reference.kind, LinkKind::ExampleFile);
    /// assert_eq!(reference.path, "inserts/src/lib.rs");
    ///
    /// assert!(matches!(LinkTarget::parse("https://example.com"), Ok(LinkTarget::Url(_))));
    /// ```
    pub fn parse(raw: &str) -> Result<Self, InvalidReference> {
        let trimmed = raw.trim();
        for kind in [LinkKind::ExampleFile, LinkKind::RepoUrl] {
            if let Some(rest) = trimmed.strip_prefix(kind.function_name())
                && let Some(inner) = rest.strip_prefix('(')
            {
                let inner = inner
                    .strip_suffix(')')
                    .ok_or_else(|| InvalidReference::new(trimmed, "missing closing parenthesis"))?;
                return LinkReference::from_arguments(kind, inner, trimmed).map(Self::Reference);
            }
        }
        Ok(Self::Url(trimmed.to_owned()))
    }
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Reference(reference) => reference.fmt(f),
        }
    }
}

/// Kind of symbolic link reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LinkKind {
    /// A file in the examples tree: `example_file(path[, start[, end]])`.
    ExampleFile,
    /// A file in the source repository: `repo_url(path)`.
    RepoUrl,
}

impl LinkKind {
    /// Name of the call in the source format.
    #[must_use]
    pub fn function_name(self) -> &'static str {
        match self {
            Self::ExampleFile => "example_file",
            Self::RepoUrl => "repo_url",
        }
    }
}

/// Inclusive line range, rendered as a `#L<start>-L<end>` fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LineRange {
    /// First line (1-indexed).
    pub start: u32,
    /// Last line, if the range spans more than a single anchor.
    pub end: Option<u32>,
}

impl LineRange {
    /// URL fragment for this range, including the leading `#`.
    #[must_use]
    pub fn fragment(&self) -> String {
        match self.end {
            Some(end) => format!("#L{}-L{end}", self.start),
            None => format!("#L{}", self.start),
        }
    }
}

/// A symbolic pointer to an external resource, resolved at render time.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LinkReference {
    /// Which base URL the path is relative to.
    pub kind: LinkKind,
    /// Path below the base URL.
    pub path: String,
    /// Optional line range (example files only).
    pub lines: Option<LineRange>,
}

impl LinkReference {
    /// Reference to a file in the examples tree.
    #[must_use]
    pub fn example_file(path: impl Into<String>) -> Self {
        Self {
            kind: LinkKind::ExampleFile,
            path: path.into(),
            lines: None,
        }
    }

    /// Reference to a file in the source repository.
    #[must_use]
    pub fn repo_url(path: impl Into<String>) -> Self {
        Self {
            kind: LinkKind::RepoUrl,
            path: path.into(),
            lines: None,
        }
    }

    /// Attach a line range.
    #[must_use]
    pub fn with_lines(mut self, start: u32, end: Option<u32>) -> Self {
        self.lines = Some(LineRange { start, end });
        self
    }

    fn from_arguments(kind: LinkKind, inner: &str, raw: &str) -> Result<Self, InvalidReference> {
        let mut parts = inner.split(',').map(str::trim);
        let path = unquote(parts.next().unwrap_or_default()).to_owned();
        let start = parts.next().map(|s| parse_line_number(s, raw)).transpose()?;
        let end = parts.next().map(|s| parse_line_number(s, raw)).transpose()?;

        if parts.next().is_some() {
            return Err(InvalidReference::new(raw, "too many arguments"));
        }

        let lines = match (start, end) {
            (None, _) => None,
            (Some(start), Some(end)) if end < start => {
                return Err(InvalidReference::new(raw, "line range ends before it starts"));
            }
            (Some(start), end) => Some(LineRange { start, end }),
        };

        if lines.is_some() && kind == LinkKind::RepoUrl {
            return Err(InvalidReference::new(raw, "repo_url takes a single path argument"));
        }

        Ok(Self { kind, path, lines })
    }
}

impl fmt::Display for LinkReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}", self.kind.function_name(), self.path)?;
        if let Some(range) = self.lines {
            write!(f, ", {}", range.start)?;
            if let Some(end) = range.end {
                write!(f, ", {end}")?;
            }
        }
        f.write_str(")")
    }
}

/// A reference call that could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid link reference `{raw}`: {reason}")]
pub struct InvalidReference {
    /// The reference text as written.
    pub raw: String,
    /// What is wrong with it.
    pub reason: String,
}

impl InvalidReference {
    fn new(raw: &str, reason: &str) -> Self {
        Self {
            raw: raw.to_owned(),
            reason: reason.to_owned(),
        }
    }
}

fn parse_line_number(s: &str, raw: &str) -> Result<u32, InvalidReference> {
    match s.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(InvalidReference::new(
            raw,
            &format!("`{s}` is not a line number"),
        )),
    }
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}
