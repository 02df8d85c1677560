//! State tracked while rendering a page.
//!
//! [`Outline`] lives for a whole page so heading ids stay unique across
//! blocks; the other structs track context inside a single prose block.

use std::collections::{HashMap, HashSet};

use pulldown_cmark::{Alignment, CodeBlockKind};

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// Headings seen so far on a page.
#[derive(Debug, Default)]
pub(crate) struct Outline {
    toc: Vec<TocEntry>,
    /// Next suffix to try for each base slug.
    next_suffix: HashMap<String, usize>,
    /// Every id handed out so far.
    issued: HashSet<String>,
}

impl Outline {
    /// Record a heading and return its unique anchor id.
    pub fn add_heading(&mut self, level: u8, text: &str) -> String {
        let id = self.generate_id(text);
        self.toc.push(TocEntry {
            level,
            title: text.trim().to_owned(),
            id: id.clone(),
        });
        id
    }

    pub fn into_toc(self) -> Vec<TocEntry> {
        self.toc
    }

    fn generate_id(&mut self, text: &str) -> String {
        let mut base_id = slugify(text);
        if base_id.is_empty() {
            base_id.push_str("section");
        }
        // A suffixed id may already belong to a heading such as "Setup 1".
        let suffix = self.next_suffix.entry(base_id.clone()).or_default();
        let mut id = base_id.clone();
        if *suffix > 0 || self.issued.contains(&id) {
            loop {
                *suffix = (*suffix).max(1);
                id = format!("{base_id}-{suffix}");
                *suffix += 1;
                if !self.issued.contains(&id) {
                    break;
                }
            }
        } else {
            *suffix = 1;
        }
        self.issued.insert(id.clone());
        id
    }
}

/// State for a heading being captured inside a prose block.
#[derive(Default)]
pub(crate) struct HeadingState {
    level: Option<u8>,
    /// Plain text, used for the slug and the table of contents.
    text: String,
    /// Rendered inline HTML.
    html: String,
}

impl HeadingState {
    pub fn start(&mut self, level: u8) {
        self.level = Some(level);
        self.text.clear();
        self.html.clear();
    }

    pub fn is_active(&self) -> bool {
        self.level.is_some()
    }

    /// Finish the heading, returning (level, text, html).
    pub fn end(&mut self) -> Option<(u8, String, String)> {
        let level = self.level.take()?;
        Some((
            level,
            std::mem::take(&mut self.text),
            std::mem::take(&mut self.html),
        ))
    }

    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }
}

/// Fenced or indented code inside a prose block.
///
/// Code is collected verbatim and escaped once the block closes. The
/// language is the first word of a fence's info string, with any `{` or
/// `.` prefix dropped.
#[derive(Default)]
pub(crate) struct CodeBlockState {
    language: Option<String>,
    buffer: Option<String>,
}

impl CodeBlockState {
    pub fn open(&mut self, kind: &CodeBlockKind<'_>) {
        self.language = match kind {
            CodeBlockKind::Fenced(info) => info
                .split_whitespace()
                .next()
                .map(|word| word.trim_start_matches('{').trim_start_matches('.'))
                .filter(|lang| !lang.is_empty())
                .map(str::to_owned),
            CodeBlockKind::Indented => None,
        };
        self.buffer = Some(String::new());
    }

    pub fn is_active(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn push_str(&mut self, text: &str) {
        if let Some(buffer) = &mut self.buffer {
            buffer.push_str(text);
        }
    }

    /// Close the block and return its `<pre>` markup.
    pub fn close(&mut self) -> String {
        let code = escape_html(&self.buffer.take().unwrap_or_default());
        match self.language.take() {
            Some(lang) => format!(
                r#"<pre><code class="language-{}">{code}</code></pre>"#,
                escape_html(&lang)
            ),
            None => format!("<pre><code>{code}</code></pre>"),
        }
    }
}

/// Position inside a GFM table.
#[derive(Default)]
pub(crate) struct TableState {
    alignments: Vec<Alignment>,
    in_head: bool,
    column: usize,
}

impl TableState {
    pub fn open(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.column = 0;
    }

    /// Start a row; `head` marks the header row.
    pub fn open_row(&mut self, head: bool) {
        self.in_head = head;
        self.column = 0;
    }

    pub fn close_head(&mut self) {
        self.in_head = false;
    }

    /// Opening tag for the next cell, aligned per its column.
    pub fn open_cell(&self) -> String {
        let tag = self.cell_tag();
        match self.alignments.get(self.column) {
            Some(Alignment::Left) => format!(r#"<{tag} style="text-align:left">"#),
            Some(Alignment::Center) => format!(r#"<{tag} style="text-align:center">"#),
            Some(Alignment::Right) => format!(r#"<{tag} style="text-align:right">"#),
            Some(Alignment::None) | None => format!("<{tag}>"),
        }
    }

    pub fn close_cell(&mut self) -> &'static str {
        self.column += 1;
        if self.in_head { "</th>" } else { "</td>" }
    }

    fn cell_tag(&self) -> &'static str {
        if self.in_head { "th" } else { "td" }
    }
}

/// State for tracking image alt text capture.
#[derive(Default)]
pub(crate) struct ImageState {
    /// Pending (src, title) while alt text is collected.
    pending: Option<(String, String)>,
    alt_text: String,
}

impl ImageState {
    pub fn start(&mut self, src: String, title: String) {
        self.pending = Some((src, title));
        self.alt_text.clear();
    }

    /// Finish the image, returning (src, title, alt).
    pub fn end(&mut self) -> Option<(String, String, String)> {
        let (src, title) = self.pending.take()?;
        Some((src, title, std::mem::take(&mut self.alt_text)))
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    pub fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// Convert text to URL-safe slug.
///
/// Converts to lowercase, replaces whitespace/dashes/underscores with single dashes,
/// and removes other non-alphanumeric characters.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Escape HTML special characters.
///
/// # Example
///
/// ```
/// use folio_renderer::escape_html;
///
/// assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
/// ```
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
