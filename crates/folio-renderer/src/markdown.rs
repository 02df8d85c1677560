//! Markdown inliner for prose blocks.
//!
//! Renders pulldown-cmark events to HTML fragments. Link and image
//! destinations go through the [`LinkResolver`], and reference-style links
//! may use definitions from anywhere in the same document.

use std::collections::HashMap;
use std::fmt::Write;

use pulldown_cmark::{
    BlockQuoteKind, BrokenLink, BrokenLinkCallback, CowStr, Event, HeadingLevel,
    LinkType, Options, Parser, Tag, TagEnd,
};

use crate::document::{Block, Document};
use crate::error::{Locator, RenderError};
use crate::links::{LinkResolver, UnresolvedReference};
use crate::state::{
    CodeBlockState, HeadingState, ImageState, Outline, TableState, TocEntry, escape_html,
};

/// Parser options for prose blocks.
fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
}

/// Error raised while rendering a single prose block.
#[derive(Debug, thiserror::Error)]
pub enum InlineError {
    /// A link or image destination could not be resolved.
    #[error(transparent)]
    Unresolved(#[from] UnresolvedReference),
    /// A reference-style link whose label has no definition.
    #[error("no definition for reference link [{0}]")]
    Dangling(String),
}

impl InlineError {
    /// Attach the position of the failing block.
    #[must_use]
    pub fn at(self, at: Locator) -> RenderError {
        match self {
            Self::Unresolved(source) => RenderError::UnresolvedReference { at, source },
            Self::Dangling(label) => RenderError::DanglingReference { at, label },
        }
    }
}

/// Reference-style link definitions collected from a whole document.
///
/// Labels match case-insensitively with internal whitespace collapsed, as in
/// CommonMark. When a label is defined twice, the first definition wins.
#[derive(Debug, Default)]
pub struct LinkDefinitions {
    urls: HashMap<String, String>,
}

impl LinkDefinitions {
    /// Collect definitions from `::link` blocks and `[label]: url` lines in
    /// prose blocks, resolving each destination.
    pub fn collect(document: &Document, resolver: &LinkResolver) -> Result<Self, RenderError> {
        let mut definitions = Self::default();

        for (index, block) in document.blocks.iter().enumerate() {
            let at = Locator {
                block: index,
                line: document.line_of(index),
            };
            match block {
                Block::LinkDefinition { id, target } => {
                    let url = resolver
                        .resolve_target(target)
                        .map_err(|source| RenderError::UnresolvedReference { at, source })?;
                    definitions.insert(id, url.into_owned());
                }
                Block::Prose { markdown } => {
                    let parser = Parser::new_ext(markdown, parser_options());
                    for (label, def) in parser.reference_definitions().iter() {
                        let url = resolver
                            .resolve_destination(&def.dest)
                            .map_err(|source| RenderError::UnresolvedReference { at, source })?;
                        definitions.insert(label, url.into_owned());
                    }
                }
                Block::Heading { .. } | Block::CodeExample { .. } => {}
            }
        }

        Ok(definitions)
    }

    /// Add a definition unless the label is already defined.
    pub fn insert(&mut self, label: &str, url: String) {
        self.urls.entry(normalize_label(label)).or_insert(url);
    }

    /// Look up the URL for a label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.urls.get(&normalize_label(label)).map(String::as_str)
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Whether no labels are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

fn normalize_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Resolves reference links that pulldown-cmark could not match within a
/// single block, recording labels that have no definition anywhere.
struct DefinitionLookup<'d> {
    definitions: &'d LinkDefinitions,
    dangling: &'d mut Vec<String>,
}

impl<'input> BrokenLinkCallback<'input> for DefinitionLookup<'_> {
    fn handle_broken_link(
        &mut self,
        link: BrokenLink<'input>,
    ) -> Option<(CowStr<'input>, CowStr<'input>)> {
        if let Some(url) = self.definitions.get(&link.reference) {
            Some((CowStr::from(url.to_owned()), CowStr::Borrowed("")))
        } else {
            self.dangling.push(link.reference.to_string());
            None
        }
    }
}

/// Renders markdown prose blocks to HTML fragments.
///
/// One inliner renders all text on a page so that heading ids are unique
/// across blocks. Headings it has seen are available from
/// [`into_toc`](Self::into_toc) afterwards.
pub struct MarkdownInliner<'a> {
    resolver: &'a LinkResolver,
    definitions: &'a LinkDefinitions,
    outline: Outline,
}

impl<'a> MarkdownInliner<'a> {
    /// Create an inliner for one page.
    #[must_use]
    pub fn new(resolver: &'a LinkResolver, definitions: &'a LinkDefinitions) -> Self {
        Self {
            resolver,
            definitions,
            outline: Outline::default(),
        }
    }

    /// Render one prose block to an HTML fragment.
    pub fn render(&mut self, markdown: &str) -> Result<String, InlineError> {
        let mut dangling = Vec::new();
        let lookup = DefinitionLookup {
            definitions: self.definitions,
            dangling: &mut dangling,
        };
        let parser =
            Parser::new_with_broken_link_callback(markdown, parser_options(), Some(lookup));

        let mut writer = EventWriter::new(self.resolver, self.definitions, &mut self.outline);
        for event in parser {
            writer.process_event(event)?;
        }

        if let Some(label) = dangling.into_iter().next() {
            return Err(InlineError::Dangling(label));
        }
        Ok(writer.finish())
    }

    /// Render a plain-text heading with a unique anchor id.
    pub fn heading(&mut self, level: u8, text: &str) -> String {
        let id = self.outline.add_heading(level, text);
        format!(r#"<h{level} id="{id}">{}</h{level}>"#, escape_html(text.trim()))
    }

    /// Headings rendered so far, in page order.
    #[must_use]
    pub fn into_toc(self) -> Vec<TocEntry> {
        self.outline.into_toc()
    }
}

/// Event-to-HTML writer for a single prose block.
struct EventWriter<'a> {
    output: String,
    resolver: &'a LinkResolver,
    /// Page-wide definitions; they take precedence over same-block ones.
    definitions: &'a LinkDefinitions,
    outline: &'a mut Outline,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    /// Stack of alert kinds for nested blockquotes (regular blockquote uses None).
    alert_stack: Vec<Option<BlockQuoteKind>>,
}

impl<'a> EventWriter<'a> {
    fn new(
        resolver: &'a LinkResolver,
        definitions: &'a LinkDefinitions,
        outline: &'a mut Outline,
    ) -> Self {
        Self {
            output: String::with_capacity(1024),
            resolver,
            definitions,
            outline,
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            alert_stack: Vec::new(),
        }
    }

    fn finish(self) -> String {
        self.output
    }

    /// Push content to output or heading buffer based on context.
    ///
    /// Markup inside image alt text is dropped; only its text is kept.
    fn push_inline(&mut self, content: &str) {
        if self.image.is_active() {
            return;
        }
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn process_event(&mut self, event: Event<'_>) -> Result<(), InlineError> {
        match event {
            Event::Start(tag) => self.start_tag(tag)?,
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.push_inline(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.push_inline("<br>"),
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(checked) => {
                self.output.push_str(if checked {
                    r#"<input type="checkbox" checked disabled> "#
                } else {
                    r#"<input type="checkbox" disabled> "#
                });
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
        Ok(())
    }

    fn start_tag(&mut self, tag: Tag<'_>) -> Result<(), InlineError> {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => self.heading.start(heading_level_to_num(level)),
            Tag::BlockQuote(kind) => {
                match &kind {
                    Some(kind) => {
                        let (class, title) = alert_labels(kind);
                        write!(
                            self.output,
                            r#"<div class="alert alert-{class}"><div class="alert-title">{title}</div><div class="alert-content">"#
                        )
                        .unwrap();
                    }
                    None => self.output.push_str("<blockquote>"),
                }
                self.alert_stack.push(kind);
            }
            Tag::CodeBlock(kind) => self.code.open(&kind),
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.open(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.open_row(true);
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.open_row(false);
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let cell = self.table.open_cell();
                self.output.push_str(&cell);
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            } => {
                let href = self.destination(link_type, &dest_url, &id)?;
                let mut link_tag = format!(r#"<a href="{}""#, escape_html(&href));
                if !title.is_empty() {
                    write!(link_tag, r#" title="{}""#, escape_html(&title)).unwrap();
                }
                link_tag.push('>');
                self.push_inline(&link_tag);
            }
            Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            } => {
                let src = self.destination(link_type, &dest_url, &id)?;
                self.image.start(src, title.to_string());
            }
        }
        Ok(())
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => {
                if let Some((level, text, html)) = self.heading.end() {
                    let id = self.outline.add_heading(level, &text);
                    write!(
                        self.output,
                        r#"<h{level} id="{id}">{}</h{level}>"#,
                        html.trim()
                    )
                    .unwrap();
                }
            }
            TagEnd::BlockQuote(_) => match self.alert_stack.pop() {
                Some(Some(_)) => self.output.push_str("</div></div>"),
                _ => self.output.push_str("</blockquote>"),
            },
            TagEnd::CodeBlock => {
                let pre = self.code.close();
                self.output.push_str(&pre);
            }
            TagEnd::List(ordered) => {
                self.output.push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.close_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                let close = self.table.close_cell();
                self.output.push_str(close);
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Image => {
                if let Some((src, title, alt)) = self.image.end() {
                    let title_attr = if title.is_empty() {
                        String::new()
                    } else {
                        format!(r#" title="{}""#, escape_html(&title))
                    };
                    let img = format!(
                        r#"<img src="{}"{title_attr} alt="{}">"#,
                        escape_html(&src),
                        escape_html(&alt)
                    );
                    self.push_inline(&img);
                }
            }
        }
    }

    /// Final URL for a link or image destination.
    ///
    /// Reference-style links use the page-wide definition for their label
    /// when there is one, so the first definition on the page wins even if
    /// the same block redefines the label.
    fn destination(&self, link_type: LinkType, dest: &str, id: &str) -> Result<String, InlineError> {
        match link_type {
            LinkType::Email if !dest.starts_with("mailto:") => Ok(format!("mailto:{dest}")),
            LinkType::Reference | LinkType::Collapsed | LinkType::Shortcut => {
                match self.definitions.get(id) {
                    Some(url) => Ok(url.to_owned()),
                    None => Ok(self.resolver.resolve_destination(dest)?.into_owned()),
                }
            }
            _ => Ok(self.resolver.resolve_destination(dest)?.into_owned()),
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        let html = format!("<code>{}</code>", escape_html(code));
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        self.push_inline(&html);
    }

    fn soft_break(&mut self) {
        if self.image.is_active() {
            self.image.push_str(" ");
        } else if self.heading.is_active() {
            self.heading.push_text(" ");
            self.heading.push_html("\n");
        } else {
            self.output.push('\n');
        }
    }
}

/// Convert heading level enum to number (1-6).
fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn alert_labels(kind: &BlockQuoteKind) -> (&'static str, &'static str) {
    match kind {
        BlockQuoteKind::Note => ("note", "Note"),
        BlockQuoteKind::Tip => ("tip", "Tip"),
        BlockQuoteKind::Important => ("important", "Important"),
        BlockQuoteKind::Warning => ("warning", "Warning"),
        BlockQuoteKind::Caution => ("caution", "Caution"),
    }
}
