//! Renderer for tutorial-style guide pages.
//!
//! A guide page is a title plus an ordered list of blocks: headings, markdown
//! prose, code examples and named link definitions. This crate provides the
//! content model ([`Document`], [`Block`]), a parser for the directive-based
//! source format ([`parse_document`]), symbolic link resolution
//! ([`LinkResolver`]), markdown inlining ([`MarkdownInliner`]) and page
//! composition ([`PageRenderer`]).
//!
//! # Architecture
//!
//! Rendering is a pure function of the document and the renderer settings:
//! - Link definitions from every block are collected up front, so prose may
//!   use a reference link defined later on the page
//! - Prose is rendered with pulldown-cmark; link destinations written as
//!   `example_file(...)` or `repo_url(...)` are resolved through the
//!   [`LinkResolver`]
//! - Any link that cannot be resolved fails the page with a [`RenderError`]
//!   carrying the block position
//!
//! # Example
//!
//! ```
//! use folio_renderer::{LinkConfig, LinkResolver, PageRenderer};
//!
//! let source = "\
//! ::title[All About Inserts]
//!
//! See [the schema](example_file(inserts/src/schema.rs)).
//! ";
//!
//! let resolver = LinkResolver::new(LinkConfig {
//!     example_base_url: Some("https://github.com/org/repo/tree/main/examples".to_owned()),
//!     repo_base_url: None,
//! });
//! let page = PageRenderer::new(resolver).render_source(source).unwrap();
//! assert!(page.html.contains(
//!     r#"<a href="https://github.com/org/repo/tree/main/examples/inserts/src/schema.rs">"#
//! ));
//! ```

pub mod directive;
mod document;
mod error;
mod links;
mod markdown;
mod page;
mod parser;
mod state;

pub use document::{Block, Document, InvalidReference, LineRange, LinkKind, LinkReference, LinkTarget};
pub use error::{Locator, RenderError};
pub use links::{LinkConfig, LinkResolver, UnresolvedReference};
pub use markdown::{InlineError, LinkDefinitions, MarkdownInliner};
pub use page::{PageOptions, PageRenderer, RenderedPage};
pub use parser::parse_document;
pub use state::{TocEntry, escape_html, slugify};
