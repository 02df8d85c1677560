//! Page renderer.
//!
//! Composes a banner derived from the page title with the rendered blocks
//! into a standalone HTML document. Output depends only on the document
//! and the renderer settings, so rendering is byte-for-byte reproducible.

use std::fmt::Write;

use crate::document::{Block, Document, LinkTarget};
use crate::error::{Locator, RenderError};
use crate::links::LinkResolver;
use crate::markdown::{LinkDefinitions, MarkdownInliner};
use crate::parser::parse_document;
use crate::state::{TocEntry, escape_html};

/// Presentation settings shared by every page of a site.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageOptions {
    /// Site name shown above the page title in the banner.
    pub site_name: Option<String>,
    /// Stylesheet URL linked from `<head>`.
    pub stylesheet: Option<String>,
    /// Whether to emit a table of contents before the content.
    pub toc: bool,
}

/// A rendered HTML page.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RenderedPage {
    /// Complete HTML document.
    pub html: String,
    /// Headings on the page, in order.
    pub toc: Vec<TocEntry>,
}

/// Renders [`Document`]s into HTML pages.
///
/// # Example
///
/// ```
/// use folio_renderer::{Block, Document, LinkResolver, PageRenderer};
///
/// let document = Document::new(
///     "T",
///     vec![
///         Block::Heading { level: 2, text: "T".to_owned() },
///         Block::Prose { markdown: "see [x](http://e)".to_owned() },
///         Block::CodeExample {
///             label: "Ex".to_owned(),
///             source: None,
///             language: "rust".to_owned(),
///             code: "a<b".to_owned(),
///         },
///     ],
/// );
///
/// let page = PageRenderer::new(LinkResolver::default()).render(&document).unwrap();
/// assert!(page.html.contains(r#"<h1 class="banner-title">T</h1>"#));
/// assert!(page.html.contains(r#"<a href="http://e">x</a>"#));
/// assert!(page.html.contains("a&lt;b"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct PageRenderer {
    resolver: LinkResolver,
    options: PageOptions,
}

impl PageRenderer {
    /// Create a renderer with default presentation settings.
    #[must_use]
    pub fn new(resolver: LinkResolver) -> Self {
        Self {
            resolver,
            options: PageOptions::default(),
        }
    }

    /// Set presentation settings.
    #[must_use]
    pub fn with_options(mut self, options: PageOptions) -> Self {
        self.options = options;
        self
    }

    /// Link resolver used for this renderer.
    #[must_use]
    pub fn resolver(&self) -> &LinkResolver {
        &self.resolver
    }

    /// Parse and render page source in one step.
    pub fn render_source(&self, source: &str) -> Result<RenderedPage, RenderError> {
        let document = parse_document(source)?;
        self.render(&document)
    }

    /// Render a document into a complete HTML page.
    pub fn render(&self, document: &Document) -> Result<RenderedPage, RenderError> {
        let definitions = LinkDefinitions::collect(document, &self.resolver)?;
        let mut inliner = MarkdownInliner::new(&self.resolver, &definitions);

        let mut content = String::with_capacity(4096);
        for (index, block) in document.blocks.iter().enumerate() {
            let at = Locator {
                block: index,
                line: document.line_of(index),
            };
            match block {
                Block::Heading { level, text } => {
                    if !(1..=6).contains(level) {
                        return Err(RenderError::InvalidHeadingLevel { at, level: *level });
                    }
                    content.push_str(&inliner.heading(*level, text));
                }
                Block::Prose { markdown } => {
                    let html = inliner.render(markdown).map_err(|e| e.at(at))?;
                    content.push_str(&html);
                }
                Block::CodeExample {
                    label,
                    source,
                    language,
                    code,
                } => {
                    let source_url = source
                        .as_ref()
                        .map(|target| self.source_url(target, at))
                        .transpose()?;
                    render_code_example(
                        &mut content,
                        label,
                        source_url.as_deref(),
                        language,
                        code,
                    );
                }
                // Definitions only feed the inliner.
                Block::LinkDefinition { .. } => continue,
            }
            content.push('\n');
        }

        let toc = inliner.into_toc();
        let html = self.render_layout(&document.title, &toc, &content);

        tracing::debug!(
            title = %document.title,
            blocks = document.blocks.len(),
            bytes = html.len(),
            "Rendered page"
        );

        Ok(RenderedPage { html, toc })
    }

    fn source_url(&self, target: &LinkTarget, at: Locator) -> Result<String, RenderError> {
        self.resolver
            .resolve_target(target)
            .map(std::borrow::Cow::into_owned)
            .map_err(|source| RenderError::UnresolvedReference { at, source })
    }

    fn render_layout(&self, title: &str, toc: &[TocEntry], content: &str) -> String {
        let mut html = String::with_capacity(content.len() + 1024);
        let title = escape_html(title);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("<meta charset=\"utf-8\">\n");
        html.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        );
        match &self.options.site_name {
            Some(site) => {
                writeln!(html, "<title>{title} - {}</title>", escape_html(site)).unwrap();
            }
            None => {
                writeln!(html, "<title>{title}</title>").unwrap();
            }
        }
        if let Some(stylesheet) = &self.options.stylesheet {
            writeln!(
                html,
                "<link rel=\"stylesheet\" href=\"{}\">",
                escape_html(stylesheet)
            )
            .unwrap();
        }
        html.push_str("</head>\n<body>\n");

        // Banner
        html.push_str("<header class=\"banner\">\n<div class=\"banner-inner\">\n");
        if let Some(site) = &self.options.site_name {
            writeln!(html, "<p class=\"banner-site\">{}</p>", escape_html(site)).unwrap();
        }
        writeln!(html, "<h1 class=\"banner-title\">{title}</h1>").unwrap();
        html.push_str("</div>\n</header>\n");

        html.push_str("<main class=\"guide\">\n");
        if self.options.toc {
            render_toc(&mut html, toc);
        }
        html.push_str("<article class=\"guide-content\">\n");
        html.push_str(content);
        html.push_str("</article>\n</main>\n</body>\n</html>\n");
        html
    }
}

/// Render a code example as a framed panel.
fn render_code_example(
    out: &mut String,
    label: &str,
    source_url: Option<&str>,
    language: &str,
    code: &str,
) {
    let lang = escape_html(language);
    write!(out, r#"<figure class="code-example" data-lang="{lang}">"#).unwrap();

    if !label.is_empty() || source_url.is_some() {
        out.push_str(r#"<figcaption class="code-example-header">"#);
        if !label.is_empty() {
            write!(
                out,
                r#"<span class="code-example-label">{}</span>"#,
                escape_html(label)
            )
            .unwrap();
        }
        if let Some(url) = source_url {
            write!(
                out,
                r#"<a class="code-example-source" href="{}">View source</a>"#,
                escape_html(url)
            )
            .unwrap();
        }
        out.push_str("</figcaption>");
    }

    write!(
        out,
        r#"<pre><code class="language-{lang}">{}</code></pre></figure>"#,
        escape_html(code)
    )
    .unwrap();
}

/// Render the table of contents.
fn render_toc(html: &mut String, toc: &[TocEntry]) {
    if toc.is_empty() {
        return;
    }
    html.push_str("<nav class=\"toc\">\n");
    html.push_str("<p class=\"toc-title\">On this page</p>\n<ul>\n");
    for entry in toc {
        writeln!(
            html,
            "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a></li>",
            entry.level,
            entry.id,
            escape_html(&entry.title)
        )
        .unwrap();
    }
    html.push_str("</ul>\n</nav>\n");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::document::LinkReference;
    use crate::links::LinkConfig;

    fn renderer() -> PageRenderer {
        PageRenderer::new(LinkResolver::new(LinkConfig {
            example_base_url: Some("https://example.com/examples".to_owned()),
            repo_base_url: Some("https://example.com/repo".to_owned()),
        }))
    }

    fn code(label: &str, source: Option<LinkTarget>, code: &str) -> Block {
        Block::CodeExample {
            label: label.to_owned(),
            source,
            language: "rust".to_owned(),
            code: code.to_owned(),
        }
    }

    fn body(page: &RenderedPage) -> &str {
        let start = page.html.find("<article class=\"guide-content\">\n").unwrap();
        let end = page.html.find("</article>").unwrap();
        &page.html[start + "<article class=\"guide-content\">\n".len()..end]
    }

    #[test]
    fn test_layout() {
        let page = renderer().render(&Document::new("Guide", vec![])).unwrap();
        assert_eq!(
            page.html,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <title>Guide</title>\n</head>\n<body>\n\
             <header class=\"banner\">\n<div class=\"banner-inner\">\n\
             <h1 class=\"banner-title\">Guide</h1>\n</div>\n</header>\n\
             <main class=\"guide\">\n<article class=\"guide-content\">\n\
             </article>\n</main>\n</body>\n</html>\n"
        );
    }

    #[test]
    fn test_site_options() {
        let page = renderer()
            .with_options(PageOptions {
                site_name: Some("Diesel".to_owned()),
                stylesheet: Some("/assets/guide.css".to_owned()),
                toc: false,
            })
            .render(&Document::new("Inserts", vec![]))
            .unwrap();
        assert!(page.html.contains("<title>Inserts - Diesel</title>"));
        assert!(page.html.contains(r#"<link rel="stylesheet" href="/assets/guide.css">"#));
        assert!(page.html.contains(r#"<p class="banner-site">Diesel</p>"#));
    }

    #[test]
    fn test_heading_level_out_of_range() {
        for level in [0, 7] {
            let document = Document::new(
                "Levels",
                vec![
                    Block::Prose {
                        markdown: "Intro.".to_owned(),
                    },
                    Block::Heading {
                        level,
                        text: "Setup".to_owned(),
                    },
                ],
            );
            let err = renderer().render(&document).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("block 1: heading level must be between 1 and 6, got {level}")
            );
        }

        let document = Document::new(
            "Levels",
            vec![Block::Heading {
                level: 6,
                text: "Deep".to_owned(),
            }],
        );
        let page = renderer().render(&document).unwrap();
        assert_eq!(body(&page), "<h6 id=\"deep\">Deep</h6>\n");
    }

    #[test]
    fn test_title_is_escaped() {
        let page = renderer()
            .render(&Document::new("<Insert & Update>", vec![]))
            .unwrap();
        assert!(page.html.contains("&lt;Insert &amp; Update&gt;"));
        assert!(!page.html.contains("<Insert"));
    }

    #[test]
    fn test_code_example_panel() {
        let source = LinkTarget::Reference(
            LinkReference::example_file("inserts/src/lib.rs").with_lines(3, Some(9)),
        );
        let page = renderer()
            .render(&Document::new("T", vec![code("Insert", Some(source), "a < b && c > d")]))
            .unwrap();
        assert_eq!(
            body(&page),
            "<figure class=\"code-example\" data-lang=\"rust\">\
             <figcaption class=\"code-example-header\">\
             <span class=\"code-example-label\">Insert</span>\
             <a class=\"code-example-source\" href=\"https://example.com/examples/inserts/src/lib.rs#L3-L9\">View source</a>\
             </figcaption>\
             <pre><code class=\"language-rust\">a &lt; b &amp;&amp; c &gt; d</code></pre></figure>\n"
        );
    }

    #[test]
    fn test_code_example_without_caption() {
        let page = renderer()
            .render(&Document::new("T", vec![code("", None, "x")]))
            .unwrap();
        assert!(!page.html.contains("figcaption"));
    }

    #[test]
    fn test_code_example_unresolved_source() {
        let source = LinkTarget::Reference(LinkReference::example_file(""));
        let document = Document::new("T", vec![code("A", None, "x"), code("B", Some(source), "y")]);
        let err = renderer().render(&document).unwrap_err();
        assert!(matches!(
            err,
            RenderError::UnresolvedReference {
                at: Locator {
                    block: 1,
                    line: None
                },
                ..
            }
        ));
    }

    #[test]
    fn test_dangling_reference_is_located() {
        let document = Document::new(
            "T",
            vec![
                Block::Prose {
                    markdown: "fine".to_owned(),
                },
                Block::Prose {
                    markdown: "see [foo]".to_owned(),
                },
            ],
        );
        match renderer().render(&document).unwrap_err() {
            RenderError::DanglingReference { at, label } => {
                assert_eq!(at.block, 1);
                assert_eq!(label, "foo");
            }
            other => panic!("expected dangling reference, got {other:?}"),
        }
    }

    #[test]
    fn test_link_definition_block_used_by_earlier_prose() {
        let document = Document::new(
            "T",
            vec![
                Block::Prose {
                    markdown: "Derive [Insertable].".to_owned(),
                },
                Block::LinkDefinition {
                    id: "insertable".to_owned(),
                    target: LinkTarget::Reference(LinkReference::repo_url(
                        "diesel/src/insertable.rs",
                    )),
                },
            ],
        );
        let page = renderer().render(&document).unwrap();
        assert_eq!(
            body(&page),
            "<p>Derive <a href=\"https://example.com/repo/diesel/src/insertable.rs\">Insertable</a>.</p>\n"
        );
    }

    #[test]
    fn test_toc() {
        let document = Document::new(
            "T",
            vec![
                Block::Heading {
                    level: 2,
                    text: "Setup".to_owned(),
                },
                Block::Prose {
                    markdown: "### Details".to_owned(),
                },
            ],
        );
        let page = renderer()
            .with_options(PageOptions {
                toc: true,
                ..PageOptions::default()
            })
            .render(&document)
            .unwrap();
        assert_eq!(page.toc.len(), 2);
        assert!(page.html.contains(
            "<nav class=\"toc\">\n<p class=\"toc-title\">On this page</p>\n<ul>\n\
             <li class=\"toc-level-2\"><a href=\"#setup\">Setup</a></li>\n\
             <li class=\"toc-level-3\"><a href=\"#details\">Details</a></li>\n</ul>\n</nav>\n"
        ));
    }

    #[test]
    fn test_toc_disabled_by_default() {
        let document = Document::new(
            "T",
            vec![Block::Heading {
                level: 2,
                text: "Setup".to_owned(),
            }],
        );
        let page = renderer().render(&document).unwrap();
        assert_eq!(page.toc.len(), 1);
        assert!(!page.html.contains("class=\"toc\""));
    }

    #[test]
    fn test_render_source() {
        let page = renderer()
            .render_source("::title[Upserts]\n\nUse `on_conflict`.\n")
            .unwrap();
        assert!(page.html.contains(r#"<h1 class="banner-title">Upserts</h1>"#));
        assert!(page.html.contains("<p>Use <code>on_conflict</code>.</p>"));
    }
}
