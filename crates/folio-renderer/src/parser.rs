//! Content model parser.
//!
//! Turns page source text into a [`Document`]. The source is markdown
//! interleaved with directives:
//!
//! ```text
//! ::title[All About Inserts]
//!
//! Plain markdown between directives becomes a prose block.
//!
//! ::heading[Batch inserts]{level=2}
//!
//! :::code[Inserting several rows]{lang=rust source="example_file(inserts/src/lib.rs, 10, 24)"}
//! insert_into(users).values(&rows).execute(conn)?;
//! :::
//!
//! ::link[insertable]{url="repo_url(diesel/src/insertable.rs)"}
//! ```

use std::str::Lines;

use crate::directive::{DirectiveArgs, ParsedDirective, parse_line};
use crate::document::{Block, Document, LinkTarget};
use crate::error::RenderError;

/// Language used for code examples that do not declare one.
const DEFAULT_LANGUAGE: &str = "text";

/// Parse page source into a [`Document`].
///
/// Block order is preserved exactly as written and whitespace-only prose is
/// dropped.
///
/// # Example
///
/// ```
/// use folio_renderer::{Block, parse_document};
///
/// let doc = parse_document("::title[Guide]\n\nHello *world*.\n").unwrap();
/// assert_eq!(doc.title, "Guide");
/// assert_eq!(doc.blocks, vec![Block::Prose { markdown: "Hello *world*.".to_owned() }]);
/// ```
pub fn parse_document(source: &str) -> Result<Document, RenderError> {
    let mut builder = DocumentBuilder::default();
    let mut lines = SourceLines::new(source);

    while let Some((line_no, line)) = lines.next() {
        if builder.in_prose_fence() {
            builder.push_prose(line_no, line);
            continue;
        }

        match parse_line(line) {
            None => builder.push_prose(line_no, line),
            Some(Err(message)) => return Err(RenderError::parse(line_no, message)),
            Some(Ok(ParsedDirective::Leaf { name, args })) => {
                builder.flush_prose();
                builder.leaf(line_no, &name, args)?;
            }
            Some(Ok(ParsedDirective::ContainerStart {
                name,
                args,
                colon_count,
            })) => {
                builder.flush_prose();
                let body = lines.container_body(colon_count).ok_or_else(|| {
                    RenderError::parse(line_no, format!("unclosed `:::{name}` container"))
                })?;
                builder.container(line_no, &name, args, body)?;
            }
            Some(Ok(ParsedDirective::ContainerEnd { .. })) => {
                return Err(RenderError::parse(
                    line_no,
                    "closing `:::` without an open container",
                ));
            }
        }
    }

    let document = builder.finish()?;
    tracing::debug!(
        title = %document.title,
        blocks = document.blocks.len(),
        "Parsed document"
    );
    Ok(document)
}

/// Numbered source lines.
struct SourceLines<'a> {
    inner: Lines<'a>,
    line_no: usize,
}

impl<'a> SourceLines<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            inner: source.lines(),
            line_no: 0,
        }
    }

    fn next(&mut self) -> Option<(usize, &'a str)> {
        let line = self.inner.next()?;
        self.line_no += 1;
        Some((self.line_no, line))
    }

    /// Collect lines up to a closing fence of at least `colon_count` colons.
    ///
    /// Returns `None` if the input ends first.
    fn container_body(&mut self, colon_count: usize) -> Option<String> {
        let mut body: Vec<&str> = Vec::new();
        while let Some((_, line)) = self.next() {
            if is_closing_fence(line, colon_count) {
                return Some(body.join("\n"));
            }
            body.push(line);
        }
        None
    }
}

fn is_closing_fence(line: &str, colon_count: usize) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= colon_count && trimmed.chars().all(|c| c == ':')
}

/// Markdown code fence (```` ``` ```` or `~~~`) open inside implicit prose.
#[derive(Clone, Copy)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    fn open(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = trimmed.chars().take_while(|c| *c == marker).count();
        (len >= 3).then_some(Self { marker, len })
    }

    fn is_closed_by(self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.chars().count() >= self.len && trimmed.chars().all(|c| c == self.marker)
    }
}

/// Implicit prose being accumulated between directives.
struct ProseBuffer {
    start_line: usize,
    lines: Vec<String>,
    fence: Option<Fence>,
}

#[derive(Default)]
struct DocumentBuilder {
    title: Option<(String, usize)>,
    blocks: Vec<Block>,
    lines: Vec<usize>,
    prose: Option<ProseBuffer>,
}

impl DocumentBuilder {
    fn in_prose_fence(&self) -> bool {
        self.prose.as_ref().is_some_and(|p| p.fence.is_some())
    }

    fn push_prose(&mut self, line_no: usize, line: &str) {
        let prose = self.prose.get_or_insert_with(|| ProseBuffer {
            start_line: line_no,
            lines: Vec::new(),
            fence: None,
        });

        match prose.fence {
            Some(fence) if fence.is_closed_by(line) => prose.fence = None,
            Some(_) => {}
            None => prose.fence = Fence::open(line),
        }
        prose.lines.push(line.to_owned());
    }

    fn flush_prose(&mut self) {
        if let Some(prose) = self.prose.take() {
            let text = prose.lines.join("\n");
            self.push_prose_block(prose.start_line, &text);
        }
    }

    fn push_prose_block(&mut self, line_no: usize, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        // Leading and trailing blank lines carry no meaning in markdown.
        let skipped = text.lines().take_while(|l| l.trim().is_empty()).count();
        let markdown = text
            .lines()
            .skip(skipped)
            .collect::<Vec<_>>()
            .join("\n")
            .trim_end()
            .to_owned();
        self.push(line_no + skipped, Block::Prose { markdown });
    }

    fn push(&mut self, line_no: usize, block: Block) {
        self.blocks.push(block);
        self.lines.push(line_no);
    }

    fn leaf(&mut self, line_no: usize, name: &str, args: DirectiveArgs) -> Result<(), RenderError> {
        match name {
            "title" => {
                if let Some((_, first)) = &self.title {
                    return Err(RenderError::parse(
                        line_no,
                        format!("duplicate `::title` (first set on line {first})"),
                    ));
                }
                let text = required_content(line_no, "title", &args)?;
                self.title = Some((text, line_no));
            }
            "heading" => {
                let text = required_content(line_no, "heading", &args)?;
                let level = heading_level(line_no, &args)?;
                self.push(line_no, Block::Heading { level, text });
            }
            "link" => {
                let id = required_content(line_no, "link", &args)?;
                let url = args.get("url").ok_or_else(|| {
                    RenderError::parse(line_no, "`::link` requires a `url` attribute")
                })?;
                let target = link_target(line_no, url)?;
                self.push(line_no, Block::LinkDefinition { id, target });
            }
            other => {
                return Err(RenderError::parse(
                    line_no,
                    format!("unknown directive `::{other}`"),
                ));
            }
        }
        Ok(())
    }

    fn container(
        &mut self,
        line_no: usize,
        name: &str,
        args: DirectiveArgs,
        body: String,
    ) -> Result<(), RenderError> {
        match name {
            // Body starts on the line after the opening fence.
            "prose" => self.push_prose_block(line_no + 1, &body),
            "code" => {
                let language = args
                    .get("lang")
                    .or_else(|| args.classes.first().map(String::as_str))
                    .unwrap_or(DEFAULT_LANGUAGE)
                    .to_owned();
                let source = args
                    .get("source")
                    .map(|raw| link_target(line_no, raw))
                    .transpose()?;
                self.push(
                    line_no,
                    Block::CodeExample {
                        label: args.content.trim().to_owned(),
                        source,
                        language,
                        code: body,
                    },
                );
            }
            other => {
                return Err(RenderError::parse(
                    line_no,
                    format!("unknown container `:::{other}`"),
                ));
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Document, RenderError> {
        self.flush_prose();

        let title = match self.title {
            Some((title, _)) => title,
            None => self
                .blocks
                .iter()
                .find_map(|block| match block {
                    Block::Heading { text, .. } => Some(text.clone()),
                    _ => None,
                })
                .ok_or_else(|| {
                    RenderError::parse(1, "document has no title: add a `::title[...]` line")
                })?,
        };

        Ok(Document::with_lines(title, self.blocks, self.lines))
    }
}

fn required_content(line_no: usize, name: &str, args: &DirectiveArgs) -> Result<String, RenderError> {
    let content = args.content.trim();
    if content.is_empty() {
        return Err(RenderError::parse(
            line_no,
            format!("`::{name}` requires text in brackets"),
        ));
    }
    Ok(content.to_owned())
}

fn heading_level(line_no: usize, args: &DirectiveArgs) -> Result<u8, RenderError> {
    let Some(raw) = args.get("level") else {
        return Ok(2);
    };
    match raw.parse::<u8>() {
        Ok(level @ 1..=6) => Ok(level),
        _ => Err(RenderError::parse(
            line_no,
            format!("heading level must be 1-6, got `{raw}`"),
        )),
    }
}

fn link_target(line_no: usize, raw: &str) -> Result<LinkTarget, RenderError> {
    LinkTarget::parse(raw).map_err(|e| RenderError::parse(line_no, e.to_string()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::document::LinkReference;

    fn prose(markdown: &str) -> Block {
        Block::Prose {
            markdown: markdown.to_owned(),
        }
    }

    fn parse_err(source: &str) -> (usize, String) {
        match parse_document(source).unwrap_err() {
            RenderError::Parse { line, message } => (line, message),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_full_document() {
        let source = r#"::title[All About Inserts]

Diesel supports `INSERT` statements.

::heading[Batch inserts]{level=3}

:::code[Inserting rows]{lang=rust source="example_file(inserts/src/lib.rs, 10, 24)"}
insert_into(users).values(&rows).execute(conn)?;
:::

::link[insertable]{url="repo_url(diesel/src/insertable.rs)"}
"#;
        let doc = parse_document(source).unwrap();

        assert_eq!(doc.title, "All About Inserts");
        assert_eq!(
            doc.blocks,
            vec![
                prose("Diesel supports `INSERT` statements."),
                Block::Heading {
                    level: 3,
                    text: "Batch inserts".to_owned()
                },
                Block::CodeExample {
                    label: "Inserting rows".to_owned(),
                    source: Some(LinkTarget::Reference(
                        LinkReference::example_file("inserts/src/lib.rs").with_lines(10, Some(24))
                    )),
                    language: "rust".to_owned(),
                    code: "insert_into(users).values(&rows).execute(conn)?;".to_owned(),
                },
                Block::LinkDefinition {
                    id: "insertable".to_owned(),
                    target: LinkTarget::Reference(LinkReference::repo_url(
                        "diesel/src/insertable.rs"
                    )),
                },
            ]
        );
        assert_eq!(doc.line_of(0), Some(3));
        assert_eq!(doc.line_of(1), Some(5));
        assert_eq!(doc.line_of(2), Some(7));
        assert_eq!(doc.line_of(3), Some(11));
    }

    #[test]
    fn test_block_order_preserved() {
        let source = "::title[T]\nfirst\n::heading[H]\nsecond\n:::prose\nthird\n:::\nfourth\n";
        let doc = parse_document(source).unwrap();
        assert_eq!(
            doc.blocks,
            vec![
                prose("first"),
                Block::Heading {
                    level: 2,
                    text: "H".to_owned()
                },
                prose("second"),
                prose("third"),
                prose("fourth"),
            ]
        );
    }

    #[test]
    fn test_whitespace_only_prose_dropped() {
        let source = "::title[T]\n\n   \n\t\n::heading[H]\n\n:::prose\n  \n:::\n";
        let doc = parse_document(source).unwrap();
        assert_eq!(doc.blocks.len(), 1);
    }

    #[test]
    fn test_code_is_opaque() {
        let source = "::title[T]\n:::code{.rust}\nlet f = |x| x +;\n::heading[not a heading]\n\n  indented <b>\n:::\n";
        let doc = parse_document(source).unwrap();
        assert_eq!(
            doc.blocks,
            vec![Block::CodeExample {
                label: String::new(),
                source: None,
                language: "rust".to_owned(),
                code: "let f = |x| x +;\n::heading[not a heading]\n\n  indented <b>".to_owned(),
            }]
        );
    }

    #[test]
    fn test_code_default_language() {
        let doc = parse_document("::title[T]\n:::code\nSELECT 1;\n:::").unwrap();
        assert!(matches!(
            &doc.blocks[0],
            Block::CodeExample { language, .. } if language == "text"
        ));
    }

    #[test]
    fn test_longer_fence_allows_inner_closing_line() {
        let source = "::title[T]\n::::code\n:::\n::::\n";
        let doc = parse_document(source).unwrap();
        assert!(matches!(
            &doc.blocks[0],
            Block::CodeExample { code, .. } if code == ":::"
        ));
    }

    #[test]
    fn test_markdown_fence_in_prose_hides_directives() {
        let source = "::title[T]\n```text\n::unknown[x]\n```\nafter\n";
        let doc = parse_document(source).unwrap();
        assert_eq!(doc.blocks, vec![prose("```text\n::unknown[x]\n```\nafter")]);
    }

    #[test]
    fn test_title_falls_back_to_first_heading() {
        let doc = parse_document("intro\n::heading[Getting Started]{level=1}\n").unwrap();
        assert_eq!(doc.title, "Getting Started");
    }

    #[test]
    fn test_missing_title() {
        let (line, message) = parse_err("just prose\n");
        assert_eq!(line, 1);
        assert!(message.contains("no title"));
    }

    #[test]
    fn test_unknown_directive_names_line() {
        let (line, message) = parse_err("::title[T]\n\n::sidebar[x]\n");
        assert_eq!(line, 3);
        assert!(message.contains("::sidebar"));
    }

    #[test]
    fn test_unknown_container_names_line() {
        let (line, message) = parse_err("::title[T]\n:::tabs\nx\n:::\n");
        assert_eq!(line, 2);
        assert!(message.contains(":::tabs"));
    }

    #[test]
    fn test_unclosed_container() {
        let (line, message) = parse_err("::title[T]\ntext\n:::code{.rust}\nfn x() {}\n");
        assert_eq!(line, 3);
        assert!(message.contains("unclosed"));
    }

    #[test]
    fn test_stray_closing_fence() {
        let (line, _) = parse_err("::title[T]\n:::\n");
        assert_eq!(line, 2);
    }

    #[test]
    fn test_duplicate_title() {
        let (line, message) = parse_err("::title[A]\n::title[B]\n");
        assert_eq!(line, 2);
        assert!(message.contains("line 1"));
    }

    #[test]
    fn test_bad_heading_level() {
        let (line, message) = parse_err("::title[T]\n::heading[H]{level=7}\n");
        assert_eq!(line, 2);
        assert!(message.contains("1-6"));
    }

    #[test]
    fn test_link_requires_url() {
        let (_, message) = parse_err("::title[T]\n::link[docs]\n");
        assert!(message.contains("url"));
    }

    #[test]
    fn test_malformed_source_reference() {
        let (line, message) =
            parse_err("::title[T]\n:::code{source=\"example_file(a.rs, nine)\"}\nx\n:::\n");
        assert_eq!(line, 2);
        assert!(message.contains("not a line number"));
    }

    #[test]
    fn test_prose_container_keeps_directive_lookalikes() {
        let source = "::title[T]\n::::prose\n::note[not parsed]\n:::\n::::\n";
        let doc = parse_document(source).unwrap();
        assert_eq!(doc.blocks, vec![prose("::note[not parsed]\n:::")]);
        assert_eq!(doc.line_of(0), Some(3));
    }

    #[test]
    fn test_crlf_line_endings() {
        let doc = parse_document("::title[T]\r\nline one\r\nline two\r\n").unwrap();
        assert_eq!(doc.blocks, vec![prose("line one\nline two")]);
    }
}
