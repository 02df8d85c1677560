//! End-to-end rendering of guide pages from source text.

use folio_renderer::{
    Block, Document, LinkConfig, LinkResolver, Locator, PageOptions, PageRenderer, RenderError,
    UnresolvedReference, parse_document,
};
use pretty_assertions::assert_eq;

const GUIDE: &str = r#"::title[All About Inserts]

This guide covers `insert_into`. The table is declared in
[the schema][schema].

::heading[Batch inserts]

:::code[Inserting several rows]{lang=rust source="example_file(all_about_inserts/src/lib.rs, 40, 52)"}
let rows = vec![new_user("Sean"), new_user("Tess")];
insert_into(users).values(&rows).execute(conn)?;
:::

Everything derives from [`Insertable`][insertable].

::link[schema]{url="example_file(all_about_inserts/src/schema.rs)"}
::link[insertable]{url="repo_url(diesel/src/insertable.rs)"}
"#;

fn renderer() -> PageRenderer {
    PageRenderer::new(LinkResolver::new(LinkConfig {
        example_base_url: Some("https://github.com/diesel-rs/diesel/tree/2.2.x/examples".to_owned()),
        repo_base_url: Some("https://github.com/diesel-rs/diesel/blob/2.2.x".to_owned()),
    }))
}

fn content(html: &str) -> &str {
    let open = "<article class=\"guide-content\">\n";
    let start = html.find(open).unwrap() + open.len();
    let end = html.find("</article>").unwrap();
    &html[start..end]
}

#[test]
fn test_full_guide() {
    let page = renderer().render_source(GUIDE).unwrap();

    assert!(page.html.contains("<title>All About Inserts</title>"));
    assert!(
        page.html
            .contains(r#"<h1 class="banner-title">All About Inserts</h1>"#)
    );
    assert_eq!(
        content(&page.html),
        "<p>This guide covers <code>insert_into</code>. The table is declared in\n\
         <a href=\"https://github.com/diesel-rs/diesel/tree/2.2.x/examples/all_about_inserts/src/schema.rs\">the schema</a>.</p>\n\
         <h2 id=\"batch-inserts\">Batch inserts</h2>\n\
         <figure class=\"code-example\" data-lang=\"rust\">\
         <figcaption class=\"code-example-header\">\
         <span class=\"code-example-label\">Inserting several rows</span>\
         <a class=\"code-example-source\" href=\"https://github.com/diesel-rs/diesel/tree/2.2.x/examples/all_about_inserts/src/lib.rs#L40-L52\">View source</a>\
         </figcaption>\
         <pre><code class=\"language-rust\">let rows = vec![new_user(&quot;Sean&quot;), new_user(&quot;Tess&quot;)];\n\
         insert_into(users).values(&amp;rows).execute(conn)?;</code></pre></figure>\n\
         <p>Everything derives from <a href=\"https://github.com/diesel-rs/diesel/blob/2.2.x/diesel/src/insertable.rs\"><code>Insertable</code></a>.</p>\n"
    );
}

#[test]
fn test_rendering_is_deterministic() {
    let renderer = renderer();
    let document = parse_document(GUIDE).unwrap();
    let first = renderer.render(&document).unwrap();
    let second = renderer.render(&document).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_block_order_is_preserved() {
    let document = Document::new(
        "Order",
        vec![
            Block::Prose {
                markdown: "first".to_owned(),
            },
            Block::Heading {
                level: 3,
                text: "second".to_owned(),
            },
            Block::Prose {
                markdown: "third".to_owned(),
            },
        ],
    );
    let page = renderer().render(&document).unwrap();
    let body = content(&page.html);
    let first = body.find("first").unwrap();
    let second = body.find("second").unwrap();
    let third = body.find("third").unwrap();
    assert!(first < second && second < third);
}

#[test]
fn test_built_document_renders_banner_link_and_code() {
    let document = Document::new(
        "T",
        vec![
            Block::Heading {
                level: 2,
                text: "T".to_owned(),
            },
            Block::Prose {
                markdown: "see [x](http://e)".to_owned(),
            },
            Block::CodeExample {
                label: "Ex".to_owned(),
                source: None,
                language: "rust".to_owned(),
                code: "a<b".to_owned(),
            },
        ],
    );
    let page = PageRenderer::new(LinkResolver::default())
        .render(&document)
        .unwrap();
    assert!(page.html.contains(r#"<h1 class="banner-title">T</h1>"#));
    assert!(page.html.contains(r#"<h2 id="t">T</h2>"#));
    assert!(page.html.contains(r#"<a href="http://e">x</a>"#));
    assert!(page.html.contains("a&lt;b"));
    assert!(!page.html.contains("a<b"));
}

#[test]
fn test_missing_base_url_reports_block_and_line() {
    let source = "::title[T]\n\nIntro.\n\nSee [lib](repo_url(src/lib.rs)).\n";
    let err = PageRenderer::new(LinkResolver::default())
        .render_source(source)
        .unwrap_err();
    match err {
        RenderError::UnresolvedReference { at, source } => {
            assert_eq!(
                at,
                Locator {
                    block: 0,
                    line: Some(3)
                }
            );
            assert!(matches!(
                source,
                UnresolvedReference::MissingBaseUrl {
                    setting: "repo_base_url",
                    ..
                }
            ));
        }
        other => panic!("expected unresolved reference, got {other:?}"),
    }
}

#[test]
fn test_dangling_reference_message() {
    let source = "::title[T]\n\n::heading[Intro]\n\nSee [nowhere].\n";
    let err = renderer().render_source(source).unwrap_err();
    assert_eq!(
        err.to_string(),
        "block 1 (line 5): no definition for reference link [nowhere]"
    );
}

#[test]
fn test_parse_error_message() {
    let source = "::title[T]\n\n:::code{lang=rust}\nfn main() {}\n";
    let err = renderer().render_source(source).unwrap_err();
    assert_eq!(err.to_string(), "line 3: unclosed `:::code` container");
}

#[test]
fn test_toc_and_options() {
    let page = renderer()
        .with_options(PageOptions {
            site_name: Some("Diesel Guides".to_owned()),
            stylesheet: None,
            toc: true,
        })
        .render_source(GUIDE)
        .unwrap();
    assert_eq!(page.toc.len(), 1);
    assert_eq!(page.toc[0].id, "batch-inserts");
    assert!(page.html.contains("<title>All About Inserts - Diesel Guides</title>"));
    assert!(page.html.contains(r##"<a href="#batch-inserts">Batch inserts</a>"##));
}

#[test]
fn test_code_is_opaque_text() {
    let source = "::title[Closures]\n\n:::code[Broken on purpose]{lang=rust}\nlet f = |x| { x + ;\n::heading[not a directive]\n  :::\n";
    // The indented bare fence still closes the container
    let document = parse_document(source).unwrap();
    let Block::CodeExample { code, .. } = &document.blocks[0] else {
        panic!("expected code example");
    };
    assert_eq!(code, "let f = |x| { x + ;\n::heading[not a directive]");

    let page = renderer().render(&document).unwrap();
    assert!(page.html.contains("let f = |x| { x + ;\n::heading[not a directive]</code>"));
    assert!(page.toc.is_empty());
}

#[test]
fn test_link_block_definition_beats_later_prose_definition() {
    let source = "::title[T]\n\n::link[diesel]{url=\"https://diesel.rs\"}\n\nSee [diesel].\n\n[diesel]: https://example.com\n";
    let page = renderer().render_source(source).unwrap();
    assert_eq!(
        content(&page.html),
        "<p>See <a href=\"https://diesel.rs\">diesel</a>.</p>\n"
    );
}
