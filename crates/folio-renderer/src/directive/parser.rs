//! Directive line recognition.
//!
//! Recognizes `::name`, `:::name` and closing `:::` lines.

use super::DirectiveArgs;

/// Parsed directive from a line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ParsedDirective {
    /// Leaf directive: `::name[content]{attrs}`
    Leaf { name: String, args: DirectiveArgs },
    /// Container opening: `:::name[content]{attrs}`
    ContainerStart {
        name: String,
        args: DirectiveArgs,
        colon_count: usize,
    },
    /// Container closing: `:::`
    ContainerEnd { colon_count: usize },
}

/// Parse a whole line as a directive.
///
/// Returns `None` if the line is not directive syntax, and `Some(Err(..))`
/// if it starts like a directive but has trailing garbage.
pub(crate) fn parse_line(line: &str) -> Option<Result<ParsedDirective, String>> {
    let trimmed = line.trim();
    if !trimmed.starts_with("::") {
        return None;
    }

    let colon_count = trimmed.chars().take_while(|&c| c == ':').count();
    let after_colons = &trimmed[colon_count..];

    if after_colons.is_empty() {
        return (colon_count >= 3).then_some(Ok(ParsedDirective::ContainerEnd { colon_count }));
    }

    let after_colons = after_colons.trim_start();
    let name_end = after_colons
        .find(|c: char| c == '[' || c == '{' || c.is_whitespace())
        .unwrap_or(after_colons.len());

    let name = &after_colons[..name_end];
    if !is_valid_directive_name(name) {
        return None;
    }

    let mut rest = &after_colons[name_end..];
    let (content, consumed) = parse_delimited(rest, '[', ']');
    rest = &rest[consumed..];
    let (attrs_str, consumed) = parse_delimited(rest, '{', '}');
    rest = &rest[consumed..];

    if !rest.trim().is_empty() {
        return Some(Err(format!(
            "unexpected text after directive `{name}`: `{}`",
            rest.trim()
        )));
    }

    let args = DirectiveArgs::parse(content, attrs_str);
    let name = name.to_owned();

    Some(Ok(if colon_count == 2 {
        ParsedDirective::Leaf { name, args }
    } else {
        ParsedDirective::ContainerStart {
            name,
            args,
            colon_count,
        }
    }))
}

/// Check if a name is a valid directive name.
///
/// Valid names contain only alphanumeric characters, hyphens, and underscores.
fn is_valid_directive_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

/// Parse a delimited group such as `[content]` or `{attrs}`, handling nesting.
///
/// Returns (inner text, bytes consumed). Quoted regions inside braces are
/// skipped so that `}` in an attribute value does not close the group.
fn parse_delimited(s: &str, open: char, close: char) -> (&str, usize) {
    if !s.starts_with(open) {
        return ("", 0);
    }

    let mut depth = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' if open == '{' => quote = Some(c),
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return (&s[open.len_utf8()..i], i + close.len_utf8());
                }
            }
            _ => {}
        }
    }

    ("", 0)
}
