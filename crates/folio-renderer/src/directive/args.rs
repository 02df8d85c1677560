//! Directive argument parsing.
//!
//! Parses the `[content]{#id .class key="value"}` part of a directive.

use std::collections::BTreeMap;

/// Parsed arguments from directive syntax.
///
/// # Example
///
/// ```
/// use folio_renderer::directive::DirectiveArgs;
///
/// let args = DirectiveArgs::parse("Insert", r#".rust source="example_file('a.rs', 1, 4)""#);
/// assert_eq!(args.content, "Insert");
/// assert_eq!(args.classes, vec!["rust"]);
/// assert_eq!(args.get("source"), Some("example_file('a.rs', 1, 4)"));
/// ```
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DirectiveArgs {
    /// Content from brackets: `[content]` (empty string if not provided).
    pub content: String,
    /// ID from attributes: `{#id}`.
    pub id: Option<String>,
    /// Classes from attributes: `{.class1 .class2}`.
    pub classes: Vec<String>,
    /// Key-value attributes: `{key="value"}`.
    pub attrs: BTreeMap<String, String>,
}

impl DirectiveArgs {
    /// Parse content and attributes string into structured arguments.
    ///
    /// `attrs_str` is the text between the braces, without the braces.
    #[must_use]
    pub fn parse(content: &str, attrs_str: &str) -> Self {
        let mut args = Self {
            content: content.to_owned(),
            ..Default::default()
        };

        let mut remaining = attrs_str.trim();

        while !remaining.is_empty() {
            if let Some(rest) = remaining.strip_prefix('#') {
                let (word, rest) = split_word(rest);
                args.id = Some(word.to_owned());
                remaining = rest;
            } else if let Some(rest) = remaining.strip_prefix('.') {
                let (word, rest) = split_word(rest);
                if !word.is_empty() {
                    args.classes.push(word.to_owned());
                }
                remaining = rest;
            } else if let Some((key, value, rest)) = parse_key_value(remaining) {
                args.attrs.insert(key.to_owned(), value);
                remaining = rest;
            } else {
                // Skip one unrecognized character
                let skip = remaining.chars().next().map_or(1, char::len_utf8);
                remaining = &remaining[skip..];
            }
            remaining = remaining.trim_start();
        }

        args
    }

    /// Get an attribute value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

/// Split off an `#id` or `.class` word, which ends at whitespace, `.` or `#`.
fn split_word(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| c.is_whitespace() || c == '.' || c == '#')
        .unwrap_or(s.len());
    (&s[..end], &s[end..])
}

/// Parse a key-value pair: `key="value"`, `key='value'` or `key=value`.
///
/// Double-quoted values may contain `\"` for a literal quote.
fn parse_key_value(s: &str) -> Option<(&str, String, &str)> {
    let eq_pos = s.find('=')?;
    let key = &s[..eq_pos];

    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }

    let after_eq = &s[eq_pos + 1..];

    if let Some(stripped) = after_eq.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = stripped.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' if stripped[i + 1..].starts_with('"') => {
                    value.push('"');
                    chars.next();
                }
                '"' => return Some((key, value, &stripped[i + 1..])),
                _ => value.push(c),
            }
        }
        None
    } else if let Some(stripped) = after_eq.strip_prefix('\'') {
        let end_quote = stripped.find('\'')?;
        Some((key, stripped[..end_quote].to_owned(), &stripped[end_quote + 1..]))
    } else {
        let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
        Some((key, after_eq[..end].to_owned(), &after_eq[end..]))
    }
}
