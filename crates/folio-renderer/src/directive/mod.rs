//! CommonMark directive syntax used by the page source format.
//!
//! Page sources are made of leaf directives (`::name[content]{attrs}`, one
//! per line) and container directives (`:::name[content]{attrs}` ... `:::`).
//! This module only recognizes the syntax; [`crate::parser`] decides what
//! each directive means.

mod args;
mod parser;

pub use args::DirectiveArgs;
pub(crate) use parser::{ParsedDirective, parse_line};
