//! Progress and failure reporting on stderr.

use std::fmt::Display;
use std::path::Path;

use console::{Style, Term};

/// Reporter for batch commands.
pub(crate) struct Output {
    term: Term,
    path: Style,
    done: Style,
    warn: Style,
    fail: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            path: Style::new().bold(),
            done: Style::new().green(),
            warn: Style::new().yellow(),
            fail: Style::new().red(),
        }
    }

    /// Nothing matched the configured extension.
    pub(crate) fn no_pages(&self, extension: &str, dir: &Path) {
        let msg = format!("No .{extension} pages found in {}", dir.display());
        self.line(&self.warn.apply_to(msg).to_string());
    }

    pub(crate) fn writing_to(&self, output_dir: &Path) {
        self.line(&format!("Output: {}", self.path.apply_to(output_dir.display())));
    }

    /// One page failed; the batch carries on.
    pub(crate) fn page_failed(&self, source: &Path, error: &dyn Display) {
        self.line(&self.failure_line(source, error));
    }

    /// All pages succeeded.
    pub(crate) fn finished(&self, verb: &str, pages: usize, output_dir: Option<&Path>) {
        let mut msg = format!("{verb} {pages} {}", if pages == 1 { "page" } else { "pages" });
        if let Some(dir) = output_dir {
            msg.push_str(&format!(" into {}", dir.display()));
        }
        self.line(&self.done.apply_to(msg).to_string());
    }

    /// Error that ends the command.
    pub(crate) fn fatal(&self, error: &dyn Display) {
        self.line(&self.fail.apply_to(format!("Error: {error}")).to_string());
    }

    fn failure_line(&self, source: &Path, error: &dyn Display) -> String {
        format!(
            "{} {}: {error}",
            self.fail.apply_to("failed"),
            self.path.apply_to(source.display())
        )
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }
}
