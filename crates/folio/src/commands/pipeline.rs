//! Source discovery and parallel rendering shared by `build` and `check`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use folio_renderer::{PageRenderer, RenderError, RenderedPage};
use rayon::prelude::*;

use crate::error::CliError;
use crate::output::Output;

/// A page source selected for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceFile {
    /// Path to read from.
    pub path: PathBuf,
    /// Path relative to the scanned directory, used for the output location.
    pub relative: PathBuf,
}

/// Why a single page failed.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PageError {
    #[error("cannot read source: {0}")]
    Read(std::io::Error),
    #[error("{0}")]
    Render(#[from] RenderError),
    #[error("cannot write output: {0}")]
    Write(std::io::Error),
}

/// Rendering result for one source.
pub(crate) struct PageOutcome<'a> {
    pub source: &'a SourceFile,
    pub result: Result<RenderedPage, PageError>,
}

/// Resolve command-line inputs into a sorted list of page sources.
///
/// Directories are scanned recursively for files with `extension`, skipping
/// hidden entries. Explicit files are taken as-is. With no inputs,
/// `default_dir` is scanned.
pub(crate) fn collect_sources(
    inputs: &[PathBuf],
    default_dir: &Path,
    extension: &str,
) -> Result<Vec<SourceFile>, CliError> {
    let mut sources = Vec::new();

    if inputs.is_empty() {
        if !default_dir.is_dir() {
            return Err(CliError::Validation(format!(
                "source directory not found: {}",
                default_dir.display()
            )));
        }
        scan_directory(default_dir, default_dir, extension, &mut sources);
    }

    for input in inputs {
        if input.is_dir() {
            scan_directory(input, input, extension, &mut sources);
        } else if input.is_file() {
            let relative = input
                .file_name()
                .map_or_else(|| input.clone(), PathBuf::from);
            sources.push(SourceFile {
                path: input.clone(),
                relative,
            });
        } else {
            return Err(CliError::Validation(format!(
                "input not found: {}",
                input.display()
            )));
        }
    }

    sources.sort_by(|a, b| a.relative.cmp(&b.relative).then_with(|| a.path.cmp(&b.path)));
    sources.dedup_by(|a, b| a.path == b.path);

    // Two different files would overwrite each other's output
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::with_capacity(sources.len());
    for source in &sources {
        if let Some(first) = claimed.insert(html_name(&source.relative), &source.path) {
            return Err(CliError::Validation(format!(
                "{} and {} map to the same output path",
                first.display(),
                source.path.display()
            )));
        }
    }

    Ok(sources)
}

fn scan_directory(root: &Path, dir: &Path, extension: &str, out: &mut Vec<SourceFile>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::warn!(path = %dir.display(), %error, "Skipping unreadable directory");
            return;
        }
    };

    for entry in entries.filter_map(Result::ok) {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());

        if is_dir {
            scan_directory(root, &path, extension, out);
        } else if path.extension().is_some_and(|ext| ext == extension) {
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            out.push(SourceFile {
                relative: relative.to_path_buf(),
                path,
            });
        }
    }
}

/// Render every source in parallel. Outcomes keep the order of `sources`.
pub(crate) fn render_all<'a>(
    renderer: &PageRenderer,
    sources: &'a [SourceFile],
) -> Vec<PageOutcome<'a>> {
    sources
        .par_iter()
        .map(|source| PageOutcome {
            source,
            result: render_one(renderer, source),
        })
        .collect()
}

fn render_one(renderer: &PageRenderer, source: &SourceFile) -> Result<RenderedPage, PageError> {
    let text = fs::read_to_string(&source.path).map_err(PageError::Read)?;
    let page = renderer.render_source(&text)?;
    tracing::info!(
        path = %source.relative.display(),
        headings = page.toc.len(),
        "Rendered page"
    );
    Ok(page)
}

/// Output location of a page: `<output_dir>/<relative path>.html`.
pub(crate) fn output_path(output_dir: &Path, relative: &Path) -> PathBuf {
    output_dir.join(html_name(relative))
}

fn html_name(relative: &Path) -> PathBuf {
    relative.with_extension("html")
}

/// Write a rendered page, creating parent directories as needed.
pub(crate) fn write_page(path: &Path, page: &RenderedPage) -> Result<(), PageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(PageError::Write)?;
    }
    fs::write(path, &page.html).map_err(PageError::Write)
}

/// Report a failed page with its path.
pub(crate) fn report_failure(output: &Output, source: &SourceFile, error: &PageError) {
    output.page_failed(&source.path, error);
}
