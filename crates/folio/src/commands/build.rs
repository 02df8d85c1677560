//! `folio build` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::pipeline;
use super::{SourceArgs, renderer_from_config};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Output directory for rendered pages (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// Pages that fail are reported and skipped; the rest are still written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.sources.load_config(self.output_dir)?;
        let build = &config.build_resolved;

        let sources =
            pipeline::collect_sources(&self.sources.inputs, &build.source_dir, &build.extension)?;
        if sources.is_empty() {
            output.no_pages(&build.extension, &build.source_dir);
            return Ok(());
        }

        output.writing_to(&build.output_dir);

        let renderer = renderer_from_config(&config);
        let outcomes = pipeline::render_all(&renderer, &sources);

        let mut failed = 0;
        for outcome in &outcomes {
            match &outcome.result {
                Ok(page) => {
                    let path = pipeline::output_path(&build.output_dir, &outcome.source.relative);
                    if let Err(error) = pipeline::write_page(&path, page) {
                        failed += 1;
                        pipeline::report_failure(&output, outcome.source, &error);
                    }
                }
                Err(error) => {
                    failed += 1;
                    pipeline::report_failure(&output, outcome.source, error);
                }
            }
        }

        if failed > 0 {
            return Err(CliError::PagesFailed {
                failed,
                total: outcomes.len(),
            });
        }

        output.finished("Built", outcomes.len(), Some(&build.output_dir));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;

    fn args(root: &Path, inputs: Vec<PathBuf>) -> BuildArgs {
        BuildArgs {
            sources: SourceArgs {
                inputs,
                config: Some(root.join("folio.toml")),
                example_base_url: None,
                repo_base_url: None,
                toc: false,
                verbose: false,
            },
            output_dir: None,
        }
    }

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("folio.toml"),
            "[links]\nexample_base_url = \"https://example.com/examples\"\n\n[site]\nname = \"Guides\"\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("guides/inserts")).unwrap();
        fs::write(
            dir.path().join("guides/getting_started.page"),
            "::title[Getting Started]\n\nRead [the schema](example_file(demo/src/schema.rs)).\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("guides/inserts/batch.page"),
            "::title[Batch Inserts]\n\n:::code[Insert]{lang=rust}\ninsert_into(users)\n:::\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_build_writes_pages() {
        let dir = setup();
        args(dir.path(), Vec::new()).execute().unwrap();

        let html = fs::read_to_string(dir.path().join("build/getting_started.html")).unwrap();
        assert!(html.contains("<title>Getting Started - Guides</title>"));
        assert!(html.contains(r#"href="https://example.com/examples/demo/src/schema.rs""#));

        let html = fs::read_to_string(dir.path().join("build/inserts/batch.html")).unwrap();
        assert!(html.contains(r#"<code class="language-rust">insert_into(users)</code>"#));
    }

    #[test]
    fn test_build_continues_after_failure() {
        let dir = setup();
        fs::write(
            dir.path().join("guides/broken.page"),
            "::title[Broken]\n\nSee [x](repo_url(src/lib.rs)).\n",
        )
        .unwrap();

        let err = args(dir.path(), Vec::new()).execute().unwrap_err();
        assert_eq!(err.to_string(), "1 of 3 pages failed");
        assert!(dir.path().join("build/getting_started.html").is_file());
        assert!(dir.path().join("build/inserts/batch.html").is_file());
        assert!(!dir.path().join("build/broken.html").exists());
    }

    #[test]
    fn test_build_output_dir_override() {
        let dir = setup();
        let mut build = args(dir.path(), vec![dir.path().join("guides/inserts")]);
        build.output_dir = Some(dir.path().join("site"));
        build.execute().unwrap();

        assert!(dir.path().join("site/batch.html").is_file());
        assert!(!dir.path().join("build").exists());
    }
}
