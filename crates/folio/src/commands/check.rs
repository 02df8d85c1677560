//! `folio check` command implementation.

use clap::Args;

use super::pipeline;
use super::{SourceArgs, renderer_from_config};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
}

impl CheckArgs {
    /// Execute the check command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.sources.load_config(None)?;
        let build = &config.build_resolved;

        let sources =
            pipeline::collect_sources(&self.sources.inputs, &build.source_dir, &build.extension)?;
        if sources.is_empty() {
            output.no_pages(&build.extension, &build.source_dir);
            return Ok(());
        }

        let renderer = renderer_from_config(&config);
        let outcomes = pipeline::render_all(&renderer, &sources);

        let mut failed = 0;
        for outcome in &outcomes {
            if let Err(error) = &outcome.result {
                failed += 1;
                pipeline::report_failure(&output, outcome.source, error);
            }
        }

        if failed > 0 {
            return Err(CliError::PagesFailed {
                failed,
                total: outcomes.len(),
            });
        }

        output.finished("Checked", outcomes.len(), None);
        Ok(())
    }
}
