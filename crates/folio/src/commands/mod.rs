//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod check;
mod pipeline;

use std::path::PathBuf;

use clap::Args;
use folio_config::{CliSettings, Config};
use folio_renderer::{LinkConfig, LinkResolver, PageOptions, PageRenderer};

pub(crate) use build::BuildArgs;
pub(crate) use check::CheckArgs;

use crate::error::CliError;

/// Arguments shared by commands that render pages.
#[derive(Args)]
pub(crate) struct SourceArgs {
    /// Page sources or directories to scan (default: configured source dir).
    inputs: Vec<PathBuf>,

    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root URL for `example_file(...)` links (overrides config).
    #[arg(long, env = "FOLIO_EXAMPLE_BASE_URL")]
    example_base_url: Option<String>,

    /// Root URL for `repo_url(...)` links (overrides config).
    #[arg(long, env = "FOLIO_REPO_BASE_URL")]
    repo_base_url: Option<String>,

    /// Add a table of contents to every page.
    #[arg(long)]
    toc: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl SourceArgs {
    /// Load configuration with these arguments applied on top.
    fn load_config(&self, output_dir: Option<PathBuf>) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            example_base_url: self.example_base_url.clone(),
            repo_base_url: self.repo_base_url.clone(),
            output_dir,
            toc: self.toc.then_some(true),
            ..CliSettings::default()
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// Build a page renderer from loaded configuration.
fn renderer_from_config(config: &Config) -> PageRenderer {
    let resolver = LinkResolver::new(LinkConfig {
        example_base_url: config.links.example_base_url.clone(),
        repo_base_url: config.links.repo_base_url.clone(),
    });
    PageRenderer::new(resolver).with_options(PageOptions {
        site_name: config.site.name.clone(),
        stylesheet: config.site.stylesheet.clone(),
        toc: config.site.toc,
    })
}
