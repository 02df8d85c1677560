//! CLI error types.

use folio_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Validation(String),

    /// Some pages failed; each failure has already been reported.
    #[error("{failed} of {total} pages failed")]
    PagesFailed { failed: usize, total: usize },
}
