//! Configuration management for Folio.
//!
//! Parses `folio.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `links.example_base_url`
//! - `links.repo_base_url`
//! - `site.stylesheet`
//!
//! A base URL that expands to an empty string counts as unset.

mod expand;

use expand::{Blank, expand_setting};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override root URL for `example_file(...)` links.
    pub example_base_url: Option<String>,
    /// Override root URL for `repo_url(...)` links.
    pub repo_base_url: Option<String>,
    /// Override page source directory.
    pub source_dir: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override table of contents flag.
    pub toc: Option<bool>,
}

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "folio.toml";

/// Default extension of page source files.
const DEFAULT_EXTENSION: &str = "page";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URLs for symbolic links.
    pub links: LinksConfig,
    /// Page presentation settings.
    pub site: SiteConfig,
    /// Build paths as written in TOML.
    build: BuildConfigRaw,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Base URLs for `example_file(...)` and `repo_url(...)` links.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// Root for `example_file(...)` links.
    pub example_base_url: Option<String>,
    /// Root for `repo_url(...)` links.
    pub repo_base_url: Option<String>,
}

/// Page presentation settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site name shown in the banner and page titles.
    pub name: Option<String>,
    /// Stylesheet URL linked from every page.
    pub stylesheet: Option<String>,
    /// Whether pages get a table of contents.
    pub toc: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BuildConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
    extension: Option<String>,
}

/// Resolved build configuration with absolute paths.
#[derive(Debug, Default)]
pub struct BuildConfig {
    /// Directory scanned for page sources.
    pub source_dir: PathBuf,
    /// Directory receiving rendered HTML.
    pub output_dir: PathBuf,
    /// Extension of page source files, without the leading dot.
    pub extension: String,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`links.repo_base_url`").
        field: String,
        /// Error message (e.g., "${`REPO_URL`} not set").
        message: String,
    },
}

/// Require a link base URL to be absolute or root-relative.
fn require_base_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") && !url.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http://, https:// or /"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `folio.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The merged
    /// configuration is validated last.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails
    /// or a value is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(url) = &settings.example_base_url {
            self.links.example_base_url = Some(url.clone());
        }
        if let Some(url) = &settings.repo_base_url {
            self.links.repo_base_url = Some(url.clone());
        }
        if let Some(source_dir) = &settings.source_dir {
            self.build_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.build_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(toc) = settings.toc {
            self.site.toc = toc;
        }
    }

    /// Search for a config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            links: LinksConfig::default(),
            site: SiteConfig::default(),
            build: BuildConfigRaw::default(),
            build_resolved: BuildConfig {
                source_dir: base.join("guides"),
                output_dir: base.join("build"),
                extension: DEFAULT_EXTENSION.to_owned(),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.links.example_base_url {
            require_base_url(url, "links.example_base_url")?;
        }
        if let Some(url) = &self.links.repo_base_url {
            require_base_url(url, "links.repo_base_url")?;
        }

        let extension = &self.build_resolved.extension;
        if extension.is_empty() {
            return Err(ConfigError::Validation(
                "build.extension cannot be empty".to_owned(),
            ));
        }
        if extension.contains(['/', '\\', '.']) {
            return Err(ConfigError::Validation(format!(
                "build.extension must be a bare extension, got `{extension}`"
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand_setting(
            &mut self.links.example_base_url,
            "links.example_base_url",
            Blank::Unset,
        )?;
        expand_setting(&mut self.links.repo_base_url, "links.repo_base_url", Blank::Unset)?;
        expand_setting(&mut self.site.stylesheet, "site.stylesheet", Blank::Keep)?;

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.build_resolved = BuildConfig {
            source_dir: resolve(self.build.source_dir.as_deref(), "guides"),
            output_dir: resolve(self.build.output_dir.as_deref(), "build"),
            extension: self
                .build
                .extension
                .as_deref()
                .map_or(DEFAULT_EXTENSION, |ext| ext.trim().trim_start_matches('.'))
                .to_owned(),
        };
    }
}
