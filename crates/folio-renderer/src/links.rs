//! Link resolution for symbolic references.
//!
//! `example_file(...)` and `repo_url(...)` references are turned into
//! absolute URLs using base URLs supplied by the caller. This is the single
//! place where a link can fail to resolve, so broken links surface as
//! errors instead of silently rendering as `href=""`.

use std::borrow::Cow;

use crate::document::{LinkKind, LinkReference, LinkTarget};

/// Base URLs for symbolic references.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkConfig {
    /// Root for `example_file(...)` links.
    pub example_base_url: Option<String>,
    /// Root for `repo_url(...)` links.
    pub repo_base_url: Option<String>,
}

/// A link that cannot be resolved to a non-empty URL.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UnresolvedReference {
    /// Reference with an empty path.
    #[error("{reference} has an empty path")]
    EmptyPath {
        /// The reference as written.
        reference: String,
    },
    /// Reference whose base URL is not configured.
    #[error("{reference} requires `{setting}` to be configured")]
    MissingBaseUrl {
        /// The reference as written.
        reference: String,
        /// Name of the missing setting.
        setting: &'static str,
    },
    /// Literal link with an empty destination.
    #[error("empty link destination")]
    EmptyUrl,
    /// Reference call that could not be parsed.
    #[error(transparent)]
    Invalid(#[from] crate::document::InvalidReference),
}

/// Resolves [`LinkReference`]s into URLs.
#[derive(Clone, Debug, Default)]
pub struct LinkResolver {
    config: LinkConfig,
}

impl LinkResolver {
    /// Create a resolver with the given base URLs.
    #[must_use]
    pub fn new(config: LinkConfig) -> Self {
        Self { config }
    }

    /// Base URL configuration.
    #[must_use]
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Resolve a reference into an absolute URL.
    ///
    /// # Example
    ///
    /// ```
    /// use folio_renderer::{LinkConfig, LinkReference, LinkResolver};
    ///
    /// let resolver = LinkResolver::new(LinkConfig {
    ///     example_base_url: Some("https://github.com/org/repo/tree/main/examples".to_owned()),
    ///     repo_base_url: None,
    /// });
    /// let url = resolver
    ///     .resolve(&LinkReference::example_file("inserts/src/lib.rs").with_lines(3, Some(9)))
    ///     .unwrap();
    /// assert_eq!(
    ///     url,
    ///     "https://github.com/org/repo/tree/main/examples/inserts/src/lib.rs#L3-L9"
    /// );
    /// ```
    pub fn resolve(&self, reference: &LinkReference) -> Result<String, UnresolvedReference> {
        if reference.path.trim().is_empty() {
            return Err(UnresolvedReference::EmptyPath {
                reference: reference.to_string(),
            });
        }

        let (base, setting) = match reference.kind {
            LinkKind::ExampleFile => (&self.config.example_base_url, "example_base_url"),
            LinkKind::RepoUrl => (&self.config.repo_base_url, "repo_base_url"),
        };
        let base = base
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| UnresolvedReference::MissingBaseUrl {
                reference: reference.to_string(),
                setting,
            })?;

        let mut url = join_url(base, &reference.path);
        if let Some(range) = reference.lines {
            url.push_str(&range.fragment());
        }
        Ok(url)
    }

    /// Resolve any link target. Literal URLs are returned unchanged.
    pub fn resolve_target<'a>(
        &self,
        target: &'a LinkTarget,
    ) -> Result<Cow<'a, str>, UnresolvedReference> {
        match target {
            LinkTarget::Url(url) if url.is_empty() => Err(UnresolvedReference::EmptyUrl),
            LinkTarget::Url(url) => Ok(Cow::Borrowed(url)),
            LinkTarget::Reference(reference) => self.resolve(reference).map(Cow::Owned),
        }
    }

    /// Resolve a raw destination string as found in markdown.
    ///
    /// Empty destinations are allowed here (`[text]()` is valid markdown)
    /// and are returned as-is.
    pub(crate) fn resolve_destination<'a>(
        &self,
        raw: &'a str,
    ) -> Result<Cow<'a, str>, UnresolvedReference> {
        match LinkTarget::parse(raw)? {
            LinkTarget::Url(_) => Ok(Cow::Borrowed(raw)),
            LinkTarget::Reference(reference) => self.resolve(&reference).map(Cow::Owned),
        }
    }
}

/// Join a base URL and a relative path with exactly one `/` between them.
fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim().trim_start_matches('/')
    )
}
