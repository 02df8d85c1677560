//! `${VAR}` expansion for optional string settings.

use std::env::{self, VarError};

use shellexpand::LookupError;

use crate::ConfigError;

/// What an expanded setting that ends up blank means.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Blank {
    /// Keep the empty string.
    Keep,
    /// Treat the setting as not configured.
    Unset,
}

/// Expand `${VAR}` and `${VAR:-default}` in an optional setting in place.
///
/// Only braced references are expanded, so a bare `$` in a URL stays.
pub(crate) fn expand_setting(
    setting: &mut Option<String>,
    field: &str,
    blank: Blank,
) -> Result<(), ConfigError> {
    let Some(value) = setting.take() else {
        return Ok(());
    };

    let expanded = if value.contains("${") {
        expand(&value).map_err(|e| lookup_failed(field, &e))?
    } else {
        value
    };

    *setting = match blank {
        Blank::Unset if expanded.trim().is_empty() => None,
        _ => Some(expanded),
    };
    Ok(())
}

fn expand(value: &str) -> Result<String, LookupError<VarError>> {
    shellexpand::env_with_context(value, |var| env::var(var).map(Some))
        .map(std::borrow::Cow::into_owned)
}

fn lookup_failed(field: &str, error: &LookupError<VarError>) -> ConfigError {
    let reason = match error.cause {
        VarError::NotPresent => "not set",
        VarError::NotUnicode(_) => "not valid unicode",
    };
    ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} {reason}", error.var_name),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn expanded(value: &str, blank: Blank) -> Result<Option<String>, ConfigError> {
        let mut setting = Some(value.to_owned());
        expand_setting(&mut setting, "links.repo_base_url", blank)?;
        Ok(setting)
    }

    #[test]
    fn test_expand_var_inside_url() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            env::set_var("FOLIO_TEST_EXPAND_SIMPLE", "https://github.com/org/repo");
        }
        assert_eq!(
            expanded("${FOLIO_TEST_EXPAND_SIMPLE}/blob/main", Blank::Keep).unwrap(),
            Some("https://github.com/org/repo/blob/main".to_owned())
        );
        unsafe {
            env::remove_var("FOLIO_TEST_EXPAND_SIMPLE");
        }
    }

    #[test]
    fn test_default_applies_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            env::remove_var("FOLIO_TEST_EXPAND_UNSET");
        }
        assert_eq!(
            expanded("${FOLIO_TEST_EXPAND_UNSET:-/examples}", Blank::Keep).unwrap(),
            Some("/examples".to_owned())
        );
    }

    #[test]
    fn test_blank_result() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            env::remove_var("FOLIO_TEST_EXPAND_BLANK");
        }
        assert_eq!(expanded("${FOLIO_TEST_EXPAND_BLANK:-}", Blank::Unset).unwrap(), None);
        assert_eq!(expanded("  ", Blank::Unset).unwrap(), None);
        assert_eq!(
            expanded("${FOLIO_TEST_EXPAND_BLANK:-}", Blank::Keep).unwrap(),
            Some(String::new())
        );
    }

    #[test]
    fn test_missing_var_names_field_and_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            env::remove_var("FOLIO_TEST_EXPAND_MISSING");
        }
        let err = expanded("${FOLIO_TEST_EXPAND_MISSING}", Blank::Unset).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Environment variable error in links.repo_base_url: ${FOLIO_TEST_EXPAND_MISSING} not set"
        );
    }

    #[test]
    fn test_literal_and_absent_settings() {
        assert_eq!(
            expanded("https://example.com/$path", Blank::Unset).unwrap(),
            Some("https://example.com/$path".to_owned())
        );
        let mut setting = None;
        expand_setting(&mut setting, "site.stylesheet", Blank::Keep).unwrap();
        assert_eq!(setting, None);
    }
}
