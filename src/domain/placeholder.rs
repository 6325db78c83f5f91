//! `{{NAME}}` placeholder substitution against environment variables.
//!
//! A token is `{{` followed by one or more ASCII alphanumerics or underscores
//! and `}}`. Anything else, including `{{ NAME }}` or an unclosed `{{`, is
//! copied through literally.

use std::collections::HashMap;
use std::env;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
    #[error("Environment variable '{0}' referenced by a placeholder is not set")]
    MissingEnvironmentVariable(String),
}

/// Resolves placeholders against a fixed snapshot of variables.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderResolver {
    vars: HashMap<String, String>,
}

impl PlaceholderResolver {
    /// Snapshot of the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are skipped; they
    /// could never be spliced into a `String` anyway.
    pub fn from_env() -> Self {
        let vars = env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    /// Substitute every token in `template`.
    ///
    /// Fails on the first unset variable without returning partial output.
    pub fn resolve(&self, template: &str) -> Result<String, PlaceholderError> {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];

            match token_name(after_open) {
                Some(name) => {
                    let value = self
                        .vars
                        .get(name)
                        .ok_or_else(|| PlaceholderError::MissingEnvironmentVariable(name.to_string()))?;
                    result.push_str(value);
                    rest = &after_open[name.len() + 2..];
                }
                None => {
                    // Not a token: emit one brace and rescan from the next
                    // character so `{{{A}}` still finds `{{A}}`.
                    result.push('{');
                    rest = &rest[start + 1..];
                }
            }
        }

        result.push_str(rest);
        Ok(result)
    }
}

/// Name of the token starting right after `{{`, if the text forms one.
fn token_name(after_open: &str) -> Option<&str> {
    let end = after_open.find("}}")?;
    let name = &after_open[..end];
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_');
    valid.then_some(name)
}

/// Resolve `template` against the current process environment.
pub fn resolve(template: &str) -> Result<String, PlaceholderError> {
    PlaceholderResolver::from_env().resolve(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn resolver() -> PlaceholderResolver {
        PlaceholderResolver::from_vars([("A", "x"), ("B", "y"), ("DBFILE", "test.db")])
    }

    #[test]
    fn test_resolves_multiple_tokens() {
        assert_eq!(resolver().resolve("{{A}}:{{B}}").unwrap(), "x:y");
    }

    #[test]
    fn test_missing_variable_fails_whole_resolution() {
        let resolver = PlaceholderResolver::from_vars([("A", "x")]);
        let result = resolver.resolve("{{A}}:{{B}}");
        assert_eq!(
            result,
            Err(PlaceholderError::MissingEnvironmentVariable("B".to_string()))
        );
    }

    #[test]
    fn test_repeated_token_resolves_identically() {
        assert_eq!(resolver().resolve("{{A}}-{{A}}-{{A}}").unwrap(), "x-x-x");
    }

    #[test]
    fn test_database_url() {
        assert_eq!(
            resolver().resolve("sqlite:///{{DBFILE}}").unwrap(),
            "sqlite:///test.db"
        );
    }

    #[test]
    fn test_malformed_tokens_are_literal() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("{{}}").unwrap(), "{{}}");
        assert_eq!(resolver.resolve("{{ A }}").unwrap(), "{{ A }}");
        assert_eq!(resolver.resolve("prefix {{A").unwrap(), "prefix {{A");
        assert_eq!(resolver.resolve("{{A-B}}").unwrap(), "{{A-B}}");
    }

    #[test]
    fn test_extra_braces_around_token() {
        assert_eq!(resolver().resolve("{{{A}}}").unwrap(), "{x}");
    }

    #[test]
    fn test_value_is_not_rescanned() {
        let resolver = PlaceholderResolver::from_vars([("A", "{{B}}")]);
        assert_eq!(resolver.resolve("{{A}}").unwrap(), "{{B}}");
    }

    #[test]
    fn test_empty_value_is_allowed() {
        let resolver = PlaceholderResolver::from_vars([("EMPTY", "")]);
        assert_eq!(resolver.resolve("a{{EMPTY}}b").unwrap(), "ab");
    }

    #[test]
    fn test_resolve_reads_process_environment() {
        temp_env::with_vars(
            [("PLACEHOLDER_TEST_A", Some("x")), ("PLACEHOLDER_TEST_B", None)],
            || {
                assert_eq!(resolve("{{PLACEHOLDER_TEST_A}}").unwrap(), "x");
                assert_eq!(
                    resolve("{{PLACEHOLDER_TEST_A}}:{{PLACEHOLDER_TEST_B}}"),
                    Err(PlaceholderError::MissingEnvironmentVariable(
                        "PLACEHOLDER_TEST_B".to_string()
                    ))
                );
            },
        );
    }

    proptest! {
        #[test]
        fn prop_text_without_braces_passes_through(template in "[^{}]*") {
            prop_assert_eq!(resolver().resolve(&template).unwrap(), template);
        }

        #[test]
        fn prop_resolution_is_deterministic(name in "[A-Z_]{1,12}", value in "[a-z0-9./]{0,16}") {
            let resolver = PlaceholderResolver::from_vars([(name.clone(), value.clone())]);
            let template = format!("{{{{{name}}}}}/{{{{{name}}}}}");
            let first = resolver.resolve(&template).unwrap();
            let second = resolver.resolve(&template).unwrap();
            prop_assert_eq!(&first, &format!("{value}/{value}"));
            prop_assert_eq!(first, second);
        }
    }
}
