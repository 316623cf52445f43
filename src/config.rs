//! Connection settings read from the environment.

/// Environment variable holding the Firefly III base URL.
pub(crate) const URL_VAR: &str = "FIREFLY_URL";

/// Environment variable holding the personal access token.
pub(crate) const TOKEN_VAR: &str = "FIREFLY_TOKEN";

/// Instance URL and access token, either of which may be missing.
#[derive(Clone, Default)]
pub(crate) struct Settings {
    /// Base URL of the Firefly III instance.
    pub(crate) url: Option<String>,
    /// Personal access token.
    pub(crate) token: Option<String>,
}

impl core::fmt::Debug for Settings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Settings")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_token| "<redacted>"))
            .finish()
    }
}

impl Settings {
    /// Creates settings from explicit values. Blank values count as unset.
    #[must_use]
    pub(crate) fn new(url: Option<String>, token: Option<String>) -> Self {
        Self {
            url: url.filter(|value| !value.trim().is_empty()),
            token: token.filter(|value| !value.trim().is_empty()),
        }
    }

    /// Reads `FIREFLY_URL` and `FIREFLY_TOKEN` from the process environment.
    #[must_use]
    pub(crate) fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through an arbitrary variable lookup.
    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(lookup(URL_VAR), lookup(TOKEN_VAR))
    }

    /// Returns `true` when both URL and token are present.
    #[must_use]
    pub(crate) const fn is_complete(&self) -> bool {
        self.url.is_some() && self.token.is_some()
    }
}

#[cfg(test)]
#[allow(
    clippy::missing_docs_in_private_items,
    clippy::use_debug,
    reason = "test code"
)]
mod tests {
    use super::{Settings, TOKEN_VAR, URL_VAR};

    #[test]
    fn reads_both_variables() {
        let settings = Settings::from_lookup(|key| match key {
            URL_VAR => Some("https://firefly.example.com".to_owned()),
            TOKEN_VAR => Some("test-token-123".to_owned()),
            _ => None,
        });
        assert_eq!(settings.url.as_deref(), Some("https://firefly.example.com"));
        assert_eq!(settings.token.as_deref(), Some("test-token-123"));
        assert!(settings.is_complete());
    }

    #[test]
    fn blank_values_are_unset() {
        let settings = Settings::new(Some("  ".to_owned()), Some(String::new()));
        assert!(settings.url.is_none());
        assert!(settings.token.is_none());
        assert!(!settings.is_complete());
    }

    #[test]
    fn debug_output_hides_token() {
        let settings = Settings::new(None, Some("super-secret".to_owned()));
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
