//! Error family for Firefly III requests and the status/transport classifier.
//!
//! Every failure surfaced by the client is a [`FireflyError`]; callers
//! discriminate with a single [`FireflyError::kind`] check.

use serde::Serialize;
use serde_json::Value;

/// Coarse error category, used by tool handlers to pick user-facing help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ErrorKind {
    /// The upstream could not be reached.
    Connection,
    /// The token was rejected or lacks permissions.
    Auth,
    /// The upstream answered with an error status or an unusable body.
    Api,
    /// Required configuration or input is missing or malformed.
    Validation,
    /// Anything else.
    Other,
}

/// Errors raised while talking to a Firefly III instance.
#[derive(Debug, thiserror::Error)]
pub(crate) enum FireflyError {
    /// Transport-level failure: connect error, timeout, or broken exchange.
    #[error("{0}")]
    Connection(String),

    /// HTTP 401 or 403.
    #[error("{0}")]
    Auth(String),

    /// HTTP error status or an unparseable success body.
    #[error("{message}")]
    Api {
        /// Human-readable message, taken from the upstream body when present.
        message: String,
        /// HTTP status code.
        status: u16,
        /// Parsed upstream error body, if it was JSON.
        body: Option<Value>,
    },

    /// Missing configuration or malformed tool input.
    #[error("{0}")]
    Validation(String),

    /// Unexpected failure, e.g. a response that does not match its schema.
    #[error("{0}")]
    Other(String),
}

impl FireflyError {
    /// Returns the category of this error.
    #[must_use]
    pub(crate) const fn kind(&self) -> ErrorKind {
        match *self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Api { .. } => ErrorKind::Api,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Returns the HTTP status code for API errors.
    #[must_use]
    pub(crate) const fn status_code(&self) -> Option<u16> {
        match *self {
            Self::Api { status, .. } => Some(status),
            Self::Connection(_) | Self::Auth(_) | Self::Validation(_) | Self::Other(_) => None,
        }
    }

    /// Returns the parsed upstream body for API errors.
    #[must_use]
    #[allow(clippy::ref_patterns, reason = "borrows the body out of a dereferenced match")]
    pub(crate) const fn body(&self) -> Option<&Value> {
        match *self {
            Self::Api { ref body, .. } => body.as_ref(),
            Self::Connection(_) | Self::Auth(_) | Self::Validation(_) | Self::Other(_) => None,
        }
    }
}

/// Maps an HTTP status and raw body to the parsed JSON value or an error.
///
/// # Errors
///
/// Returns [`FireflyError::Auth`] for 401/403, [`FireflyError::Api`] for any
/// other status >= 400 and for success bodies that are not valid JSON.
pub(crate) fn classify_status(status: u16, body: &[u8]) -> Result<Value, FireflyError> {
    match status {
        401 => Err(FireflyError::Auth(
            "Authentication failed. Check your API token.".to_owned(),
        )),
        403 => Err(FireflyError::Auth(
            "Permission denied. Check your API token permissions.".to_owned(),
        )),
        400..=u16::MAX => {
            let parsed: Option<Value> = serde_json::from_slice(body).ok();
            let message = parsed
                .as_ref()
                .and_then(|value| value.get("message"))
                .and_then(Value::as_str)
                .map_or_else(|| format!("API error: {status}"), ToOwned::to_owned);
            Err(FireflyError::Api {
                message,
                status,
                body: parsed,
            })
        }
        _ => serde_json::from_slice(body).map_err(|err| {
            tracing::error!(%err, status, "failed to parse JSON response");
            FireflyError::Api {
                message: "Invalid JSON response from API".to_owned(),
                status,
                body: None,
            }
        }),
    }
}

/// Maps a transport failure to a connection error.
#[allow(clippy::needless_pass_by_value, reason = "map_err passes by value")]
pub(crate) fn classify_transport(err: reqwest::Error, base_url: &str) -> FireflyError {
    if err.is_timeout() {
        tracing::error!("request timed out");
        FireflyError::Connection("Request timed out".to_owned())
    } else if err.is_connect() {
        tracing::error!(%err, "connection failed");
        FireflyError::Connection(format!("Failed to connect to {base_url}"))
    } else {
        tracing::error!(%err, "HTTP error");
        FireflyError::Connection(format!("HTTP error: {err}"))
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    clippy::default_numeric_fallback,
    clippy::panic,
    clippy::use_debug,
    clippy::wildcard_enum_match_arm,
    reason = "test code uses expect and panics for readability"
)]
mod tests {
    use serde_json::Value;

    use super::{ErrorKind, FireflyError, classify_status};

    #[test]
    fn success_body_is_returned_unchanged() {
        let value = classify_status(200, br#"{"data": {"version": "5.7.0"}}"#)
            .expect("200 with JSON should succeed");
        assert_eq!(
            value.pointer("/data/version").and_then(Value::as_str),
            Some("5.7.0")
        );
    }

    #[test]
    fn unauthorized_is_auth_error() {
        let err = classify_status(401, b"").expect_err("401 should fail");
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert!(err.to_string().to_lowercase().contains("authentication failed"));
    }

    #[test]
    fn forbidden_is_auth_error_with_distinct_message() {
        let err = classify_status(403, b"{}").expect_err("403 should fail");
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert!(err.to_string().to_lowercase().contains("permission denied"));
        assert!(!err.to_string().to_lowercase().contains("authentication failed"));
    }

    #[test]
    fn every_other_error_status_is_api_error() {
        for status in (400_u16..600).filter(|s| *s != 401 && *s != 403) {
            let err = classify_status(status, b"not json").expect_err("error status");
            assert_eq!(err.kind(), ErrorKind::Api);
            assert_eq!(err.status_code(), Some(status));
            assert_eq!(err.to_string(), format!("API error: {status}"));
        }
    }

    #[test]
    fn api_error_uses_upstream_message() {
        let err = classify_status(422, br#"{"message": "Invalid request data", "errors": {}}"#)
            .expect_err("422 should fail");
        match err {
            FireflyError::Api {
                message,
                status,
                body,
            } => {
                assert_eq!(message, "Invalid request data");
                assert_eq!(status, 422);
                let kept = body.expect("JSON body should be kept");
                assert!(kept.get("errors").is_some());
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn api_error_without_message_field_falls_back() {
        let err = classify_status(404, br#"{"exception": "NotFound"}"#).expect_err("404");
        assert_eq!(err.to_string(), "API error: 404");
        match err {
            FireflyError::Api { body, .. } => assert!(body.is_some()),
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_json_on_success_is_api_error() {
        let err = classify_status(200, b"<html>").expect_err("bad JSON should fail");
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status_code(), Some(200));
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn kinds_are_distinct() {
        assert_eq!(FireflyError::Connection("x".to_owned()).kind(), ErrorKind::Connection);
        assert_eq!(FireflyError::Validation("x".to_owned()).kind(), ErrorKind::Validation);
        assert_eq!(FireflyError::Other("x".to_owned()).kind(), ErrorKind::Other);
        assert_eq!(FireflyError::Other("x".to_owned()).status_code(), None);
    }
}
