//! Health, connectivity and configuration diagnostics.
//!
//! These handlers read the loaded [`Settings`], open a client where needed,
//! and reshape `/about`, `/about/user` and `/configuration` into flat reports.

use serde_json::{Value, json};

use crate::client::{ABOUT_PATH, FireflyClient};
use crate::config::{Settings, TOKEN_VAR, URL_VAR};
use crate::error::FireflyError;
use crate::models::{AboutResponse, ConfigurationResponse, SingleResponse, User};
use crate::response::{
    AuthConfigReport, ConnectionReport, ErrorPayload, HealthReport, SERVICE_NAME,
    ServerInfoReport,
};

/// Path of the authenticated user endpoint.
const USER_PATH: &str = "/api/v1/about/user";

/// Path of the instance configuration endpoint.
const CONFIGURATION_PATH: &str = "/api/v1/configuration";

/// Tokens shorter than this are flagged. Firefly III personal access tokens
/// are JWTs several hundred characters long.
const MIN_TOKEN_LENGTH: usize = 100;

/// Reports that the server is running. Performs no I/O.
#[must_use]
pub(crate) const fn health_check() -> HealthReport {
    HealthReport {
        status: "ok",
        service: SERVICE_NAME,
    }
}

/// Fetches instance and user information with an open client.
///
/// # Errors
///
/// Propagates any error from either request.
pub(crate) async fn connection_details(
    client: &FireflyClient,
) -> Result<ConnectionReport, FireflyError> {
    let about: AboutResponse = client.get_as(ABOUT_PATH).await?;
    let user: SingleResponse<User> = client.get_as(USER_PATH).await?;
    Ok(ConnectionReport {
        status: "connected",
        url: client.base_url().to_owned(),
        firefly_version: about.data.version,
        api_version: about.data.api_version,
        php_version: about.data.php_version,
        os: about.data.os,
        user_id: user.data.id,
        user_email: user.data.attributes.email,
        user_role: user.data.attributes.role,
        user_blocked: user.data.attributes.blocked,
    })
}

/// Verifies URL, token and connectivity by calling `/about` then
/// `/about/user`.
///
/// # Errors
///
/// Returns [`FireflyError::Validation`] before any request when settings are
/// missing, otherwise whatever the upstream calls return.
pub(crate) async fn check_connection(
    settings: &Settings,
) -> Result<ConnectionReport, FireflyError> {
    let client = FireflyClient::from_settings(settings)?;
    let outcome = connection_details(&client).await;
    client.close();
    outcome
}

/// Fetches instance information and configuration with an open client.
///
/// # Errors
///
/// Propagates any error from either request.
pub(crate) async fn server_info(client: &FireflyClient) -> Result<ServerInfoReport, FireflyError> {
    let about: AboutResponse = client.get_as(ABOUT_PATH).await?;
    let configuration: ConfigurationResponse = client.get_as(CONFIGURATION_PATH).await?;
    Ok(ServerInfoReport {
        status: "ok",
        url: client.base_url().to_owned(),
        firefly_version: about.data.version,
        api_version: about.data.api_version,
        php_version: about.data.php_version,
        os: about.data.os,
        driver: about.data.driver,
        configuration: configuration.into_map(),
    })
}

/// How bad a configuration issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Severity {
    /// Requests cannot work.
    Error,
    /// Requests may work but something looks off.
    Warning,
}

/// Inspects the settings without network access.
fn inspect(settings: &Settings) -> Vec<(Severity, String)> {
    let mut issues = Vec::new();

    match settings.url.as_deref() {
        None => issues.push((
            Severity::Error,
            format!("{URL_VAR} environment variable is not set"),
        )),
        Some(url) if !(url.starts_with("https://") || url.starts_with("http://")) => {
            issues.push((
                Severity::Error,
                format!("{URL_VAR} must start with http:// or https://"),
            ));
        }
        Some(url) if url.starts_with("http://") && !is_local(url) => {
            issues.push((
                Severity::Warning,
                format!("{URL_VAR} uses plain HTTP; the token is sent unencrypted"),
            ));
        }
        Some(_) => {}
    }

    match settings.token.as_deref() {
        None => issues.push((
            Severity::Error,
            format!("{TOKEN_VAR} environment variable is not set"),
        )),
        Some(token) => {
            if token.chars().any(char::is_whitespace) {
                issues.push((
                    Severity::Warning,
                    format!("{TOKEN_VAR} contains whitespace; check for copy/paste errors"),
                ));
            }
            if token.len() < MIN_TOKEN_LENGTH {
                issues.push((
                    Severity::Warning,
                    format!(
                        "{TOKEN_VAR} is only {} characters; personal access tokens are much longer",
                        token.len()
                    ),
                ));
            }
        }
    }

    issues.sort_by_key(|issue| issue.0);
    issues
}

/// Returns `true` for loopback hosts, where plain HTTP is acceptable.
fn is_local(url: &str) -> bool {
    let rest = url.strip_prefix("http://").unwrap_or(url);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host = match authority.rsplit_once(':') {
        Some((host, port)) if !port.contains(']') => host,
        Some(_) | None => authority,
    };
    matches!(host, "localhost" | "127.0.0.1" | "[::1]")
}

/// Opens a short-lived client and fetches `/api/v1/about`.
async fn live_test(settings: &Settings) -> Result<Value, FireflyError> {
    let client = FireflyClient::from_settings(settings)?;
    let outcome = client.test_connection().await;
    client.close();
    outcome
}

/// Validates URL scheme and token shape, optionally testing the connection.
///
/// Never fails: problems are reported in the returned report.
pub(crate) async fn check_auth_config(
    settings: &Settings,
    test_connection: bool,
) -> AuthConfigReport {
    let issues = inspect(settings);
    let has_errors = issues.iter().any(|issue| issue.0 == Severity::Error);
    let mut status = if has_errors {
        "error"
    } else if issues.is_empty() {
        "ok"
    } else {
        "warning"
    };

    let connection = if test_connection && !has_errors {
        match live_test(settings).await {
            Ok(about) => Some(json!({
                "status": "connected",
                "firefly_version": about.pointer("/data/version").cloned(),
            })),
            Err(err) => {
                status = "error";
                serde_json::to_value(ErrorPayload::from_error(&err)).ok()
            }
        }
    } else {
        None
    };

    let url_scheme_valid = settings
        .url
        .as_deref()
        .is_some_and(|url| url.starts_with("https://") || url.starts_with("http://"));

    AuthConfigReport {
        status,
        url_configured: settings.url.is_some(),
        url: settings.url.clone(),
        url_scheme_valid,
        token_configured: settings.token.is_some(),
        token_length: settings.token.as_ref().map_or(0, String::len),
        issues: issues.into_iter().map(|issue| issue.1).collect(),
        connection,
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    clippy::default_numeric_fallback,
    clippy::indexing_slicing,
    reason = "test code uses expect and indexing for readability"
)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{check_auth_config, check_connection, health_check, server_info};
    use crate::client::FireflyClient;
    use crate::config::Settings;
    use crate::error::ErrorKind;
    use crate::response::{ErrorPayload, outcome_value};

    fn long_token() -> String {
        "a".repeat(120)
    }

    fn settings_for(server: &MockServer) -> Settings {
        Settings::new(Some(server.uri()), Some(long_token()))
    }

    async fn mount_about(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/v1/about"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "version": "5.7.0",
                    "api_version": "1.5.0",
                    "php_version": "8.1.0",
                    "os": "Linux",
                    "driver": "mysql"
                }
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn health_check_is_static() {
        let value = serde_json::to_value(health_check()).expect("serializes");
        assert_eq!(value, json!({"status": "ok", "service": "firefly-iii-mcp"}));
    }

    #[tokio::test]
    async fn check_connection_reports_version_unaltered() {
        let server = MockServer::start().await;
        mount_about(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/about/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "type": "users",
                    "id": "1",
                    "attributes": {"email": "james@firefly", "role": "owner", "blocked": false}
                }
            })))
            .mount(&server)
            .await;

        let report = check_connection(&settings_for(&server))
            .await
            .expect("connected");
        assert_eq!(report.firefly_version.as_deref(), Some("5.7.0"));
        assert_eq!(report.user_id, "1");
        assert_eq!(report.user_email.as_deref(), Some("james@firefly"));
        assert_eq!(report.url, server.uri());
    }

    #[tokio::test]
    async fn check_connection_without_token_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let settings = Settings::new(Some(server.uri()), None);
        let value = outcome_value(check_connection(&settings).await).expect("serializes");
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "FIREFLY_TOKEN environment variable is not set");
        assert!(value["help"].is_string());
    }

    #[tokio::test]
    async fn check_connection_surfaces_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/about"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = check_connection(&settings_for(&server))
            .await
            .expect_err("401 must fail");
        assert_eq!(err.kind(), ErrorKind::Auth);
        let payload = serde_json::to_value(ErrorPayload::from_error(&err)).expect("serializes");
        assert_eq!(payload["kind"], "auth");
    }

    #[tokio::test]
    async fn server_info_flattens_configuration() {
        let server = MockServer::start().await;
        mount_about(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"title": "configuration.is_demo_site", "value": false, "editable": true},
                    {"title": "configuration.single_user_mode", "value": true, "editable": true}
                ]
            })))
            .mount(&server)
            .await;

        let client = FireflyClient::new(&server.uri(), "token").expect("client");
        let report = server_info(&client).await.expect("server info");
        assert_eq!(report.firefly_version.as_deref(), Some("5.7.0"));
        assert_eq!(report.driver.as_deref(), Some("mysql"));
        assert_eq!(
            report.configuration.get("configuration.single_user_mode"),
            Some(&json!(true))
        );
    }

    #[tokio::test]
    async fn auth_config_reports_missing_settings() {
        let report = check_auth_config(&Settings::default(), true).await;
        assert_eq!(report.status, "error");
        assert!(!report.url_configured);
        assert!(!report.token_configured);
        assert_eq!(report.issues.len(), 2);
        assert!(report.connection.is_none());
    }

    #[tokio::test]
    async fn auth_config_rejects_bad_scheme() {
        let settings = Settings::new(Some("firefly.example.com".to_owned()), Some(long_token()));
        let report = check_auth_config(&settings, false).await;
        assert_eq!(report.status, "error");
        assert!(!report.url_scheme_valid);
    }

    #[tokio::test]
    async fn auth_config_warns_on_short_token_and_plain_http() {
        let settings = Settings::new(
            Some("http://firefly.example.com".to_owned()),
            Some("short".to_owned()),
        );
        let report = check_auth_config(&settings, false).await;
        assert_eq!(report.status, "warning");
        assert!(report.url_scheme_valid);
        assert_eq!(report.token_length, 5);
        assert_eq!(report.issues.len(), 2);
    }

    #[tokio::test]
    async fn auth_config_warns_on_lookalike_local_hosts() {
        for url in ["http://localhost.evil.com", "http://127.0.0.1.attacker.net:8080/"] {
            let settings = Settings::new(Some(url.to_owned()), Some(long_token()));
            let report = check_auth_config(&settings, false).await;
            assert_eq!(report.status, "warning", "{url}");
            assert_eq!(report.issues.len(), 1, "{url}");
        }
    }

    #[tokio::test]
    async fn auth_config_accepts_local_http_with_port_or_path() {
        for url in ["http://127.0.0.1:8080/firefly", "http://[::1]:8080", "http://[::1]"] {
            let settings = Settings::new(Some(url.to_owned()), Some(long_token()));
            let report = check_auth_config(&settings, false).await;
            assert_eq!(report.status, "ok", "{url}");
        }
    }

    #[tokio::test]
    async fn auth_config_accepts_local_http() {
        let settings = Settings::new(
            Some("http://localhost:8080".to_owned()),
            Some(long_token()),
        );
        let report = check_auth_config(&settings, false).await;
        assert_eq!(report.status, "ok");
        assert!(report.issues.is_empty());
    }

    #[tokio::test]
    async fn auth_config_live_test_reports_version() {
        let server = MockServer::start().await;
        mount_about(&server).await;

        let report = check_auth_config(&settings_for(&server), true).await;
        assert_eq!(report.status, "ok");
        let connection = report.connection.expect("connection result");
        assert_eq!(connection["status"], "connected");
        assert_eq!(connection["firefly_version"], "5.7.0");
    }

    #[tokio::test]
    async fn auth_config_live_test_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let report = check_auth_config(&settings_for(&server), true).await;
        assert_eq!(report.status, "error");
        let connection = report.connection.expect("connection result");
        assert_eq!(connection["kind"], "auth");
    }
}
