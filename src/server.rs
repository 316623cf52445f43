//! MCP server exposing Firefly III operations as tools.
//!
//! Every tool opens a short-lived [`FireflyClient`], runs one handler, closes
//! the client and renders the outcome as pretty JSON. Failures become an
//! `{"status": "error", ...}` payload rather than a protocol error.

use alloc::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;

use crate::cache::{ResponseCache, SharedCache};
use crate::client::FireflyClient;
use crate::config::Settings;
use crate::diagnostics;
use crate::error::FireflyError;
use crate::params::{
    CheckAuthConfigParams, CreateTransactionParams, ListAccountsParams, ListTransactionsParams,
    PageParams, ResourceIdParams, UpdateTransactionParams,
};
use crate::resources;
use crate::response::{CacheClearedResponse, SERVICE_NAME, outcome_value};

/// MCP server for one Firefly III instance.
#[derive(Clone)]
pub(crate) struct FireflyMcpServer {
    /// Connection settings loaded at startup.
    settings: Arc<Settings>,
    /// Cache shared by reference-data tools.
    cache: SharedCache,
    /// Tool router for dispatching MCP tool calls.
    tool_router: ToolRouter<Self>,
}

impl core::fmt::Debug for FireflyMcpServer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FireflyMcpServer")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Serializes a value to a pretty-printed JSON string for tool output.
fn to_json_text<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|err| {
        McpError::internal_error(format!("failed to serialize response: {err}"), None)
    })
}

/// Creates a successful tool result containing JSON text.
fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = to_json_text(value)?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Renders a handler outcome, turning errors into a structured payload.
fn render<T: Serialize>(outcome: Result<T, FireflyError>) -> Result<CallToolResult, McpError> {
    let value = outcome_value(outcome).map_err(|err| {
        McpError::internal_error(format!("failed to serialize response: {err}"), None)
    })?;
    json_result(&value)
}

/// Renders a failure that happened before any handler ran.
fn render_failure(err: FireflyError) -> Result<CallToolResult, McpError> {
    render::<()>(Err(err))
}

#[tool_router]
impl FireflyMcpServer {
    /// Creates a server with a fresh response cache.
    pub(crate) fn new(settings: Settings) -> Self {
        Self::with_cache(settings, ResponseCache::shared())
    }

    /// Creates a server sharing an existing cache.
    pub(crate) fn with_cache(settings: Settings, cache: SharedCache) -> Self {
        Self {
            settings: Arc::new(settings),
            cache,
            tool_router: Self::tool_router(),
        }
    }

    /// Opens a client from the loaded settings, attaching the cache if asked.
    fn open_client(&self, cached: bool) -> Result<FireflyClient, FireflyError> {
        let client = FireflyClient::from_settings(&self.settings)?;
        tracing::debug!(cached, "opened Firefly III client");
        if cached {
            Ok(client.with_cache(Arc::clone(&self.cache)))
        } else {
            Ok(client)
        }
    }

    // ── Diagnostics ─────────────────────────────────────────────────

    /// Reports that the server is up.
    #[tool(description = "Check that the Firefly III MCP server is running. Makes no API calls")]
    #[allow(clippy::unused_async, reason = "tool handlers are dispatched as futures")]
    async fn health_check(&self) -> Result<CallToolResult, McpError> {
        json_result(&diagnostics::health_check())
    }

    /// Verifies connectivity and credentials.
    #[tool(
        description = "Test the connection to Firefly III and report the instance version and the authenticated user"
    )]
    async fn check_connection(&self) -> Result<CallToolResult, McpError> {
        render(diagnostics::check_connection(&self.settings).await)
    }

    /// Reports instance version and configuration.
    #[tool(
        description = "Get Firefly III server information: versions, operating system, database driver and instance configuration"
    )]
    async fn get_server_info(&self) -> Result<CallToolResult, McpError> {
        let client = match self.open_client(true) {
            Ok(client) => client,
            Err(err) => return render_failure(err),
        };
        let outcome = diagnostics::server_info(&client).await;
        client.close();
        render(outcome)
    }

    /// Diagnoses URL and token configuration.
    #[tool(
        description = "Diagnose FIREFLY_URL and FIREFLY_TOKEN configuration. Set test_connection=true to also try a live request"
    )]
    async fn check_auth_config(
        &self,
        params: Parameters<CheckAuthConfigParams>,
    ) -> Result<CallToolResult, McpError> {
        let report = diagnostics::check_auth_config(&self.settings, params.0.test_connection).await;
        json_result(&report)
    }

    /// Drops every cached response.
    #[tool(
        description = "Clear cached reference data and server info so the next call fetches fresh values"
    )]
    async fn clear_cache(&self) -> Result<CallToolResult, McpError> {
        let cleared = self.cache.lock().await.clear();
        tracing::info!(cleared, "response cache cleared");
        json_result(&CacheClearedResponse {
            status: "ok",
            cleared,
        })
    }

    // ── Accounts ────────────────────────────────────────────────────

    /// Lists accounts.
    #[tool(
        description = "List accounts, optionally filtered by type (all, asset, expense, revenue, liability, cash), with page and limit"
    )]
    async fn list_accounts(
        &self,
        params: Parameters<ListAccountsParams>,
    ) -> Result<CallToolResult, McpError> {
        let client = match self.open_client(false) {
            Ok(client) => client,
            Err(err) => return render_failure(err),
        };
        let outcome = resources::list_accounts(&client, &params.0).await;
        client.close();
        render(outcome)
    }

    /// Fetches one account.
    #[tool(description = "Get one account by ID, including its current balance")]
    async fn get_account(
        &self,
        params: Parameters<ResourceIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let client = match self.open_client(false) {
            Ok(client) => client,
            Err(err) => return render_failure(err),
        };
        let outcome = resources::get_account(&client, &params.0.id).await;
        client.close();
        render(outcome)
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Lists transactions.
    #[tool(
        description = "List transactions with an optional date range (YYYY-MM-DD), type filter, page and limit"
    )]
    async fn list_transactions(
        &self,
        params: Parameters<ListTransactionsParams>,
    ) -> Result<CallToolResult, McpError> {
        let client = match self.open_client(false) {
            Ok(client) => client,
            Err(err) => return render_failure(err),
        };
        let outcome = resources::list_transactions(&client, &params.0).await;
        client.close();
        render(outcome)
    }

    /// Fetches one transaction.
    #[tool(description = "Get one transaction group by ID, including all of its splits")]
    async fn get_transaction(
        &self,
        params: Parameters<ResourceIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let client = match self.open_client(false) {
            Ok(client) => client,
            Err(err) => return render_failure(err),
        };
        let outcome = resources::get_transaction(&client, &params.0.id).await;
        client.close();
        render(outcome)
    }

    /// Creates a transaction.
    #[tool(
        description = "Create a withdrawal, deposit or transfer. Requires description, positive amount and date (YYYY-MM-DD); accounts may be given by ID or name"
    )]
    async fn create_transaction(
        &self,
        params: Parameters<CreateTransactionParams>,
    ) -> Result<CallToolResult, McpError> {
        let client = match self.open_client(false) {
            Ok(client) => client,
            Err(err) => return render_failure(err),
        };
        let outcome = resources::create_transaction(&client, params.0).await;
        client.close();
        render(outcome)
    }

    /// Updates a transaction.
    #[tool(
        description = "Update a single-split transaction by ID. Only the given fields (description, amount, date, category_name, budget_name, tags, notes) change"
    )]
    async fn update_transaction(
        &self,
        params: Parameters<UpdateTransactionParams>,
    ) -> Result<CallToolResult, McpError> {
        let client = match self.open_client(false) {
            Ok(client) => client,
            Err(err) => return render_failure(err),
        };
        let outcome = resources::update_transaction(&client, params.0).await;
        client.close();
        render(outcome)
    }

    /// Deletes a transaction.
    #[tool(description = "Delete a transaction group by ID. This cannot be undone")]
    async fn delete_transaction(
        &self,
        params: Parameters<ResourceIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let client = match self.open_client(false) {
            Ok(client) => client,
            Err(err) => return render_failure(err),
        };
        let outcome = resources::delete_transaction(&client, &params.0.id).await;
        client.close();
        render(outcome)
    }

    // ── Reference data ──────────────────────────────────────────────

    /// Lists categories.
    #[tool(description = "List categories, with optional page and limit")]
    async fn list_categories(
        &self,
        params: Parameters<PageParams>,
    ) -> Result<CallToolResult, McpError> {
        let client = match self.open_client(true) {
            Ok(client) => client,
            Err(err) => return render_failure(err),
        };
        let outcome = resources::list_categories(&client, &params.0).await;
        client.close();
        render(outcome)
    }

    /// Lists tags.
    #[tool(description = "List tags, with optional page and limit")]
    async fn list_tags(&self, params: Parameters<PageParams>) -> Result<CallToolResult, McpError> {
        let client = match self.open_client(true) {
            Ok(client) => client,
            Err(err) => return render_failure(err),
        };
        let outcome = resources::list_tags(&client, &params.0).await;
        client.close();
        render(outcome)
    }

    /// Lists budgets.
    #[tool(
        description = "List budgets with their automatic budget settings, with optional page and limit"
    )]
    async fn list_budgets(
        &self,
        params: Parameters<PageParams>,
    ) -> Result<CallToolResult, McpError> {
        let client = match self.open_client(true) {
            Ok(client) => client,
            Err(err) => return render_failure(err),
        };
        let outcome = resources::list_budgets(&client, &params.0).await;
        client.close();
        render(outcome)
    }

    /// Lists currencies.
    #[tool(description = "List currencies, with optional page and limit")]
    async fn list_currencies(
        &self,
        params: Parameters<PageParams>,
    ) -> Result<CallToolResult, McpError> {
        let client = match self.open_client(true) {
            Ok(client) => client,
            Err(err) => return render_failure(err),
        };
        let outcome = resources::list_currencies(&client, &params.0).await;
        client.close();
        render(outcome)
    }
}

#[tool_handler]
impl ServerHandler for FireflyMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Firefly III personal finance MCP server. \
                 Run check_connection or check_auth_config first if calls fail, \
                 then query accounts, transactions, categories, tags, budgets and currencies."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVICE_NAME.to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                ..Default::default()
            },
            ..Default::default()
        }
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
    use rmcp::ServerHandler;
    use rmcp::handler::server::wrapper::Parameters;
    use rmcp::model::CallToolResult;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::FireflyMcpServer;
    use crate::config::Settings;
    use crate::params::{CreateTransactionParams, PageParams, ResourceIdParams};

    fn payload(result: &CallToolResult) -> Value {
        let raw = serde_json::to_value(result).expect("serializes");
        let text = raw["content"][0]["text"].as_str().expect("text content");
        serde_json::from_str(text).expect("tool output is JSON")
    }

    fn server_for(mock: &MockServer) -> FireflyMcpServer {
        FireflyMcpServer::new(Settings::new(Some(mock.uri()), Some("a".repeat(120))))
    }

    #[test]
    fn registers_every_tool() {
        let mut names: Vec<String> = FireflyMcpServer::tool_router()
            .list_all()
            .into_iter()
            .map(|tool| tool.name.into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "check_auth_config",
                "check_connection",
                "clear_cache",
                "create_transaction",
                "delete_transaction",
                "get_account",
                "get_server_info",
                "get_transaction",
                "health_check",
                "list_accounts",
                "list_budgets",
                "list_categories",
                "list_currencies",
                "list_tags",
                "list_transactions",
                "update_transaction",
            ]
        );
    }

    #[test]
    fn server_info_names_the_service() {
        let info = FireflyMcpServer::new(Settings::default()).get_info();
        assert_eq!(info.server_info.name, "firefly-iii-mcp");
        assert!(info.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn health_check_needs_no_settings() {
        let server = FireflyMcpServer::new(Settings::default());
        let result = server.health_check().await.expect("tool result");
        assert_eq!(
            payload(&result),
            json!({"status": "ok", "service": "firefly-iii-mcp"})
        );
    }

    #[tokio::test]
    async fn missing_settings_render_error_payload() {
        let server = FireflyMcpServer::new(Settings::new(
            Some("https://firefly.example.com".to_owned()),
            None,
        ));
        let result = server
            .list_categories(Parameters(PageParams::default()))
            .await
            .expect("tool result");
        let value = payload(&result);
        assert_eq!(value["status"], "error");
        assert_eq!(value["kind"], "validation");
        assert_eq!(value["error"], "FIREFLY_TOKEN environment variable is not set");
    }

    #[tokio::test]
    async fn reference_tools_share_the_cache() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"type": "tags", "id": "1", "attributes": {"tag": "travel"}}]
            })))
            .expect(1)
            .mount(&mock)
            .await;

        let server = server_for(&mock);
        let first = server
            .list_tags(Parameters(PageParams::default()))
            .await
            .expect("first call");
        let second = server
            .list_tags(Parameters(PageParams::default()))
            .await
            .expect("second call");
        assert_eq!(payload(&first)["items"][0]["tag"], "travel");
        assert_eq!(payload(&first), payload(&second));
    }

    #[tokio::test]
    async fn clear_cache_forces_refetch() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/currencies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(2)
            .mount(&mock)
            .await;

        let server = server_for(&mock);
        let _first = server
            .list_currencies(Parameters(PageParams::default()))
            .await
            .expect("first call");
        let cleared = server.clear_cache().await.expect("clear");
        assert_eq!(payload(&cleared), json!({"status": "ok", "cleared": 1}));
        let _second = server
            .list_currencies(Parameters(PageParams::default()))
            .await
            .expect("second call");
    }

    fn account_body(balance: &str) -> Value {
        json!({
            "data": {"type": "accounts", "id": "1", "attributes": {
                "name": "Checking", "type": "asset", "current_balance": balance
            }}
        })
    }

    #[tokio::test]
    async fn account_read_after_write_reaches_upstream() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(account_body("100.00")))
            .up_to_n_times(1)
            .mount(&mock)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(account_body("95.80")))
            .mount(&mock)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/transactions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"type": "transactions", "id": "5", "attributes": {
                    "transactions": [{
                        "type": "withdrawal",
                        "date": "2024-06-15T00:00:00+00:00",
                        "amount": "4.20",
                        "description": "Coffee"
                    }]
                }}
            })))
            .expect(1)
            .mount(&mock)
            .await;

        let server = server_for(&mock);
        let account = || Parameters(ResourceIdParams { id: "1".to_owned() });
        let before = server.get_account(account()).await.expect("first read");
        assert_eq!(payload(&before)["current_balance"], "100.00");

        let params: CreateTransactionParams = serde_json::from_value(json!({
            "type": "withdrawal",
            "description": "Coffee",
            "amount": "4.20",
            "date": "2024-06-15",
            "source_id": "1",
            "destination_name": "Cafe"
        }))
        .expect("valid params");
        let created = server
            .create_transaction(Parameters(params))
            .await
            .expect("tool result");
        assert_eq!(payload(&created)["status"], "created");

        let after = server.get_account(account()).await.expect("second read");
        assert_eq!(payload(&after)["current_balance"], "95.80");
    }

    #[tokio::test]
    async fn upstream_failure_renders_error_payload() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock)
            .await;

        let result = server_for(&mock)
            .check_connection()
            .await
            .expect("tool result");
        let value = payload(&result);
        assert_eq!(value["status"], "error");
        assert_eq!(value["kind"], "auth");
        assert_eq!(value["error"], "Authentication failed. Check your API token.");
    }
}
