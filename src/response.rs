//! Flattened response structs for MCP tool outputs.
//!
//! These strip the JSON:API envelopes down to the fields an LLM assistant
//! actually needs, and give failed calls a uniform error shape.

use alloc::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{ErrorKind, FireflyError};
use crate::models::{
    Account, AccountRole, ArrayResponse, AutoBudgetPeriod, AutoBudgetType, Budget, Category,
    Currency, Pagination, Resource, ShortAccountType, Tag, TransactionGroup, TransactionSplit,
    TransactionType,
};

/// Service name reported by `health_check`.
pub(crate) const SERVICE_NAME: &str = "firefly-iii-mcp";

/// Structured payload returned instead of a protocol error.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ErrorPayload {
    /// Always `"error"`.
    status: &'static str,
    /// Error category.
    kind: ErrorKind,
    /// Error message.
    error: String,
    /// Suggested next step for the user.
    help: &'static str,
    /// HTTP status for API errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    /// Upstream error body for API errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ErrorPayload {
    /// Builds the payload for `err`.
    pub(crate) fn from_error(err: &FireflyError) -> Self {
        Self {
            status: "error",
            kind: err.kind(),
            error: err.to_string(),
            help: help_for(err.kind()),
            status_code: err.status_code(),
            details: err.body().cloned(),
        }
    }
}

/// User-facing hint for each error category.
const fn help_for(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Connection => {
            "Check that FIREFLY_URL points at a reachable Firefly III instance."
        }
        ErrorKind::Auth => {
            "Check that FIREFLY_TOKEN is a valid Personal Access Token with the required permissions."
        }
        ErrorKind::Api => "Firefly III rejected the request; see the error and details fields.",
        ErrorKind::Validation => {
            "Set FIREFLY_URL and FIREFLY_TOKEN and check the tool arguments."
        }
        ErrorKind::Other => "Unexpected error; check the server logs for details.",
    }
}

/// Converts a handler outcome into the JSON returned to the client.
///
/// # Errors
///
/// Returns an error only if the success value cannot be serialized.
pub(crate) fn outcome_value<T: Serialize>(
    outcome: Result<T, FireflyError>,
) -> Result<Value, serde_json::Error> {
    match outcome {
        Ok(value) => serde_json::to_value(value),
        Err(err) => {
            tracing::warn!(kind = ?err.kind(), %err, "tool call failed");
            serde_json::to_value(ErrorPayload::from_error(&err))
        }
    }
}

/// Output of `health_check`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct HealthReport {
    /// Always `"ok"`.
    pub(crate) status: &'static str,
    /// Service name.
    pub(crate) service: &'static str,
}

/// Output of `check_connection`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ConnectionReport {
    /// Always `"connected"`.
    pub(crate) status: &'static str,
    /// Instance URL.
    pub(crate) url: String,
    /// Firefly III version.
    pub(crate) firefly_version: Option<String>,
    /// API version.
    pub(crate) api_version: Option<String>,
    /// PHP version.
    pub(crate) php_version: Option<String>,
    /// Operating system.
    pub(crate) os: Option<String>,
    /// Authenticated user ID.
    pub(crate) user_id: String,
    /// Authenticated user e-mail.
    pub(crate) user_email: Option<String>,
    /// Authenticated user role.
    pub(crate) user_role: Option<String>,
    /// Whether the user is blocked.
    pub(crate) user_blocked: Option<bool>,
}

/// Output of `get_server_info`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ServerInfoReport {
    /// Always `"ok"`.
    pub(crate) status: &'static str,
    /// Instance URL.
    pub(crate) url: String,
    /// Firefly III version.
    pub(crate) firefly_version: Option<String>,
    /// API version.
    pub(crate) api_version: Option<String>,
    /// PHP version.
    pub(crate) php_version: Option<String>,
    /// Operating system.
    pub(crate) os: Option<String>,
    /// Database driver.
    pub(crate) driver: Option<String>,
    /// Instance configuration, `title -> value`.
    pub(crate) configuration: BTreeMap<String, Value>,
}

/// Output of `check_auth_config`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct AuthConfigReport {
    /// `"ok"`, `"warning"` or `"error"`.
    pub(crate) status: &'static str,
    /// Whether `FIREFLY_URL` is set.
    pub(crate) url_configured: bool,
    /// The configured URL.
    pub(crate) url: Option<String>,
    /// Whether the URL uses `http://` or `https://`.
    pub(crate) url_scheme_valid: bool,
    /// Whether `FIREFLY_TOKEN` is set.
    pub(crate) token_configured: bool,
    /// Token length; the token itself is never echoed.
    pub(crate) token_length: usize,
    /// Problems found, most severe first.
    pub(crate) issues: Vec<String>,
    /// Live connection result, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) connection: Option<Value>,
}

/// A page of flattened resources.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ListResponse<T> {
    /// Number of items on this page.
    count: usize,
    /// Items.
    items: Vec<T>,
    /// Page counters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<Pagination>,
}

impl<T> ListResponse<T> {
    /// Flattens every resource in `response` with `convert`.
    pub(crate) fn from_array<A, F>(response: &ArrayResponse<A>, convert: F) -> Self
    where
        F: Fn(&Resource<A>) -> T,
    {
        let items: Vec<T> = response.data.iter().map(convert).collect();
        Self {
            count: items.len(),
            items,
            pagination: response.meta.as_ref().and_then(|meta| meta.pagination),
        }
    }
}

/// Flattened account.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct AccountResponse {
    /// Account ID.
    id: String,
    /// Display name.
    name: String,
    /// Account kind.
    account_type: ShortAccountType,
    /// Asset role.
    role: Option<AccountRole>,
    /// Whether the account is active.
    active: bool,
    /// Currency code.
    currency: Option<String>,
    /// Currency symbol.
    currency_symbol: Option<String>,
    /// Balance as a decimal string.
    current_balance: Option<String>,
    /// Account number.
    account_number: Option<String>,
    /// IBAN.
    iban: Option<String>,
    /// Notes.
    notes: Option<String>,
    /// Creation date, `YYYY-MM-DD`.
    created: Option<String>,
}

impl AccountResponse {
    /// Flattens an account resource.
    pub(crate) fn from_resource(resource: &Resource<Account>) -> Self {
        let account = &resource.attributes;
        Self {
            id: resource.id.clone(),
            name: account.name.clone(),
            account_type: account.account_type,
            role: account.account_role,
            active: account.active,
            currency: account.currency_code.clone(),
            currency_symbol: account.currency_symbol.clone(),
            current_balance: account.current_balance.clone(),
            account_number: account.account_number.clone(),
            iban: account.iban.clone(),
            notes: account.notes.clone(),
            created: account
                .created_at
                .map(|stamp| stamp.date_naive().to_string()),
        }
    }
}

/// Flattened transaction split.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SplitResponse {
    /// Journal ID.
    journal_id: Option<String>,
    /// Split kind.
    transaction_type: TransactionType,
    /// Booking date, `YYYY-MM-DD`.
    date: String,
    /// Amount as a decimal string.
    amount: String,
    /// Currency code.
    currency: Option<String>,
    /// Description.
    description: String,
    /// Source account name, or ID when the name is missing.
    source: Option<String>,
    /// Destination account name, or ID when the name is missing.
    destination: Option<String>,
    /// Category name.
    category: Option<String>,
    /// Budget name.
    budget: Option<String>,
    /// Tag names.
    tags: Vec<String>,
    /// Notes.
    notes: Option<String>,
}

impl SplitResponse {
    /// Flattens one split.
    fn from_split(split: &TransactionSplit) -> Self {
        Self {
            journal_id: split.transaction_journal_id.clone(),
            transaction_type: split.transaction_type,
            date: split.date.date_naive().to_string(),
            amount: split.amount.clone(),
            currency: split.currency_code.clone(),
            description: split.description.clone(),
            source: split
                .source_name
                .clone()
                .or_else(|| split.source_id.clone()),
            destination: split
                .destination_name
                .clone()
                .or_else(|| split.destination_id.clone()),
            category: split.category_name.clone(),
            budget: split.budget_name.clone(),
            tags: split.tags.clone().unwrap_or_default(),
            notes: split.notes.clone(),
        }
    }
}

/// Flattened transaction group.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TransactionResponse {
    /// Group ID.
    id: String,
    /// Group title.
    group_title: Option<String>,
    /// Splits.
    splits: Vec<SplitResponse>,
}

impl TransactionResponse {
    /// Group ID.
    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    /// Flattens a transaction group resource.
    pub(crate) fn from_resource(resource: &Resource<TransactionGroup>) -> Self {
        Self {
            id: resource.id.clone(),
            group_title: resource.attributes.group_title.clone(),
            splits: resource
                .attributes
                .transactions
                .iter()
                .map(SplitResponse::from_split)
                .collect(),
        }
    }
}

/// Flattened category.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CategoryResponse {
    /// Category ID.
    id: String,
    /// Name.
    name: String,
    /// Notes.
    notes: Option<String>,
}

impl CategoryResponse {
    /// Flattens a category resource.
    pub(crate) fn from_resource(resource: &Resource<Category>) -> Self {
        Self {
            id: resource.id.clone(),
            name: resource.attributes.name.clone(),
            notes: resource.attributes.notes.clone(),
        }
    }
}

/// Flattened tag.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TagResponse {
    /// Tag ID.
    id: String,
    /// Tag text.
    tag: String,
    /// Optional date.
    date: Option<String>,
    /// Description.
    description: Option<String>,
}

impl TagResponse {
    /// Flattens a tag resource.
    pub(crate) fn from_resource(resource: &Resource<Tag>) -> Self {
        Self {
            id: resource.id.clone(),
            tag: resource.attributes.tag.clone(),
            date: resource.attributes.date.clone(),
            description: resource.attributes.description.clone(),
        }
    }
}

/// Flattened budget.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct BudgetResponse {
    /// Budget ID.
    id: String,
    /// Name.
    name: String,
    /// Whether the budget is active.
    active: bool,
    /// Automatic budget behaviour.
    auto_budget_type: Option<AutoBudgetType>,
    /// Automatic budget amount.
    auto_budget_amount: Option<String>,
    /// Automatic budget period.
    auto_budget_period: Option<AutoBudgetPeriod>,
    /// Notes.
    notes: Option<String>,
}

impl BudgetResponse {
    /// Flattens a budget resource.
    pub(crate) fn from_resource(resource: &Resource<Budget>) -> Self {
        let budget = &resource.attributes;
        Self {
            id: resource.id.clone(),
            name: budget.name.clone(),
            active: budget.active,
            auto_budget_type: budget.auto_budget_type,
            auto_budget_amount: budget.auto_budget_amount.clone(),
            auto_budget_period: budget.auto_budget_period,
            notes: budget.notes.clone(),
        }
    }
}

/// Flattened currency.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CurrencyResponse {
    /// Currency ID.
    id: String,
    /// ISO code.
    code: String,
    /// Display name.
    name: String,
    /// Symbol.
    symbol: String,
    /// Decimal places.
    decimal_places: u8,
    /// Whether the currency is enabled.
    enabled: Option<bool>,
    /// Whether this is the default currency.
    default: Option<bool>,
}

impl CurrencyResponse {
    /// Flattens a currency resource.
    pub(crate) fn from_resource(resource: &Resource<Currency>) -> Self {
        let currency = &resource.attributes;
        Self {
            id: resource.id.clone(),
            code: currency.code.clone(),
            name: currency.name.clone(),
            symbol: currency.symbol.clone(),
            decimal_places: currency.decimal_places,
            enabled: currency.enabled,
            default: currency.default,
        }
    }
}

/// Output of `create_transaction` and `update_transaction`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StoredTransactionResponse {
    /// `"created"` or `"updated"`.
    status: &'static str,
    /// The stored transaction as returned by the API.
    transaction: TransactionResponse,
}

impl StoredTransactionResponse {
    /// Wraps a newly created transaction.
    pub(crate) const fn created(transaction: TransactionResponse) -> Self {
        Self {
            status: "created",
            transaction,
        }
    }

    /// Wraps an updated transaction.
    pub(crate) const fn updated(transaction: TransactionResponse) -> Self {
        Self {
            status: "updated",
            transaction,
        }
    }
}

/// Output of `clear_cache`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CacheClearedResponse {
    /// Always `"ok"`.
    pub(crate) status: &'static str,
    /// Number of entries dropped.
    pub(crate) cleared: usize,
}

/// Output of `delete_transaction`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DeletedResponse {
    /// Always `"deleted"`.
    status: &'static str,
    /// ID of the removed resource.
    id: String,
}

impl DeletedResponse {
    /// Reports a deletion.
    pub(crate) const fn new(id: String) -> Self {
        Self {
            status: "deleted",
            id,
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
    use serde_json::json;

    use super::{
        AccountResponse, ErrorPayload, ListResponse, TransactionResponse, outcome_value,
    };
    use crate::error::FireflyError;
    use crate::models::{Account, ArrayResponse, SingleResponse, TransactionGroup};

    #[test]
    fn validation_error_payload_shape() {
        let err = FireflyError::Validation("FIREFLY_TOKEN environment variable is not set".to_owned());
        let value = serde_json::to_value(ErrorPayload::from_error(&err)).expect("serializes");
        assert_eq!(value["status"], "error");
        assert_eq!(value["kind"], "validation");
        assert!(
            value["error"]
                .as_str()
                .expect("error string")
                .contains("FIREFLY_TOKEN")
        );
        assert!(value["help"].is_string());
        assert!(value.get("status_code").is_none());
    }

    #[test]
    fn api_error_payload_keeps_status_and_details() {
        let err = FireflyError::Api {
            message: "The given data was invalid.".to_owned(),
            status: 422,
            body: Some(json!({"errors": {"amount": ["required"]}})),
        };
        let value = serde_json::to_value(ErrorPayload::from_error(&err)).expect("serializes");
        assert_eq!(value["status_code"], 422);
        assert_eq!(value["details"]["errors"]["amount"][0], "required");
    }

    #[test]
    fn outcome_value_passes_success_through() {
        let value = outcome_value(Ok(json!({"status": "ok"}))).expect("serializes");
        assert_eq!(value, json!({"status": "ok"}));
    }

    #[test]
    fn outcome_value_converts_errors() {
        let value = outcome_value::<serde_json::Value>(Err(FireflyError::Auth(
            "Authentication failed. Check your API token.".to_owned(),
        )))
        .expect("serializes");
        assert_eq!(value["status"], "error");
        assert_eq!(value["kind"], "auth");
    }

    #[test]
    fn account_list_flattens_envelopes() {
        let response: ArrayResponse<Account> = serde_json::from_value(json!({
            "data": [{
                "type": "accounts",
                "id": "1",
                "attributes": {
                    "name": "Checking",
                    "type": "asset",
                    "account_role": "defaultAsset",
                    "currency_code": "EUR",
                    "current_balance": "123.45",
                    "created_at": "2024-03-01T12:00:00+01:00"
                }
            }],
            "meta": {"pagination": {
                "total": 1, "count": 1, "per_page": 50, "current_page": 1, "total_pages": 1
            }}
        }))
        .expect("account list");
        let list = ListResponse::from_array(&response, AccountResponse::from_resource);
        let value = serde_json::to_value(&list).expect("serializes");
        assert_eq!(value["count"], 1);
        assert_eq!(value["items"][0]["name"], "Checking");
        assert_eq!(value["items"][0]["account_type"], "asset");
        assert_eq!(value["items"][0]["role"], "defaultAsset");
        assert_eq!(value["items"][0]["current_balance"], "123.45");
        assert_eq!(value["items"][0]["created"], "2024-03-01");
        assert_eq!(value["pagination"]["total_pages"], 1);
    }

    #[test]
    fn transaction_split_prefers_names_over_ids() {
        let response: SingleResponse<TransactionGroup> = serde_json::from_value(json!({
            "data": {
                "type": "transactions",
                "id": "42",
                "attributes": {
                    "transactions": [{
                        "type": "withdrawal",
                        "date": "2024-06-15T00:00:00+02:00",
                        "amount": "12.50",
                        "description": "Coffee",
                        "source_id": "1",
                        "source_name": "Checking",
                        "destination_id": "7",
                        "category_name": "Dining"
                    }]
                }
            }
        }))
        .expect("transaction");
        let value = serde_json::to_value(TransactionResponse::from_resource(&response.data))
            .expect("serializes");
        let split = &value["splits"][0];
        assert_eq!(value["id"], "42");
        assert_eq!(split["date"], "2024-06-15");
        assert_eq!(split["source"], "Checking");
        assert_eq!(split["destination"], "7");
        assert_eq!(split["category"], "Dining");
        assert_eq!(split["tags"], json!([]));
    }
}
