//! Parameter structs for MCP tool inputs.
//!
//! Each struct derives [`serde::Deserialize`] and [`schemars::JsonSchema`]
//! so that `rmcp` can auto-generate JSON schemas for tool parameters.
//! Query structs derive [`serde::Serialize`] and are sent upstream as-is.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::TransactionType;

/// Account kinds accepted by the `list_accounts` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub(crate) enum AccountTypeFilter {
    /// Every account.
    All,
    /// Asset accounts.
    Asset,
    /// Expense accounts.
    Expense,
    /// Revenue accounts.
    Revenue,
    /// Liabilities.
    Liability,
    /// Cash accounts.
    Cash,
}

/// Transaction kinds accepted by the `list_transactions` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub(crate) enum TransactionTypeFilter {
    /// Every transaction.
    All,
    /// Withdrawals.
    Withdrawal,
    /// Deposits.
    Deposit,
    /// Transfers.
    Transfer,
    /// Reconciliations.
    Reconciliation,
    /// Opening balances.
    OpeningBalance,
}

/// Transaction kinds that can be created through `create_transaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub(crate) enum NewTransactionType {
    /// Asset account to expense account.
    Withdrawal,
    /// Revenue account to asset account.
    Deposit,
    /// Asset account to asset account.
    Transfer,
}

impl From<NewTransactionType> for TransactionType {
    fn from(kind: NewTransactionType) -> Self {
        match kind {
            NewTransactionType::Withdrawal => Self::Withdrawal,
            NewTransactionType::Deposit => Self::Deposit,
            NewTransactionType::Transfer => Self::Transfer,
        }
    }
}

/// Parameters for tools that only page through a list.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub(crate) struct PageParams {
    /// One-based page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) page: Option<u32>,
    /// Page size (Firefly III default is 50).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) limit: Option<u32>,
}

/// Parameters for the `list_accounts` tool.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub(crate) struct ListAccountsParams {
    /// Restrict to one account kind.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub(crate) account_type: Option<AccountTypeFilter>,
    /// One-based page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) page: Option<u32>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) limit: Option<u32>,
}

/// Parameters for the `list_transactions` tool.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub(crate) struct ListTransactionsParams {
    /// Start date (inclusive), format `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) start: Option<String>,
    /// End date (inclusive), format `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) end: Option<String>,
    /// Restrict to one transaction kind.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub(crate) transaction_type: Option<TransactionTypeFilter>,
    /// One-based page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) page: Option<u32>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) limit: Option<u32>,
}

/// Parameters for tools addressing one resource by ID.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct ResourceIdParams {
    /// Resource ID.
    pub(crate) id: String,
}

/// Parameters for the `create_transaction` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct CreateTransactionParams {
    /// Transaction kind.
    #[serde(rename = "type")]
    pub(crate) transaction_type: NewTransactionType,
    /// Description.
    pub(crate) description: String,
    /// Positive amount as a decimal string, e.g. `"12.50"`.
    pub(crate) amount: String,
    /// Booking date, format `YYYY-MM-DD`.
    pub(crate) date: String,
    /// Source account ID.
    pub(crate) source_id: Option<String>,
    /// Source account name (used when no ID is given).
    pub(crate) source_name: Option<String>,
    /// Destination account ID.
    pub(crate) destination_id: Option<String>,
    /// Destination account name (used when no ID is given).
    pub(crate) destination_name: Option<String>,
    /// Category name; created if it does not exist.
    pub(crate) category_name: Option<String>,
    /// Budget name.
    pub(crate) budget_name: Option<String>,
    /// Currency code; defaults to the source account currency.
    pub(crate) currency_code: Option<String>,
    /// Tag names.
    pub(crate) tags: Option<Vec<String>>,
    /// Notes.
    pub(crate) notes: Option<String>,
}

/// Parameters for the `update_transaction` tool. Unset fields keep their
/// current value.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct UpdateTransactionParams {
    /// Transaction group ID.
    pub(crate) id: String,
    /// New description.
    pub(crate) description: Option<String>,
    /// New positive amount as a decimal string.
    pub(crate) amount: Option<String>,
    /// New booking date, format `YYYY-MM-DD`.
    pub(crate) date: Option<String>,
    /// New category name.
    pub(crate) category_name: Option<String>,
    /// New budget name.
    pub(crate) budget_name: Option<String>,
    /// Replacement tag names.
    pub(crate) tags: Option<Vec<String>>,
    /// New notes.
    pub(crate) notes: Option<String>,
}

/// Parameters for the `check_auth_config` tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub(crate) struct CheckAuthConfigParams {
    /// Also perform a live connection test.
    #[serde(default)]
    pub(crate) test_connection: bool,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    clippy::default_numeric_fallback,
    reason = "test code uses expect for readability"
)]
mod tests {
    use serde_json::json;

    use super::{
        AccountTypeFilter, CheckAuthConfigParams, CreateTransactionParams, ListAccountsParams,
        ListTransactionsParams, NewTransactionType, PageParams, ResourceIdParams,
        TransactionTypeFilter, UpdateTransactionParams,
    };
    use crate::models::TransactionType;

    #[test]
    fn list_accounts_defaults_to_all() {
        let params: ListAccountsParams =
            serde_json::from_str("{}").expect("should deserialize empty object");
        assert!(params.account_type.is_none());
        let query = serde_json::to_value(&params).expect("serializes");
        assert_eq!(query, json!({}));
    }

    #[test]
    fn list_accounts_query_uses_api_names() {
        let params: ListAccountsParams =
            serde_json::from_str(r#"{"type": "asset", "limit": 10}"#).expect("should deserialize");
        assert_eq!(params.account_type, Some(AccountTypeFilter::Asset));
        let query = serde_json::to_value(&params).expect("serializes");
        assert_eq!(query, json!({"type": "asset", "limit": 10}));
    }

    #[test]
    fn list_transactions_full() {
        let json = r#"{
            "start": "2024-01-01",
            "end": "2024-12-31",
            "type": "opening_balance",
            "page": 2,
            "limit": 25
        }"#;
        let params: ListTransactionsParams =
            serde_json::from_str(json).expect("should deserialize full params");
        assert_eq!(params.start.as_deref(), Some("2024-01-01"));
        assert_eq!(params.end.as_deref(), Some("2024-12-31"));
        assert_eq!(
            params.transaction_type,
            Some(TransactionTypeFilter::OpeningBalance)
        );
        assert_eq!(params.page, Some(2));
        assert_eq!(params.limit, Some(25));
    }

    #[test]
    fn unknown_filter_value_is_rejected() {
        let _err = serde_json::from_str::<ListTransactionsParams>(r#"{"type": "refund"}"#)
            .expect_err("refund is not a filter");
    }

    #[test]
    fn page_params_omit_unset_fields() {
        let params = PageParams {
            page: Some(3),
            limit: None,
        };
        let query = serde_json::to_value(&params).expect("serializes");
        assert_eq!(query, json!({"page": 3}));
    }

    #[test]
    fn resource_id_params() {
        let params: ResourceIdParams =
            serde_json::from_str(r#"{"id": "123"}"#).expect("should deserialize");
        assert_eq!(params.id, "123");
    }

    #[test]
    fn create_transaction_minimal() {
        let json = r#"{
            "type": "withdrawal",
            "description": "Coffee",
            "amount": "4.20",
            "date": "2024-06-15",
            "source_id": "1",
            "destination_name": "Cafe"
        }"#;
        let params: CreateTransactionParams =
            serde_json::from_str(json).expect("should deserialize minimal");
        assert_eq!(params.transaction_type, NewTransactionType::Withdrawal);
        assert_eq!(
            TransactionType::from(params.transaction_type),
            TransactionType::Withdrawal
        );
        assert_eq!(params.source_id.as_deref(), Some("1"));
        assert!(params.tags.is_none());
        assert!(params.category_name.is_none());
    }

    #[test]
    fn create_transaction_rejects_reconciliation() {
        let json = r#"{
            "type": "reconciliation",
            "description": "x",
            "amount": "1",
            "date": "2024-06-15"
        }"#;
        let _err = serde_json::from_str::<CreateTransactionParams>(json)
            .expect_err("reconciliation cannot be created");
    }

    #[test]
    fn update_transaction_needs_only_id() {
        let params: UpdateTransactionParams =
            serde_json::from_str(r#"{"id": "42", "amount": "9.99"}"#).expect("should deserialize");
        assert_eq!(params.id, "42");
        assert_eq!(params.amount.as_deref(), Some("9.99"));
        assert!(params.description.is_none());
    }

    #[test]
    fn check_auth_config_defaults_to_no_live_test() {
        let params: CheckAuthConfigParams =
            serde_json::from_str("{}").expect("should deserialize empty");
        assert!(!params.test_connection);
    }
}
