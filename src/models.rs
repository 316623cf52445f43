//! Typed mirrors of the Firefly III JSON:API envelopes.
//!
//! Every entity arrives wrapped as `{type, id, attributes}`. Attributes are
//! optional unless the API always sends them; no cross-field rules are
//! enforced here, the upstream validates writes.

use alloc::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serde default for flags that Firefly III treats as on unless stated.
const fn default_true() -> bool {
    true
}

/// Serde default for currency precision.
const fn default_decimal_places() -> u8 {
    2
}

/// Resource envelope wrapping an attribute bag.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Resource<A> {
    /// Resource type, e.g. `"accounts"`.
    #[allow(dead_code, reason = "read by tests and Debug output only")]
    #[serde(rename = "type")]
    pub(crate) kind: String,
    /// Resource ID.
    pub(crate) id: String,
    /// Resource-specific attributes.
    pub(crate) attributes: A,
}

/// Response holding a single resource.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SingleResponse<A> {
    /// The resource.
    pub(crate) data: Resource<A>,
}

/// Response holding a page of resources.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ArrayResponse<A> {
    /// The resources on this page.
    pub(crate) data: Vec<Resource<A>>,
    /// Pagination metadata.
    #[serde(default)]
    pub(crate) meta: Option<Meta>,
}

/// Metadata attached to list responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Meta {
    /// Page counters, when the endpoint paginates.
    #[serde(default)]
    pub(crate) pagination: Option<Pagination>,
}

/// Page counters for a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct Pagination {
    /// Total number of items across all pages.
    pub(crate) total: u64,
    /// Number of items on this page.
    pub(crate) count: u64,
    /// Page size.
    pub(crate) per_page: u64,
    /// One-based page index.
    pub(crate) current_page: u64,
    /// Number of pages.
    pub(crate) total_pages: u64,
}

/// Account kind as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum ShortAccountType {
    /// Asset account (checking, savings).
    Asset,
    /// Expense account.
    Expense,
    /// Import account.
    Import,
    /// Revenue account.
    Revenue,
    /// Cash account.
    Cash,
    /// Liability account.
    Liability,
    /// Liability account (plural spelling used by some endpoints).
    Liabilities,
    /// Initial balance account.
    InitialBalance,
    /// Reconciliation account.
    Reconciliation,
    /// Any value this client does not know.
    #[serde(other)]
    Unknown,
}

/// Role of an asset account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum AccountRole {
    /// Default asset account.
    DefaultAsset,
    /// Shared asset account.
    SharedAsset,
    /// Savings account.
    SavingAsset,
    /// Credit card.
    CcAsset,
    /// Cash wallet.
    CashWalletAsset,
    /// Any value this client does not know.
    #[serde(other)]
    Unknown,
}

/// Kind of transaction split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TransactionType {
    /// Money leaving an asset account.
    Withdrawal,
    /// Money entering an asset account.
    Deposit,
    /// Money moving between own accounts.
    Transfer,
    /// Reconciliation correction.
    Reconciliation,
    /// Opening balance.
    #[serde(rename = "opening balance")]
    OpeningBalance,
    /// Any value this client does not know.
    #[serde(other)]
    Unknown,
}

/// How an automatic budget behaves at period end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum AutoBudgetType {
    /// Reset to the configured amount.
    Reset,
    /// Carry leftovers into the next period.
    Rollover,
    /// Adjust for overspending.
    Adjusted,
    /// No automatic budget.
    None,
    /// Any value this client does not know.
    #[serde(other)]
    Unknown,
}

/// Period of an automatic budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum AutoBudgetPeriod {
    /// Every day.
    Daily,
    /// Every week.
    Weekly,
    /// Every month.
    Monthly,
    /// Every quarter.
    Quarterly,
    /// Every six months.
    HalfYear,
    /// Every year.
    Yearly,
    /// Any value this client does not know.
    #[serde(other)]
    Unknown,
}

/// Account attributes.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Account {
    /// Display name.
    pub(crate) name: String,
    /// Account kind.
    #[serde(rename = "type")]
    pub(crate) account_type: ShortAccountType,
    /// Whether the account is active.
    #[serde(default = "default_true")]
    pub(crate) active: bool,
    /// Asset account role.
    #[serde(default)]
    pub(crate) account_role: Option<AccountRole>,
    /// ISO currency code.
    #[serde(default)]
    pub(crate) currency_code: Option<String>,
    /// Currency symbol.
    #[serde(default)]
    pub(crate) currency_symbol: Option<String>,
    /// Balance as a decimal string.
    #[serde(default)]
    pub(crate) current_balance: Option<String>,
    /// Notes.
    #[serde(default)]
    pub(crate) notes: Option<String>,
    /// Account number.
    #[serde(default)]
    pub(crate) account_number: Option<String>,
    /// IBAN.
    #[serde(default)]
    pub(crate) iban: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub(crate) created_at: Option<DateTime<FixedOffset>>,
}

/// One split of a transaction group.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TransactionSplit {
    /// Journal ID of this split.
    #[serde(default)]
    pub(crate) transaction_journal_id: Option<String>,
    /// Split kind.
    #[serde(rename = "type")]
    pub(crate) transaction_type: TransactionType,
    /// Booking date.
    pub(crate) date: DateTime<FixedOffset>,
    /// Amount as a positive decimal string.
    pub(crate) amount: String,
    /// Description.
    pub(crate) description: String,
    /// ISO currency code.
    #[serde(default)]
    pub(crate) currency_code: Option<String>,
    /// Source account ID.
    #[serde(default)]
    pub(crate) source_id: Option<String>,
    /// Source account name.
    #[serde(default)]
    pub(crate) source_name: Option<String>,
    /// Destination account ID.
    #[serde(default)]
    pub(crate) destination_id: Option<String>,
    /// Destination account name.
    #[serde(default)]
    pub(crate) destination_name: Option<String>,
    /// Category name.
    #[serde(default)]
    pub(crate) category_name: Option<String>,
    /// Budget name.
    #[serde(default)]
    pub(crate) budget_name: Option<String>,
    /// Tag names.
    #[serde(default)]
    pub(crate) tags: Option<Vec<String>>,
    /// Notes.
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

/// Transaction group attributes.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TransactionGroup {
    /// Group title, set when the group has several splits.
    #[serde(default)]
    pub(crate) group_title: Option<String>,
    /// Splits.
    pub(crate) transactions: Vec<TransactionSplit>,
}

/// Category attributes.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Category {
    /// Category name.
    pub(crate) name: String,
    /// Notes.
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

/// Tag attributes.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Tag {
    /// Tag text.
    pub(crate) tag: String,
    /// Optional date attached to the tag.
    #[serde(default)]
    pub(crate) date: Option<String>,
    /// Description.
    #[serde(default)]
    pub(crate) description: Option<String>,
}

/// Budget attributes.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Budget {
    /// Budget name.
    pub(crate) name: String,
    /// Whether the budget is active.
    #[serde(default = "default_true")]
    pub(crate) active: bool,
    /// Automatic budget behaviour.
    #[serde(default)]
    pub(crate) auto_budget_type: Option<AutoBudgetType>,
    /// Automatic budget amount as a decimal string.
    #[serde(default)]
    pub(crate) auto_budget_amount: Option<String>,
    /// Automatic budget period.
    #[serde(default)]
    pub(crate) auto_budget_period: Option<AutoBudgetPeriod>,
    /// Notes.
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

/// Currency attributes.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Currency {
    /// ISO code.
    pub(crate) code: String,
    /// Display name.
    pub(crate) name: String,
    /// Symbol.
    pub(crate) symbol: String,
    /// Decimal places.
    #[serde(default = "default_decimal_places")]
    pub(crate) decimal_places: u8,
    /// Whether the currency is enabled.
    #[serde(default)]
    pub(crate) enabled: Option<bool>,
    /// Whether this is the default currency.
    #[serde(default)]
    pub(crate) default: Option<bool>,
}

/// Body of `/api/v1/about`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct About {
    /// Firefly III version.
    #[serde(default)]
    pub(crate) version: Option<String>,
    /// API version.
    #[serde(default)]
    pub(crate) api_version: Option<String>,
    /// PHP version.
    #[serde(default)]
    pub(crate) php_version: Option<String>,
    /// Operating system.
    #[serde(default)]
    pub(crate) os: Option<String>,
    /// Database driver.
    #[serde(default)]
    pub(crate) driver: Option<String>,
}

/// Wrapper for `/api/v1/about`, which is not a resource envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AboutResponse {
    /// Instance information.
    pub(crate) data: About,
}

/// User attributes from `/api/v1/about/user`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct User {
    /// Login e-mail.
    #[serde(default)]
    pub(crate) email: Option<String>,
    /// Role, e.g. `"owner"`.
    #[serde(default)]
    pub(crate) role: Option<String>,
    /// Whether the user is blocked.
    #[serde(default)]
    pub(crate) blocked: Option<bool>,
}

/// One entry of `/api/v1/configuration`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConfigurationEntry {
    /// Setting name, e.g. `"configuration.is_demo_site"`.
    pub(crate) title: String,
    /// Setting value.
    pub(crate) value: Value,
}

/// Wrapper for `/api/v1/configuration`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConfigurationResponse {
    /// All configuration entries.
    pub(crate) data: Vec<ConfigurationEntry>,
}

impl ConfigurationResponse {
    /// Flattens entries into a `title -> value` map.
    #[must_use]
    pub(crate) fn into_map(self) -> BTreeMap<String, Value> {
        self.data
            .into_iter()
            .map(|entry| (entry.title, entry.value))
            .collect()
    }
}

/// One split in a create request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TransactionSplitStore {
    /// Split kind.
    #[serde(rename = "type")]
    pub(crate) transaction_type: TransactionType,
    /// Booking date, `YYYY-MM-DD`.
    pub(crate) date: String,
    /// Amount as a positive decimal string.
    pub(crate) amount: String,
    /// Description.
    pub(crate) description: String,
    /// Source account ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) source_id: Option<String>,
    /// Source account name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) source_name: Option<String>,
    /// Destination account ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) destination_id: Option<String>,
    /// Destination account name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) destination_name: Option<String>,
    /// Category name; created upstream if new.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) category_name: Option<String>,
    /// Budget name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) budget_name: Option<String>,
    /// Currency code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) currency_code: Option<String>,
    /// Tag names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tags: Option<Vec<String>>,
    /// Notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) notes: Option<String>,
}

/// Body of `POST /api/v1/transactions`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TransactionStore {
    /// Reject the request if an identical transaction exists.
    pub(crate) error_if_duplicate_hash: bool,
    /// Run the user's rules on the new transaction.
    pub(crate) apply_rules: bool,
    /// Group title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) group_title: Option<String>,
    /// Splits; at least one.
    pub(crate) transactions: Vec<TransactionSplitStore>,
}

/// Split changes in an update request; unset fields are left untouched.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TransactionSplitUpdate {
    /// Booking date, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) date: Option<String>,
    /// Amount as a positive decimal string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) amount: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    /// Category name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) category_name: Option<String>,
    /// Budget name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) budget_name: Option<String>,
    /// Replacement tag list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tags: Option<Vec<String>>,
    /// Notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) notes: Option<String>,
}

/// Body of `PUT /api/v1/transactions/{id}`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TransactionUpdate {
    /// Re-run the user's rules after the change.
    pub(crate) apply_rules: bool,
    /// Split changes, one per split in the group.
    pub(crate) transactions: Vec<TransactionSplitUpdate>,
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
        Account, AccountRole, ArrayResponse, AutoBudgetPeriod, AutoBudgetType, Budget,
        ConfigurationResponse, Currency, ShortAccountType, SingleResponse, TransactionGroup,
        TransactionSplitStore, TransactionStore, TransactionType,
    };

    #[test]
    fn enum_values_match_api_strings() {
        let asset: ShortAccountType = serde_json::from_value(json!("asset")).expect("asset");
        assert_eq!(asset, ShortAccountType::Asset);
        let initial: ShortAccountType =
            serde_json::from_value(json!("initial-balance")).expect("initial");
        assert_eq!(initial, ShortAccountType::InitialBalance);
        let role: AccountRole = serde_json::from_value(json!("savingAsset")).expect("role");
        assert_eq!(role, AccountRole::SavingAsset);
        let opening: TransactionType =
            serde_json::from_value(json!("opening balance")).expect("opening");
        assert_eq!(opening, TransactionType::OpeningBalance);
        let period: AutoBudgetPeriod =
            serde_json::from_value(json!("half-year")).expect("period");
        assert_eq!(period, AutoBudgetPeriod::HalfYear);
    }

    #[test]
    fn unknown_enum_values_do_not_fail() {
        let kind: ShortAccountType = serde_json::from_value(json!("mortgage-ish")).expect("kind");
        assert_eq!(kind, ShortAccountType::Unknown);
        let budget: AutoBudgetType = serde_json::from_value(json!("something")).expect("type");
        assert_eq!(budget, AutoBudgetType::Unknown);
    }

    #[test]
    fn minimal_account_defaults_to_active() {
        let account: Account =
            serde_json::from_value(json!({"name": "Test Account", "type": "asset"}))
                .expect("minimal account");
        assert_eq!(account.name, "Test Account");
        assert_eq!(account.account_type, ShortAccountType::Asset);
        assert!(account.active);
        assert!(account.current_balance.is_none());
    }

    #[test]
    fn account_without_name_is_rejected() {
        let _err = serde_json::from_value::<Account>(json!({"type": "asset"}))
            .expect_err("name is required");
    }

    #[test]
    fn single_account_envelope() {
        let response: SingleResponse<Account> = serde_json::from_value(json!({
            "data": {
                "type": "accounts",
                "id": "123",
                "attributes": {
                    "name": "Checking",
                    "type": "asset",
                    "account_role": "defaultAsset",
                    "currency_code": "USD",
                    "current_balance": "1000.00",
                    "iban": "DE89370400440532013000",
                    "created_at": "2024-01-01T10:00:00+01:00"
                }
            }
        }))
        .expect("single account");
        assert_eq!(response.data.kind, "accounts");
        assert_eq!(response.data.id, "123");
        assert_eq!(response.data.attributes.currency_code.as_deref(), Some("USD"));
        assert_eq!(
            response.data.attributes.account_role,
            Some(AccountRole::DefaultAsset)
        );
        assert!(response.data.attributes.created_at.is_some());
    }

    #[test]
    fn array_envelope_with_pagination() {
        let response: ArrayResponse<Account> = serde_json::from_value(json!({
            "data": [
                {"type": "accounts", "id": "1", "attributes": {"name": "Test1", "type": "asset"}},
                {"type": "accounts", "id": "2", "attributes": {"name": "Test2", "type": "expense"}}
            ],
            "meta": {"pagination": {
                "total": 2, "count": 2, "per_page": 50, "current_page": 1, "total_pages": 1
            }}
        }))
        .expect("account list");
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[1].attributes.account_type, ShortAccountType::Expense);
        let pagination = response
            .meta
            .and_then(|meta| meta.pagination)
            .expect("pagination present");
        assert_eq!(pagination.total, 2);
    }

    #[test]
    fn transaction_group_with_splits() {
        let group: TransactionGroup = serde_json::from_value(json!({
            "group_title": "Split Transaction",
            "transactions": [
                {
                    "transaction_journal_id": "10",
                    "type": "withdrawal",
                    "date": "2024-06-15T00:00:00+00:00",
                    "amount": "50.00",
                    "description": "Split 1",
                    "source_name": "Checking Account",
                    "destination_name": "Grocery Store",
                    "tags": ["food"]
                },
                {
                    "type": "withdrawal",
                    "date": "2024-06-15T00:00:00+00:00",
                    "amount": "30.00",
                    "description": "Split 2"
                }
            ]
        }))
        .expect("group");
        assert_eq!(group.transactions.len(), 2);
        assert_eq!(group.group_title.as_deref(), Some("Split Transaction"));
        assert_eq!(group.transactions[0].amount, "50.00");
        assert_eq!(
            group.transactions[0].destination_name.as_deref(),
            Some("Grocery Store")
        );
    }

    #[test]
    fn budget_and_currency_defaults() {
        let budget: Budget =
            serde_json::from_value(json!({"name": "Monthly Budget"})).expect("budget");
        assert!(budget.active);
        let currency: Currency =
            serde_json::from_value(json!({"code": "USD", "name": "US Dollar", "symbol": "$"}))
                .expect("currency");
        assert_eq!(currency.decimal_places, 2);
    }

    #[test]
    fn configuration_flattens_to_map() {
        let config: ConfigurationResponse = serde_json::from_value(json!({
            "data": [
                {"title": "configuration.is_demo_site", "value": false, "editable": true},
                {"title": "firefly.default_location", "value": {"latitude": 51.98}}
            ]
        }))
        .expect("configuration");
        let map = config.into_map();
        assert_eq!(map.get("configuration.is_demo_site"), Some(&json!(false)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn store_request_omits_unset_fields() {
        let store = TransactionStore {
            error_if_duplicate_hash: true,
            apply_rules: true,
            group_title: None,
            transactions: vec![TransactionSplitStore {
                transaction_type: TransactionType::Withdrawal,
                date: "2024-06-15".to_owned(),
                amount: "12.50".to_owned(),
                description: "Coffee".to_owned(),
                source_id: Some("1".to_owned()),
                source_name: None,
                destination_id: None,
                destination_name: Some("Cafe".to_owned()),
                category_name: None,
                budget_name: None,
                currency_code: None,
                tags: None,
                notes: None,
            }],
        };
        let value = serde_json::to_value(&store).expect("serializes");
        assert_eq!(
            value,
            json!({
                "error_if_duplicate_hash": true,
                "apply_rules": true,
                "transactions": [{
                    "type": "withdrawal",
                    "date": "2024-06-15",
                    "amount": "12.50",
                    "description": "Coffee",
                    "source_id": "1",
                    "destination_name": "Cafe"
                }]
            })
        );
    }
}
