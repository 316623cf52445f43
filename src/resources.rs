//! Handlers for accounts, transactions and reference data.
//!
//! Each handler makes one request through an open [`FireflyClient`] and
//! flattens the JSON:API envelope. Whether the client is cached is the
//! caller's choice.

use chrono::NaiveDate;

use crate::client::FireflyClient;
use crate::error::FireflyError;
use crate::models::{
    Account, ArrayResponse, Budget, Category, Currency, SingleResponse, Tag, TransactionGroup,
    TransactionSplitStore, TransactionSplitUpdate, TransactionStore, TransactionUpdate,
};
use crate::params::{
    CreateTransactionParams, ListAccountsParams, ListTransactionsParams, PageParams,
    UpdateTransactionParams,
};
use crate::response::{
    AccountResponse, BudgetResponse, CategoryResponse, CurrencyResponse,
    DeletedResponse, ListResponse, StoredTransactionResponse, TagResponse, TransactionResponse,
};

/// Accounts collection.
const ACCOUNTS_PATH: &str = "/api/v1/accounts";
/// Transactions collection.
const TRANSACTIONS_PATH: &str = "/api/v1/transactions";
/// Categories collection.
const CATEGORIES_PATH: &str = "/api/v1/categories";
/// Tags collection.
const TAGS_PATH: &str = "/api/v1/tags";
/// Budgets collection.
const BUDGETS_PATH: &str = "/api/v1/budgets";
/// Currencies collection.
const CURRENCIES_PATH: &str = "/api/v1/currencies";

/// Parses a `YYYY-MM-DD` argument.
///
/// Anything but exactly that shape is rejected, including unpadded days
/// and signed years.
fn parse_date(field: &str, value: &str) -> Result<NaiveDate, FireflyError> {
    let invalid = |reason: &str| {
        FireflyError::Validation(format!(
            "invalid {field} date '{value}': {reason} (expected YYYY-MM-DD)"
        ))
    };
    let shaped = value.len() == 10
        && value.bytes().enumerate().all(|(idx, byte)| {
            if matches!(idx, 4 | 7) {
                byte == b'-'
            } else {
                byte.is_ascii_digit()
            }
        });
    if !shaped {
        return Err(invalid("wrong format"));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|err| invalid(&err.to_string()))
}

/// Returns `true` for digits with an optional fractional part.
fn is_decimal(value: &str) -> bool {
    let (whole, fraction) = value.split_once('.').unwrap_or((value, "0"));
    !whole.is_empty()
        && !fraction.is_empty()
        && whole.bytes().all(|byte| byte.is_ascii_digit())
        && fraction.bytes().all(|byte| byte.is_ascii_digit())
}

/// Rejects IDs that would escape the resource path.
fn check_id(id: &str) -> Result<&str, FireflyError> {
    if id.is_empty() || !id.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return Err(FireflyError::Validation(format!("invalid resource id '{id}'")));
    }
    Ok(id)
}

/// Accepts positive decimal amounts and returns them trimmed.
fn check_amount(amount: &str) -> Result<String, FireflyError> {
    let trimmed = amount.trim();
    let positive =
        is_decimal(trimmed) && trimmed.bytes().any(|byte| matches!(byte, b'1'..=b'9'));
    if positive {
        Ok(trimmed.to_owned())
    } else {
        Err(FireflyError::Validation(format!(
            "amount '{amount}' must be a positive decimal number"
        )))
    }
}

/// Decodes the transaction group echoed back by a write.
fn stored_group(value: serde_json::Value) -> Result<TransactionResponse, FireflyError> {
    let group: SingleResponse<TransactionGroup> = serde_json::from_value(value)
        .map_err(|err| FireflyError::Other(format!("unexpected response from API: {err}")))?;
    Ok(TransactionResponse::from_resource(&group.data))
}

/// Lists accounts, optionally filtered by kind.
///
/// # Errors
///
/// Propagates client errors.
pub(crate) async fn list_accounts(
    client: &FireflyClient,
    params: &ListAccountsParams,
) -> Result<ListResponse<AccountResponse>, FireflyError> {
    let page: ArrayResponse<Account> = client.get_with_query_as(ACCOUNTS_PATH, params).await?;
    Ok(ListResponse::from_array(&page, AccountResponse::from_resource))
}

/// Fetches one account.
///
/// # Errors
///
/// Returns [`FireflyError::Validation`] for a malformed ID, otherwise
/// propagates client errors.
pub(crate) async fn get_account(
    client: &FireflyClient,
    id: &str,
) -> Result<AccountResponse, FireflyError> {
    let path = format!("{ACCOUNTS_PATH}/{}", check_id(id)?);
    let account: SingleResponse<Account> = client.get_as(&path).await?;
    Ok(AccountResponse::from_resource(&account.data))
}

/// Lists transactions in an optional date range.
///
/// # Errors
///
/// Returns [`FireflyError::Validation`] for malformed dates or a start
/// after the end, otherwise propagates client errors.
pub(crate) async fn list_transactions(
    client: &FireflyClient,
    params: &ListTransactionsParams,
) -> Result<ListResponse<TransactionResponse>, FireflyError> {
    let start = params
        .start
        .as_deref()
        .map(|value| parse_date("start", value))
        .transpose()?;
    let end = params
        .end
        .as_deref()
        .map(|value| parse_date("end", value))
        .transpose()?;
    if let Some((from, to)) = start.zip(end).filter(|&(from, to)| from > to) {
        return Err(FireflyError::Validation(format!(
            "start date {from} is after end date {to}"
        )));
    }

    let page: ArrayResponse<TransactionGroup> =
        client.get_with_query_as(TRANSACTIONS_PATH, params).await?;
    Ok(ListResponse::from_array(&page, TransactionResponse::from_resource))
}

/// Fetches one transaction group.
///
/// # Errors
///
/// Returns [`FireflyError::Validation`] for a malformed ID, otherwise
/// propagates client errors.
pub(crate) async fn get_transaction(
    client: &FireflyClient,
    id: &str,
) -> Result<TransactionResponse, FireflyError> {
    let path = format!("{TRANSACTIONS_PATH}/{}", check_id(id)?);
    let group: SingleResponse<TransactionGroup> = client.get_as(&path).await?;
    Ok(TransactionResponse::from_resource(&group.data))
}

/// Creates a single-split transaction.
///
/// Duplicate detection and the user's rules are always enabled.
///
/// # Errors
///
/// Returns [`FireflyError::Validation`] for a malformed date, blank
/// description or non-positive amount, otherwise propagates client errors.
pub(crate) async fn create_transaction(
    client: &FireflyClient,
    params: CreateTransactionParams,
) -> Result<StoredTransactionResponse, FireflyError> {
    let date = parse_date("transaction", &params.date)?;
    if params.description.trim().is_empty() {
        return Err(FireflyError::Validation(
            "description must not be empty".to_owned(),
        ));
    }
    let amount = check_amount(&params.amount)?;

    let store = TransactionStore {
        error_if_duplicate_hash: true,
        apply_rules: true,
        group_title: None,
        transactions: vec![TransactionSplitStore {
            transaction_type: params.transaction_type.into(),
            date: date.to_string(),
            amount,
            description: params.description,
            source_id: params.source_id,
            source_name: params.source_name,
            destination_id: params.destination_id,
            destination_name: params.destination_name,
            category_name: params.category_name,
            budget_name: params.budget_name,
            currency_code: params.currency_code,
            tags: params.tags,
            notes: params.notes,
        }],
    };

    let created = stored_group(client.post(TRANSACTIONS_PATH, Some(&store)).await?)?;
    tracing::info!(id = %created.id(), "transaction created");
    Ok(StoredTransactionResponse::created(created))
}

/// Changes fields of a single-split transaction.
///
/// # Errors
///
/// Returns [`FireflyError::Validation`] for a malformed ID, date or amount,
/// or when no field is set, otherwise propagates client errors.
pub(crate) async fn update_transaction(
    client: &FireflyClient,
    params: UpdateTransactionParams,
) -> Result<StoredTransactionResponse, FireflyError> {
    let path = format!("{TRANSACTIONS_PATH}/{}", check_id(&params.id)?);
    let date = params
        .date
        .as_deref()
        .map(|value| parse_date("transaction", value))
        .transpose()?;
    let amount = params.amount.as_deref().map(check_amount).transpose()?;

    let split = TransactionSplitUpdate {
        date: date.map(|day| day.format("%Y-%m-%d").to_string()),
        amount,
        description: params.description,
        category_name: params.category_name,
        budget_name: params.budget_name,
        tags: params.tags,
        notes: params.notes,
    };
    let unchanged = split.date.is_none()
        && split.amount.is_none()
        && split.description.is_none()
        && split.category_name.is_none()
        && split.budget_name.is_none()
        && split.tags.is_none()
        && split.notes.is_none();
    if unchanged {
        return Err(FireflyError::Validation(
            "update_transaction needs at least one field to change".to_owned(),
        ));
    }

    let update = TransactionUpdate {
        apply_rules: true,
        transactions: vec![split],
    };
    let updated = stored_group(client.put(&path, Some(&update)).await?)?;
    tracing::info!(id = %updated.id(), "transaction updated");
    Ok(StoredTransactionResponse::updated(updated))
}

/// Deletes a transaction group.
///
/// # Errors
///
/// Returns [`FireflyError::Validation`] for a malformed ID, otherwise
/// propagates client errors.
pub(crate) async fn delete_transaction(
    client: &FireflyClient,
    id: &str,
) -> Result<DeletedResponse, FireflyError> {
    let checked = check_id(id)?;
    let _reply = client
        .delete(&format!("{TRANSACTIONS_PATH}/{checked}"))
        .await?;
    tracing::info!(id = %checked, "transaction deleted");
    Ok(DeletedResponse::new(checked.to_owned()))
}

/// Lists categories.
///
/// # Errors
///
/// Propagates client errors.
pub(crate) async fn list_categories(
    client: &FireflyClient,
    params: &PageParams,
) -> Result<ListResponse<CategoryResponse>, FireflyError> {
    let page: ArrayResponse<Category> = client.get_with_query_as(CATEGORIES_PATH, params).await?;
    Ok(ListResponse::from_array(&page, CategoryResponse::from_resource))
}

/// Lists tags.
///
/// # Errors
///
/// Propagates client errors.
pub(crate) async fn list_tags(
    client: &FireflyClient,
    params: &PageParams,
) -> Result<ListResponse<TagResponse>, FireflyError> {
    let page: ArrayResponse<Tag> = client.get_with_query_as(TAGS_PATH, params).await?;
    Ok(ListResponse::from_array(&page, TagResponse::from_resource))
}

/// Lists budgets.
///
/// # Errors
///
/// Propagates client errors.
pub(crate) async fn list_budgets(
    client: &FireflyClient,
    params: &PageParams,
) -> Result<ListResponse<BudgetResponse>, FireflyError> {
    let page: ArrayResponse<Budget> = client.get_with_query_as(BUDGETS_PATH, params).await?;
    Ok(ListResponse::from_array(&page, BudgetResponse::from_resource))
}

/// Lists currencies.
///
/// # Errors
///
/// Propagates client errors.
pub(crate) async fn list_currencies(
    client: &FireflyClient,
    params: &PageParams,
) -> Result<ListResponse<CurrencyResponse>, FireflyError> {
    let page: ArrayResponse<Currency> = client.get_with_query_as(CURRENCIES_PATH, params).await?;
    Ok(ListResponse::from_array(&page, CurrencyResponse::from_resource))
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
    use serde_json::{Value, json};
    use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{
        create_transaction, delete_transaction, get_account, get_transaction, list_accounts,
        list_budgets, list_categories, list_currencies, list_tags, list_transactions,
        update_transaction,
    };
    use crate::cache::ResponseCache;
    use crate::client::FireflyClient;
    use crate::error::ErrorKind;
    use crate::params::{
        AccountTypeFilter, CreateTransactionParams, ListAccountsParams, ListTransactionsParams,
        NewTransactionType, PageParams, TransactionTypeFilter, UpdateTransactionParams,
    };

    fn client_for(server: &MockServer) -> FireflyClient {
        FireflyClient::new(&server.uri(), "test-token").expect("valid client")
    }

    fn to_json<T: serde::Serialize>(value: &T) -> Value {
        serde_json::to_value(value).expect("serializes")
    }

    fn group_json(id: &str) -> Value {
        json!({
            "type": "transactions",
            "id": id,
            "attributes": {
                "group_title": null,
                "transactions": [{
                    "transaction_journal_id": "100",
                    "type": "withdrawal",
                    "date": "2024-06-15T00:00:00+02:00",
                    "amount": "4.20",
                    "description": "Coffee",
                    "currency_code": "EUR",
                    "source_id": "1",
                    "source_name": "Checking",
                    "destination_name": "Cafe",
                    "tags": ["morning"]
                }]
            }
        })
    }

    fn new_transaction(date: &str, amount: &str) -> CreateTransactionParams {
        CreateTransactionParams {
            transaction_type: NewTransactionType::Withdrawal,
            description: "Coffee".to_owned(),
            amount: amount.to_owned(),
            date: date.to_owned(),
            source_id: Some("1".to_owned()),
            source_name: None,
            destination_id: None,
            destination_name: Some("Cafe".to_owned()),
            category_name: None,
            budget_name: None,
            currency_code: None,
            tags: Some(vec!["morning".to_owned()]),
            notes: None,
        }
    }

    #[tokio::test]
    async fn list_accounts_sends_filter_and_flattens() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts"))
            .and(query_param("type", "asset"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"type": "accounts", "id": "1", "attributes": {
                        "name": "Checking", "type": "asset", "current_balance": "10.00"
                    }},
                    {"type": "accounts", "id": "2", "attributes": {
                        "name": "Savings", "type": "asset", "active": false
                    }}
                ],
                "meta": {"pagination": {
                    "total": 2, "count": 2, "per_page": 50, "current_page": 1, "total_pages": 1
                }}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let params = ListAccountsParams {
            account_type: Some(AccountTypeFilter::Asset),
            page: None,
            limit: None,
        };
        let list = list_accounts(&client_for(&server), &params)
            .await
            .expect("accounts");
        let value = to_json(&list);
        assert_eq!(value["count"], 2);
        assert_eq!(value["items"][0]["current_balance"], "10.00");
        assert_eq!(value["items"][1]["active"], false);
        assert_eq!(value["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn get_account_flattens_single_resource() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"type": "accounts", "id": "7", "attributes": {
                    "name": "Wallet", "type": "cash", "currency_code": "USD"
                }}
            })))
            .mount(&server)
            .await;

        let account = get_account(&client_for(&server), "7").await.expect("account");
        let value = to_json(&account);
        assert_eq!(value["id"], "7");
        assert_eq!(value["account_type"], "cash");
        assert_eq!(value["currency"], "USD");
    }

    #[tokio::test]
    async fn get_account_rejects_path_traversal() {
        let server = MockServer::start().await;
        let err = get_account(&client_for(&server), "../about")
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn missing_account_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/999"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"message": "Resource not found"})),
            )
            .mount(&server)
            .await;

        let err = get_account(&client_for(&server), "999")
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.to_string(), "Resource not found");
    }

    #[tokio::test]
    async fn list_transactions_passes_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/transactions"))
            .and(query_param("start", "2024-06-01"))
            .and(query_param("end", "2024-06-30"))
            .and(query_param("type", "withdrawal"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [group_json("42")]})),
            )
            .mount(&server)
            .await;

        let params = ListTransactionsParams {
            start: Some("2024-06-01".to_owned()),
            end: Some("2024-06-30".to_owned()),
            transaction_type: Some(TransactionTypeFilter::Withdrawal),
            page: None,
            limit: None,
        };
        let list = list_transactions(&client_for(&server), &params)
            .await
            .expect("transactions");
        let value = to_json(&list);
        assert_eq!(value["count"], 1);
        assert_eq!(value["items"][0]["splits"][0]["date"], "2024-06-15");
        assert_eq!(value["items"][0]["splits"][0]["destination"], "Cafe");
        assert!(value.get("pagination").is_none());
    }

    #[tokio::test]
    async fn list_transactions_rejects_bad_dates_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let client = client_for(&server);

        let malformed = ListTransactionsParams {
            start: Some("15/06/2024".to_owned()),
            ..ListTransactionsParams::default()
        };
        let err = list_transactions(&client, &malformed)
            .await
            .expect_err("malformed date");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("YYYY-MM-DD"));

        for loose in ["2024-6-5", "2024-06-5", "+2024-06-15", " 2024-06-15"] {
            let params = ListTransactionsParams {
                start: Some(loose.to_owned()),
                ..ListTransactionsParams::default()
            };
            let loose_err = list_transactions(&client, &params)
                .await
                .expect_err("unpadded date");
            assert_eq!(loose_err.kind(), ErrorKind::Validation, "{loose}");
        }

        let inverted = ListTransactionsParams {
            start: Some("2024-07-01".to_owned()),
            end: Some("2024-06-01".to_owned()),
            ..ListTransactionsParams::default()
        };
        let inverted_err = list_transactions(&client, &inverted)
            .await
            .expect_err("inverted range");
        assert_eq!(inverted_err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn get_transaction_flattens_group() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/transactions/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": group_json("42")})))
            .mount(&server)
            .await;

        let group = get_transaction(&client_for(&server), "42")
            .await
            .expect("transaction");
        let value = to_json(&group);
        assert_eq!(value["id"], "42");
        assert_eq!(value["splits"][0]["tags"][0], "morning");
    }

    #[tokio::test]
    async fn create_transaction_posts_store_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/transactions"))
            .and(body_partial_json(json!({
                "error_if_duplicate_hash": true,
                "apply_rules": true,
                "transactions": [{
                    "type": "withdrawal",
                    "date": "2024-06-15",
                    "amount": "4.20",
                    "description": "Coffee",
                    "source_id": "1",
                    "destination_name": "Cafe",
                    "tags": ["morning"]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": group_json("43")})))
            .expect(1)
            .mount(&server)
            .await;

        let created = create_transaction(&client_for(&server), new_transaction("2024-06-15", "4.20"))
            .await
            .expect("created");
        let value = to_json(&created);
        assert_eq!(value["status"], "created");
        assert_eq!(value["transaction"]["id"], "43");
    }

    #[tokio::test]
    async fn create_transaction_validates_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let client = client_for(&server);

        let bad_date = create_transaction(&client, new_transaction("2024-13-01", "4.20"))
            .await
            .expect_err("bad date");
        assert_eq!(bad_date.kind(), ErrorKind::Validation);

        let bad_amount = create_transaction(&client, new_transaction("2024-06-15", "-3"))
            .await
            .expect_err("negative amount");
        assert_eq!(bad_amount.kind(), ErrorKind::Validation);

        for amount in ["1e3", "+5", "5.", ".5", "0.00", "NaN", "inf"] {
            let err = create_transaction(&client, new_transaction("2024-06-15", amount))
                .await
                .expect_err("not a positive decimal");
            assert_eq!(err.kind(), ErrorKind::Validation, "{amount}");
        }
    }

    #[tokio::test]
    async fn create_transaction_surfaces_upstream_validation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/transactions"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "Duplicate of transaction #41.",
                "errors": {"transactions.0.description": ["Duplicate of transaction #41."]}
            })))
            .mount(&server)
            .await;

        let err = create_transaction(&client_for(&server), new_transaction("2024-06-15", "4.20"))
            .await
            .expect_err("duplicate");
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status_code(), Some(422));
        assert_eq!(err.to_string(), "Duplicate of transaction #41.");
    }

    fn amount_change(id: &str, amount: Option<&str>) -> UpdateTransactionParams {
        UpdateTransactionParams {
            id: id.to_owned(),
            description: None,
            amount: amount.map(str::to_owned),
            date: None,
            category_name: None,
            budget_name: None,
            tags: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn update_transaction_puts_only_changed_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/transactions/42"))
            .and(body_json(json!({
                "apply_rules": true,
                "transactions": [{"amount": "5.00"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": group_json("42")})))
            .expect(1)
            .mount(&server)
            .await;

        let updated = update_transaction(&client_for(&server), amount_change("42", Some(" 5.00 ")))
            .await
            .expect("updated");
        let value = to_json(&updated);
        assert_eq!(value["status"], "updated");
        assert_eq!(value["transaction"]["id"], "42");
    }

    #[tokio::test]
    async fn update_transaction_without_changes_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = update_transaction(&client_for(&server), amount_change("42", None))
            .await
            .expect_err("nothing to change");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn delete_transaction_reports_id() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/transactions/42"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let deleted = delete_transaction(&client_for(&server), "42")
            .await
            .expect("deleted");
        assert_eq!(to_json(&deleted), json!({"status": "deleted", "id": "42"}));
    }

    #[tokio::test]
    async fn reference_lists_flatten() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"type": "categories", "id": "3", "attributes": {"name": "Dining"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"type": "tags", "id": "5", "attributes": {"tag": "morning"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/budgets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"type": "budgets", "id": "2", "attributes": {
                    "name": "Groceries", "auto_budget_type": "reset",
                    "auto_budget_amount": "400", "auto_budget_period": "monthly"
                }}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/currencies"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"type": "currencies", "id": "1", "attributes": {
                    "code": "EUR", "name": "Euro", "symbol": "€", "default": true
                }}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let page = PageParams::default();

        let categories = to_json(&list_categories(&client, &page).await.expect("categories"));
        assert_eq!(categories["items"][0]["name"], "Dining");

        let tags = to_json(&list_tags(&client, &page).await.expect("tags"));
        assert_eq!(tags["items"][0]["tag"], "morning");

        let budgets = to_json(&list_budgets(&client, &page).await.expect("budgets"));
        assert_eq!(budgets["items"][0]["auto_budget_type"], "reset");
        assert_eq!(budgets["items"][0]["auto_budget_period"], "monthly");
        assert_eq!(budgets["items"][0]["active"], true);

        let limited = PageParams {
            page: None,
            limit: Some(5),
        };
        let currencies = to_json(&list_currencies(&client, &limited).await.expect("currencies"));
        assert_eq!(currencies["items"][0]["code"], "EUR");
        assert_eq!(currencies["items"][0]["decimal_places"], 2);
        assert_eq!(currencies["items"][0]["default"], true);
    }

    #[tokio::test]
    async fn cached_reference_lists_hit_upstream_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).with_cache(ResponseCache::shared());
        let page = PageParams::default();
        let first = to_json(&list_categories(&client, &page).await.expect("first"));
        let second = to_json(&list_categories(&client, &page).await.expect("second"));
        assert_eq!(first, second);
        assert_eq!(first["count"], 0);
    }
}
