//! Transactions API endpoints - JSON API and HTMX partial responses
//!
//! Endpoints:
//! - api_transactions: Transaction list, optionally one type (JSON)
//! - api_transaction_detail: Single transaction (JSON)
//! - api_transaction_create: Validate and record a transaction (JSON)
//! - api_transaction_delete: Remove a transaction (JSON)
//! - htmx_ledger: Summary and list (HTML fragment)
//! - htmx_transaction_store: Store a form submission (HTMX)
//! - htmx_transaction_delete: Remove a transaction (HTMX)

use super::page::render_ledger;
use crate::error::ApiResult;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use pennyweb_core::{
    parse_form_input, validate_input, CoreError, LedgerOperations, Transaction, TransactionId,
    TransactionType,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Event sent to the entry form after a successful store so it clears itself
const SAVED_EVENT: &str = "transaction-saved";

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
    pub total_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
}

/// Body of `POST /api/transactions`
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(default)]
    pub description: String,
    pub amount: Option<f64>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub removed: bool,
}

/// Get transactions in insertion order (JSON API)
pub async fn api_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> Json<TransactionsResponse> {
    let ledger = state.ledger.read().await;
    let transactions = match query.kind {
        Some(kind) => ledger.transactions_by_type(kind),
        None => ledger.transactions().to_vec(),
    };
    Json(TransactionsResponse {
        total_count: transactions.len(),
        transactions,
    })
}

/// Get single transaction detail (JSON API)
pub async fn api_transaction_detail(
    State(state): State<AppState>,
    Path(id): Path<TransactionId>,
) -> ApiResult<Json<Transaction>> {
    let ledger = state.ledger.read().await;
    ledger
        .transaction(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| CoreError::TransactionNotFound { id }.into())
}

/// Validate and record a transaction (JSON API)
pub async fn api_transaction_create(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    // unknown type names count as missing, like the form's placeholder
    let kind = request
        .kind
        .as_deref()
        .and_then(|raw| raw.parse::<TransactionType>().ok());

    let mut ledger = state.ledger.write().await;
    let draft = validate_input(
        &request.description,
        request.amount.unwrap_or(f64::NAN),
        kind,
        ledger.max_amount(),
    )?;
    let tx = ledger.record(draft).clone();
    log::info!("Recorded {} transaction {}", tx.kind, tx.id);
    Ok((StatusCode::CREATED, Json(tx)))
}

/// Remove a transaction (JSON API)
pub async fn api_transaction_delete(
    State(state): State<AppState>,
    Path(id): Path<TransactionId>,
) -> Json<RemoveResponse> {
    let mut ledger = state.ledger.write().await;
    Json(RemoveResponse {
        removed: ledger.remove_transaction(id),
    })
}

/// Summary and list fragment
pub async fn htmx_ledger(State(state): State<AppState>) -> Html<String> {
    let ledger = state.ledger.read().await;
    Html(render_ledger(&ledger, &state.config.currency.format(), None))
}

/// Store a new transaction from the entry form (HTMX)
///
/// Validation failures re-render the fragment with the message on top and
/// leave the ledger untouched.
pub async fn htmx_transaction_store(State(state): State<AppState>, body: String) -> Response {
    let params = parse_form_body(&body);
    let field = |name: &str| params.get(name).map(String::as_str).unwrap_or("");

    let format = state.config.currency.format();
    let mut ledger = state.ledger.write().await;
    match parse_form_input(
        field("description"),
        field("amount"),
        field("type"),
        ledger.max_amount(),
    ) {
        Ok(draft) => {
            let id = ledger.record(draft).id;
            log::info!("Recorded transaction {} from form", id);
            (
                [("HX-Trigger", SAVED_EVENT)],
                Html(render_ledger(&ledger, &format, None)),
            )
                .into_response()
        }
        Err(e) => {
            log::debug!("Rejected form input: {}", e);
            Html(render_ledger(&ledger, &format, Some(&e.to_string()))).into_response()
        }
    }
}

/// Remove a transaction and re-render the fragment (HTMX)
pub async fn htmx_transaction_delete(
    State(state): State<AppState>,
    Path(id): Path<TransactionId>,
) -> Html<String> {
    let mut ledger = state.ledger.write().await;
    if !ledger.remove_transaction(id) {
        log::debug!("Delete of unknown transaction {} ignored", id);
    }
    Html(render_ledger(&ledger, &state.config.currency.format(), None))
}

/// Decode an `application/x-www-form-urlencoded` body
fn parse_form_body(body: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in body.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let decode = |s: &str| {
            let s = s.replace('+', " ");
            urlencoding::decode(&s)
                .map(|d| d.into_owned())
                .unwrap_or_default()
        };
        params.insert(decode(key), decode(value));
    }
    params
}
