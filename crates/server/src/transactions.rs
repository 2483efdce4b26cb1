//! Transactions API endpoints

use api_types::transaction::{
    TransactionRequest, TransactionResponse, TransactionResponseCollection,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{MoneyCents, Transaction};

use crate::{
    ServerError, accounts::owned_account,
    links::{Caller, ResourceRef, links},
    require_login,
    server::ServerState,
};

fn transaction_response(tx: Transaction, caller: &Caller) -> TransactionResponse {
    let resource = ResourceRef::Transaction {
        account_id: tx.account_id,
        transaction_id: tx.id,
    };
    TransactionResponse {
        transaction_id: tx.id,
        transaction_date: tx.occurred_at.fixed_offset(),
        amount_minor: tx.amount.cents(),
        balance_minor: tx.balance.cents(),
        links: links(&resource, caller),
    }
}

/// Latest transactions, newest first.
pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(account_id): Path<i32>,
) -> Result<Json<TransactionResponseCollection>, ServerError> {
    let login = require_login(&caller)?;
    let account = owned_account(&state, login, account_id).await?;
    let transactions = state
        .engine
        .transactions(&account)
        .await?
        .into_iter()
        .map(|tx| transaction_response(tx, &caller))
        .collect();

    Ok(Json(TransactionResponseCollection {
        transactions,
        links: links(&ResourceRef::TransactionList { account_id }, &caller),
    }))
}

/// Append a transaction dated now.
pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(account_id): Path<i32>,
    Json(payload): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ServerError> {
    let login = require_login(&caller)?;
    let account = owned_account(&state, login, account_id).await?;
    let tx = state
        .engine
        .append_transaction(&account, MoneyCents::new(payload.amount_minor), Utc::now())
        .await?;
    tracing::debug!(account_id, transaction_id = tx.id, balance = %tx.balance, "transaction appended");

    Ok((StatusCode::CREATED, Json(transaction_response(tx, &caller))))
}

pub async fn get(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path((account_id, transaction_id)): Path<(i32, i32)>,
) -> Result<Json<TransactionResponse>, ServerError> {
    let login = require_login(&caller)?;
    let account = owned_account(&state, login, account_id).await?;
    let tx = state
        .engine
        .transaction(&account, transaction_id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("transaction {transaction_id}")))?;

    Ok(Json(transaction_response(tx, &caller)))
}
