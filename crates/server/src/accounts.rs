//! Accounts API endpoints

use api_types::account::{AccountRequest, AccountResponse, AccountResponseCollection};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Account, Login};

use crate::{
    ServerError,
    links::{Caller, ResourceRef, links},
    require_login,
    server::ServerState,
};

/// Account `account_id` of `login`. Another login's account is a 404, like a
/// missing one.
pub(crate) async fn owned_account(
    state: &ServerState,
    login: &Login,
    account_id: i32,
) -> Result<Account, ServerError> {
    state
        .engine
        .account(account_id, login.id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("account {account_id}")))
}

fn account_response(account: Account, resource: ResourceRef, caller: &Caller) -> AccountResponse {
    AccountResponse {
        account_id: account.id,
        account_name: account.name,
        links: links(&resource, caller),
    }
}

pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<AccountResponseCollection>, ServerError> {
    let login = require_login(&caller)?;
    let accounts = state
        .engine
        .accounts(login.id)
        .await?
        .into_iter()
        .map(|account| {
            let resource = ResourceRef::Account {
                account_id: account.id,
            };
            account_response(account, resource, &caller)
        })
        .collect();

    Ok(Json(AccountResponseCollection {
        accounts,
        links: links(&ResourceRef::AccountList, &caller),
    }))
}

pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ServerError> {
    let login = require_login(&caller)?;
    let account = state
        .engine
        .new_account(login.id, &payload.account_name)
        .await?;
    let resource = ResourceRef::Account {
        account_id: account.id,
    };

    Ok((
        StatusCode::CREATED,
        Json(account_response(account, resource, &caller)),
    ))
}

pub async fn get(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(account_id): Path<i32>,
) -> Result<Json<AccountResponse>, ServerError> {
    let login = require_login(&caller)?;
    let account = owned_account(&state, login, account_id).await?;

    Ok(Json(account_response(
        account,
        ResourceRef::Account { account_id },
        &caller,
    )))
}

/// Delete an account with its transactions and schedules.
pub async fn delete(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(account_id): Path<i32>,
) -> Result<Json<AccountResponse>, ServerError> {
    let login = require_login(&caller)?;
    let account = state
        .engine
        .delete_account(account_id, login.id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("account {account_id}")))?;
    tracing::info!(account_id, "account deleted");

    Ok(Json(account_response(
        account,
        ResourceRef::AccountDeleted,
        &caller,
    )))
}
