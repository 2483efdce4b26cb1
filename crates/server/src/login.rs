use api_types::login::{
    ChangePasswordRequest, ChangePasswordResponse, LoginRequest, LoginResponse,
};
use axum::{Extension, Json, extract::State};

use crate::{
    LOGIN_FAILED, ServerError,
    links::{Caller, ResourceRef, links},
    require_login,
    server::ServerState,
};

/// Exchange credentials for a bearer token.
///
/// Unknown email, unverified login and wrong password all fail the same way.
pub async fn login(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServerError> {
    let login = state
        .engine
        .authenticate(&payload.email, &payload.password)
        .await?
        .ok_or_else(|| ServerError::Unauthorized(LOGIN_FAILED.to_string()))?;
    let token = state.tokens.issue_access(&login)?;

    Ok(Json(LoginResponse {
        token,
        links: links(&ResourceRef::Session, &caller),
    }))
}

pub async fn change_password(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, ServerError> {
    let login = require_login(&caller)?;
    state
        .engine
        .change_password(login.id, &payload.old_password, &payload.new_password)
        .await?;

    Ok(Json(ChangePasswordResponse {
        links: links(&ResourceRef::PasswordChanged, &caller),
    }))
}
