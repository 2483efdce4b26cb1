//! Home resource: entry point, registration, verification and removal of a
//! login.

use api_types::{
    home::HomeResponse,
    login::{RegisterRequest, RegisterResponse},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    ServerError,
    links::{Caller, ResourceRef, links, verify_href},
    require_login,
    server::ServerState,
    token::TokenPurpose,
};

pub async fn get(Extension(caller): Extension<Caller>) -> Json<HomeResponse> {
    Json(HomeResponse {
        email: caller.login().map(|login| login.email.clone()),
        links: links(&ResourceRef::Home, &caller),
    })
}

/// Register a login and send its verification link.
pub async fn register(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ServerError> {
    let login = state
        .engine
        .register(&payload.email, &payload.password)
        .await?;
    tracing::info!(login_id = login.id, "login registered");

    match state.tokens.issue_verification(&login) {
        Ok(token) => {
            let link = format!("{}{}", state.public_url, verify_href(&token));
            state.mailer.send_verification(&login.email, &link);
        }
        Err(err) => tracing::error!("no verification link for login {}: {err}", login.id),
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            email: login.email,
            links: links(&ResourceRef::Registration, &caller),
        }),
    ))
}

/// Target of the emailed link.
pub async fn verify(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> Result<Json<HomeResponse>, ServerError> {
    let claims = state.tokens.validate(&token, TokenPurpose::Verify)?;
    let login = state
        .engine
        .verify_registration(claims.login_id()?, &claims.email)
        .await?
        .ok_or_else(|| ServerError::NotFound("login".to_string()))?;
    tracing::info!(login_id = login.id, "login verified");

    Ok(Json(HomeResponse {
        email: Some(login.email),
        links: links(&ResourceRef::Home, &caller),
    }))
}

/// Delete the caller's login with everything it owns.
pub async fn delete(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<HomeResponse>, ServerError> {
    let login = require_login(&caller)?;
    state.engine.delete_login(login.id).await?;
    tracing::info!(login_id = login.id, "login deleted");

    Ok(Json(HomeResponse {
        email: Some(login.email.clone()),
        links: links(&ResourceRef::LoginDeleted, &caller),
    }))
}
