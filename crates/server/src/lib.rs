use api_types::ErrorResponse;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use links::{Caller, ResourceRef, links};
pub use mail::{LogMailer, Mailer};
pub use server::{ServerState, router, run_with_listener, spawn_with_listener};
pub use token::{Claims, TokenError, TokenPurpose, TokenService};

mod accounts;
mod home;
mod links;
mod login;
mod mail;
mod schedules;
mod server;
mod token;
mod transactions;

/// Answer of every failed login attempt, whatever the reason.
pub const LOGIN_FAILED: &str = "Unknown Email or Password.";

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Token(TokenError),
    NotFound(String),
    Unauthorized(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        EngineError::Inconsistent(_) | EngineError::PasswordHash(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        EngineError::InvalidAmount(_)
        | EngineError::InvalidName(_)
        | EngineError::InvalidEmail(_)
        | EngineError::OutOfOrder(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Inconsistent(what) => {
            tracing::error!("inconsistent store: {what} expected but missing");
            "internal server error".to_string()
        }
        EngineError::PasswordHash(msg) => {
            tracing::error!("password hashing failed: {msg}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

fn status_for_token_error(err: &TokenError) -> StatusCode {
    match err {
        TokenError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        TokenError::Invalid(_) | TokenError::WrongPurpose => StatusCode::UNAUTHORIZED,
    }
}

fn message_for_token_error(err: TokenError) -> String {
    match err {
        TokenError::Encode(msg) => {
            tracing::error!("token signing failed: {msg}");
            "internal server error".to_string()
        }
        other => {
            tracing::warn!("rejected token: {other}");
            "invalid or expired token".to_string()
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Token(err) => (status_for_token_error(&err), message_for_token_error(err)),
            ServerError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            ServerError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// The login behind `caller`, or 401 for anonymous callers.
pub(crate) fn require_login(caller: &Caller) -> Result<&engine::Login, ServerError> {
    caller
        .login()
        .ok_or_else(|| ServerError::Unauthorized("authentication required".to_string()))
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<TokenError> for ServerError {
    fn from(value: TokenError) -> Self {
        Self::Token(value)
    }
}
