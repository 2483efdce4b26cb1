use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use std::sync::Arc;

use crate::{
    ServerError, accounts, home, links::Caller, login, mail::Mailer, schedules,
    token::{TokenPurpose, TokenService},
    transactions,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub tokens: Arc<TokenService>,
    pub mailer: Arc<dyn Mailer>,
    /// Prefix of the links sent by email. Empty keeps them server-relative.
    pub public_url: Arc<str>,
}

impl ServerState {
    pub fn new(engine: Arc<Engine>, tokens: TokenService, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            engine,
            tokens: Arc::new(tokens),
            mailer,
            public_url: Arc::from(""),
        }
    }

    pub fn with_public_url(mut self, public_url: &str) -> Self {
        self.public_url = Arc::from(public_url.trim_end_matches('/'));
        self
    }
}

/// Resolve the caller from the `Authorization` header.
///
/// No header means an anonymous caller; a header carrying an invalid or
/// expired token is rejected outright.
async fn auth(
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = match auth_header {
        Ok(TypedHeader(authorization)) => {
            match resolve_caller(&state, authorization.token()).await {
                Ok(caller) => caller,
                Err(err) => return err.into_response(),
            }
        }
        Err(rejection) if rejection.is_missing() => Caller::Anonymous,
        Err(_) => {
            return ServerError::Unauthorized("Missing or invalid Authorization header".to_string())
                .into_response();
        }
    };

    request.extensions_mut().insert(caller);
    next.run(request).await
}

async fn resolve_caller(state: &ServerState, token: &str) -> Result<Caller, ServerError> {
    let claims = state.tokens.validate(token, TokenPurpose::Access)?;
    // A valid token names a login that must exist.
    let login = state.engine.login_by_id(claims.login_id()?).await?;
    Ok(Caller::Authenticated(login))
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/",
            get(home::get).post(home::register).delete(home::delete),
        )
        .route("/verify/{token}", get(home::verify))
        .route("/login", post(login::login))
        .route("/password", put(login::change_password))
        .route("/accounts", get(accounts::list).post(accounts::create))
        .route(
            "/accounts/{account_id}",
            get(accounts::get).delete(accounts::delete),
        )
        .route(
            "/accounts/{account_id}/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/accounts/{account_id}/transactions/{transaction_id}",
            get(transactions::get),
        )
        .route(
            "/accounts/{account_id}/schedules",
            get(schedules::list).post(schedules::create),
        )
        .route(
            "/accounts/{account_id}/schedules/{schedule_id}",
            get(schedules::get).delete(schedules::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
