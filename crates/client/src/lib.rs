//! HTTP client that walks the API by relation.
//!
//! Apart from the base URL, every request goes to an `href` taken from a
//! previously fetched representation: the client never builds paths.

use api_types::{
    ErrorResponse, LinkError, Rel, Resource,
    home::HomeResponse,
    login::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
};
use reqwest::{Method, Url};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("server error: {0}")]
    Server(String),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error("invalid url: {0}")]
    Url(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
    token: Option<String>,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ClientError::Url(format!("invalid base_url: {err}")))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            token: None,
        })
    }

    /// Bearer token sent with every request, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// The entry point: the only fixed location of the API.
    pub async fn home(&self) -> Result<HomeResponse, ClientError> {
        self.request(Method::GET, "/", None::<&()>).await
    }

    /// Open an out-of-band link, such as the one received by email.
    pub async fn open<T: DeserializeOwned>(&self, href: &str) -> Result<T, ClientError> {
        self.request(Method::GET, href, None::<&()>).await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        from: &impl Resource,
        rel: Rel,
    ) -> Result<T, ClientError> {
        let href = &from.link(rel)?.href;
        self.request(Method::GET, href, None::<&()>).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        from: &impl Resource,
        rel: Rel,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        let href = &from.link(rel)?.href;
        self.request(Method::POST, href, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        from: &impl Resource,
        rel: Rel,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        let href = &from.link(rel)?.href;
        self.request(Method::PUT, href, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        from: &impl Resource,
        rel: Rel,
    ) -> Result<T, ClientError> {
        let href = &from.link(rel)?.href;
        self.request(Method::DELETE, href, None::<&()>).await
    }

    /// Register through the home resource.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse, ClientError> {
        let home = self.home().await?;
        let body = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post(&home, Rel::Self_, &body).await
    }

    /// Follow the home `login` link and keep the returned token.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let home = self.home().await?;
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let session: LoginResponse = self.post(&home, Rel::Login, &body).await?;
        self.token = Some(session.token.clone());
        Ok(session)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        href: &str,
        body: Option<&impl Serialize>,
    ) -> Result<T, ClientError> {
        let endpoint = self
            .base_url
            .join(href)
            .map_err(|err| ClientError::Url(format!("invalid href {href:?}: {err}")))?;
        tracing::debug!("{method} {endpoint}");

        let mut builder = self.http.request(method, endpoint);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let res = builder.send().await?;

        if res.status().is_success() {
            return res.json::<T>().await.map_err(ClientError::Transport);
        }

        let status = res.status();
        let body = res
            .json::<ErrorResponse>()
            .await
            .map(|err| err.error)
            .unwrap_or_else(|_| "unknown error".to_string());

        Err(error_for_status(status.as_u16(), body))
    }
}

/// Ownership failures come back as 404, so there is no "forbidden" case.
fn error_for_status(status: u16, body: String) -> ClientError {
    match status {
        401 => ClientError::Unauthorized(body),
        404 => ClientError::NotFound,
        409 => ClientError::Conflict(body),
        422 => ClientError::Validation(body),
        _ => ClientError::Server(body),
    }
}
