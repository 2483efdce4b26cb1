//! Signed tokens handed to clients.
//!
//! Two kinds share the same HS256 secret and are told apart by their
//! `purpose` claim: bearer tokens returned by `POST /login`, and the
//! tokens embedded in verification emails. A verification token stays
//! usable until it expires; following it again leaves the login verified.

use chrono::{TimeDelta, Utc};
use engine::Login;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifetime of the link sent by email.
const VERIFICATION_TTL: TimeDelta = TimeDelta::hours(24);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Access,
    Verify,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Login id.
    pub sub: String,
    pub email: String,
    pub purpose: TokenPurpose,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    pub fn login_id(&self) -> Result<i32, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::Invalid(format!("bad subject {:?}", self.sub)))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Encode(String),
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token used for the wrong purpose")]
    WrongPurpose,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: TimeDelta,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], access_ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl: TimeDelta::minutes(access_ttl_minutes),
        }
    }

    pub fn issue_access(&self, login: &Login) -> Result<String, TokenError> {
        self.issue(login, TokenPurpose::Access, self.access_ttl)
    }

    pub fn issue_verification(&self, login: &Login) -> Result<String, TokenError> {
        self.issue(login, TokenPurpose::Verify, VERIFICATION_TTL)
    }

    /// Check signature, expiry and purpose.
    pub fn validate(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|err| TokenError::Invalid(err.to_string()))?;
        if data.claims.purpose != purpose {
            return Err(TokenError::WrongPurpose);
        }
        Ok(data.claims)
    }

    fn issue(
        &self,
        login: &Login,
        purpose: TokenPurpose,
        ttl: TimeDelta,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: login.id.to_string(),
            email: login.email.clone(),
            purpose,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Encode(err.to_string()))
    }
}
