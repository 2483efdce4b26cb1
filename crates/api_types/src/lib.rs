//! Wire types shared by the server and its clients.
//!
//! Every representation carries `links`: the only way a client learns where
//! to go next. Clients look links up by relation ([`Resource::link`]) and
//! never build URLs themselves.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Relation of a link to the resource carrying it. The set is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rel {
    Home,
    #[serde(rename = "self")]
    Self_,
    Login,
    Account,
    Transaction,
    Schedule,
    Password,
}

impl Rel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Self_ => "self",
            Self::Login => "login",
            Self::Account => "account",
            Self::Transaction => "transaction",
            Self::Schedule => "schedule",
            Self::Password => "password",
        }
    }
}

impl core::fmt::Display for Rel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: Rel,
    /// Server-relative path, resolved by the client against its base URL.
    pub href: String,
}

impl Link {
    pub fn new(rel: Rel, href: impl Into<String>) -> Self {
        Self {
            rel,
            href: href.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("resource has no \"{0}\" link")]
    Missing(Rel),
    #[error("resource has more than one \"{0}\" link")]
    Ambiguous(Rel),
}

/// Find the single link with relation `rel`.
pub fn find_link(links: &[Link], rel: Rel) -> Result<&Link, LinkError> {
    let mut matching = links.iter().filter(|link| link.rel == rel);
    let link = matching.next().ok_or(LinkError::Missing(rel))?;
    if matching.next().is_some() {
        return Err(LinkError::Ambiguous(rel));
    }
    Ok(link)
}

/// A representation that can be navigated from.
pub trait Resource {
    fn links(&self) -> &[Link];

    fn link(&self, rel: Rel) -> Result<&Link, LinkError> {
        find_link(self.links(), rel)
    }
}

macro_rules! impl_resource {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Resource for $ty {
                fn links(&self) -> &[Link] {
                    &self.links
                }
            }
        )+
    };
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub mod home {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct HomeResponse {
        /// Present when the caller is authenticated.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub email: Option<String>,
        pub links: Vec<Link>,
    }
}

pub mod login {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct RegisterRequest {
        pub email: String,
        pub password: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct RegisterResponse {
        pub email: String,
        pub links: Vec<Link>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct LoginRequest {
        pub email: String,
        pub password: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        /// Bearer token for the `Authorization` header.
        pub token: String,
        pub links: Vec<Link>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ChangePasswordRequest {
        pub old_password: String,
        pub new_password: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ChangePasswordResponse {
        pub links: Vec<Link>,
    }
}

pub mod account {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AccountRequest {
        pub account_name: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AccountResponse {
        pub account_id: i32,
        pub account_name: String,
        pub links: Vec<Link>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AccountResponseCollection {
        pub accounts: Vec<AccountResponse>,
        pub links: Vec<Link>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TransactionRequest {
        /// Signed amount in cents: positive credits, negative debits.
        pub amount_minor: i64,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TransactionResponse {
        pub transaction_id: i32,
        /// RFC3339 timestamp.
        pub transaction_date: DateTime<FixedOffset>,
        pub amount_minor: i64,
        /// Account balance right after this transaction.
        pub balance_minor: i64,
        pub links: Vec<Link>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TransactionResponseCollection {
        /// Newest first, at most 100 entries.
        pub transactions: Vec<TransactionResponse>,
        pub links: Vec<Link>,
    }
}

pub mod schedule {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SchedulePeriod {
        Day,
        Week,
        Month,
        Year,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ScheduleRequest {
        pub time_period: SchedulePeriod,
        /// RFC3339 timestamp of the first run.
        pub next_run: DateTime<FixedOffset>,
        pub amount_minor: i64,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ScheduleResponse {
        pub schedule_id: i32,
        pub time_period: SchedulePeriod,
        pub next_run: DateTime<FixedOffset>,
        pub amount_minor: i64,
        pub links: Vec<Link>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ScheduleResponseCollection {
        pub schedules: Vec<ScheduleResponse>,
        pub links: Vec<Link>,
    }
}

impl_resource!(
    home::HomeResponse,
    login::RegisterResponse,
    login::LoginResponse,
    login::ChangePasswordResponse,
    account::AccountResponse,
    account::AccountResponseCollection,
    transaction::TransactionResponse,
    transaction::TransactionResponseCollection,
    schedule::ScheduleResponse,
    schedule::ScheduleResponseCollection,
);
