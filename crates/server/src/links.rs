//! Outbound links of every representation.
//!
//! [`links`] is the whole link graph of the API: given what is being
//! returned and who asked, it yields the relations the client may follow.
//! Handlers only build a [`ResourceRef`] after ownership has been checked.

use api_types::{Link, Rel};
use engine::Login;

/// Who is making the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Authenticated(Login),
}

impl Caller {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn login(&self) -> Option<&Login> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(login) => Some(login),
        }
    }
}

/// What a response represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceRef {
    Home,
    Registration,
    Session,
    PasswordChanged,
    LoginDeleted,
    AccountList,
    Account {
        account_id: i32,
    },
    AccountDeleted,
    TransactionList {
        account_id: i32,
    },
    Transaction {
        account_id: i32,
        transaction_id: i32,
    },
    ScheduleList {
        account_id: i32,
    },
    Schedule {
        account_id: i32,
        schedule_id: i32,
    },
    ScheduleDeleted {
        account_id: i32,
    },
}

pub fn home_href() -> String {
    "/".to_string()
}

pub fn login_href() -> String {
    "/login".to_string()
}

pub fn password_href() -> String {
    "/password".to_string()
}

pub fn accounts_href() -> String {
    "/accounts".to_string()
}

pub fn account_href(account_id: i32) -> String {
    format!("/accounts/{account_id}")
}

pub fn transactions_href(account_id: i32) -> String {
    format!("/accounts/{account_id}/transactions")
}

pub fn transaction_href(account_id: i32, transaction_id: i32) -> String {
    format!("/accounts/{account_id}/transactions/{transaction_id}")
}

pub fn schedules_href(account_id: i32) -> String {
    format!("/accounts/{account_id}/schedules")
}

pub fn schedule_href(account_id: i32, schedule_id: i32) -> String {
    format!("/accounts/{account_id}/schedules/{schedule_id}")
}

pub fn verify_href(token: &str) -> String {
    format!("/verify/{token}")
}

/// Links of `resource` as seen by `caller`.
pub fn links(resource: &ResourceRef, caller: &Caller) -> Vec<Link> {
    let home = || Link::new(Rel::Home, home_href());

    match (resource, caller.is_authenticated()) {
        (ResourceRef::Home, false) => vec![
            Link::new(Rel::Login, login_href()),
            Link::new(Rel::Self_, home_href()),
            home(),
        ],
        (ResourceRef::Home, true) => vec![
            Link::new(Rel::Account, accounts_href()),
            Link::new(Rel::Self_, home_href()),
            home(),
        ],
        (ResourceRef::Registration, _) => vec![Link::new(Rel::Self_, home_href()), home()],
        (ResourceRef::Session, _) => vec![home(), Link::new(Rel::Password, password_href())],
        (ResourceRef::PasswordChanged | ResourceRef::LoginDeleted, _) => vec![home()],

        // Everything below belongs to a login: anonymous callers only get
        // the way back home.
        (_, false) => vec![home()],

        (ResourceRef::AccountList, true) => {
            vec![Link::new(Rel::Self_, accounts_href()), home()]
        }
        (ResourceRef::Account { account_id }, true) => vec![
            Link::new(Rel::Self_, account_href(*account_id)),
            Link::new(Rel::Transaction, transactions_href(*account_id)),
            Link::new(Rel::Schedule, schedules_href(*account_id)),
            Link::new(Rel::Account, accounts_href()),
            home(),
        ],
        (ResourceRef::AccountDeleted, true) => {
            vec![Link::new(Rel::Account, accounts_href()), home()]
        }
        (ResourceRef::TransactionList { account_id }, true) => vec![
            Link::new(Rel::Self_, transactions_href(*account_id)),
            Link::new(Rel::Account, account_href(*account_id)),
            home(),
        ],
        (
            ResourceRef::Transaction {
                account_id,
                transaction_id,
            },
            true,
        ) => vec![
            Link::new(Rel::Self_, transaction_href(*account_id, *transaction_id)),
            Link::new(Rel::Account, account_href(*account_id)),
        ],
        (ResourceRef::ScheduleList { account_id }, true) => vec![
            Link::new(Rel::Self_, schedules_href(*account_id)),
            Link::new(Rel::Account, account_href(*account_id)),
            home(),
        ],
        (
            ResourceRef::Schedule {
                account_id,
                schedule_id,
            },
            true,
        ) => vec![
            Link::new(Rel::Self_, schedule_href(*account_id, *schedule_id)),
            Link::new(Rel::Account, account_href(*account_id)),
        ],
        (ResourceRef::ScheduleDeleted { account_id }, true) => vec![
            Link::new(Rel::Schedule, schedules_href(*account_id)),
            Link::new(Rel::Account, account_href(*account_id)),
        ],
    }
}
