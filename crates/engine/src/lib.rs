//! Ledger engine: logins, accounts, transactions and recurring schedules on
//! top of a sea-orm connection.
//!
//! Every public operation runs against the database directly; the engine
//! keeps no in-memory copy of the ledger.

pub use accounts::Account;
pub use error::EngineError;
pub use logins::Login;
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, TRANSACTION_WINDOW};
pub use password::{Argon2Hasher, PasswordHasher};
pub use schedules::{Schedule, SchedulePeriod, ScheduleRun, ScheduleState};
pub use transactions::Transaction;

mod accounts;
mod error;
mod logins;
mod money;
mod ops;
mod password;
mod schedules;
mod transactions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
