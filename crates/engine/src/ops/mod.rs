use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{Argon2Hasher, PasswordHasher, ResultEngine};

mod access;
mod accounts;
mod logins;
mod schedules;
mod transactions;

pub use transactions::TRANSACTION_WINDOW;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    hasher: Arc<dyn PasswordHasher>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    hasher: Option<Arc<dyn PasswordHasher>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the default Argon2 password hasher.
    pub fn hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> EngineBuilder {
        self.hasher = Some(hasher);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            hasher: self.hasher.unwrap_or_else(|| Arc::new(Argon2Hasher)),
        })
    }
}
