use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};

use crate::{EngineError, ResultEngine, accounts, logins};

use super::Engine;

/// Generates an existence-guaranteed lookup by primary key: a missing row is
/// reported as [`EngineError::Inconsistent`], never as "not found".
macro_rules! impl_require_by_id {
    ($require_fn:ident, $entity:path, $model:path, $label:literal) => {
        pub(super) async fn $require_fn<C: ConnectionTrait>(
            &self,
            db: &C,
            id: i32,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| EngineError::Inconsistent(format!("{} {id}", $label)))
        }
    };
}

impl Engine {
    impl_require_by_id!(require_login, logins::Entity, logins::Model, "login");

    impl_require_by_id!(require_account, accounts::Entity, accounts::Model, "account");

    /// Account `account_id` if it exists **and** belongs to `login_id`.
    ///
    /// Someone else's account is indistinguishable from a missing one.
    pub(super) async fn find_owned_account<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i32,
        login_id: i32,
    ) -> ResultEngine<Option<accounts::Model>> {
        accounts::Entity::find_by_id(account_id)
            .filter(accounts::Column::LoginId.eq(login_id))
            .one(db)
            .await
            .map_err(Into::into)
    }
}
