use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    Account, ResultEngine, accounts, schedules, transactions, util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Open a new account owned by `login_id`.
    pub async fn new_account(&self, login_id: i32, name: &str) -> ResultEngine<Account> {
        let name = normalize_required_name(name, "account")?;
        with_tx!(self, |db_tx| {
            self.require_login(&db_tx, login_id).await?;
            let model = accounts::ActiveModel {
                id: ActiveValue::NotSet,
                login_id: ActiveValue::Set(login_id),
                name: ActiveValue::Set(name),
            }
            .insert(&db_tx)
            .await?;
            Ok(Account::from(model))
        })
    }

    /// Account `account_id` as seen by `login_id`: `None` when it does not
    /// exist or belongs to another login.
    pub async fn account(&self, account_id: i32, login_id: i32) -> ResultEngine<Option<Account>> {
        let model = self
            .find_owned_account(&self.database, account_id, login_id)
            .await?;
        Ok(model.map(Account::from))
    }

    /// All accounts of `login_id`, oldest first.
    pub async fn accounts(&self, login_id: i32) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::LoginId.eq(login_id))
            .order_by_asc(accounts::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Account::from).collect())
    }

    /// Delete an account with its transactions and schedules.
    ///
    /// Returns the deleted account, or `None` when `login_id` cannot see it.
    pub async fn delete_account(
        &self,
        account_id: i32,
        login_id: i32,
    ) -> ResultEngine<Option<Account>> {
        with_tx!(self, |db_tx| {
            let Some(model) = self
                .find_owned_account(&db_tx, account_id, login_id)
                .await?
            else {
                return Ok(None);
            };
            self.delete_account_rows(&db_tx, model.id).await?;
            Ok(Some(Account::from(model)))
        })
    }

    /// Remove an account row after its children. Foreign keys carry no
    /// `ON DELETE CASCADE`, so the order matters.
    pub(super) async fn delete_account_rows(
        &self,
        db: &DatabaseTransaction,
        account_id: i32,
    ) -> ResultEngine<()> {
        schedules::Entity::delete_many()
            .filter(schedules::Column::AccountId.eq(account_id))
            .exec(db)
            .await?;
        transactions::Entity::delete_many()
            .filter(transactions::Column::AccountId.eq(account_id))
            .exec(db)
            .await?;
        accounts::Entity::delete_by_id(account_id).exec(db).await?;
        Ok(())
    }
}
