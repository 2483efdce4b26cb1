use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};

use crate::{
    Account, EngineError, MoneyCents, ResultEngine, Transaction, transactions,
    util::require_non_zero,
};

use super::{Engine, with_tx};

/// How many transactions a listing returns at most.
///
/// This is a display window: older lines exist but are not listed.
pub const TRANSACTION_WINDOW: u64 = 100;

impl Engine {
    /// Append a transaction to `account` and compute its running balance.
    ///
    /// - the balance is the previous line's balance (0 for the first line)
    ///   plus `amount`;
    /// - `occurred_at` must not be older than the latest line of the
    ///   account, otherwise balances would no longer follow timestamps;
    /// - debits are not checked against the balance.
    ///
    /// Reading the previous balance and inserting the new line happen in one
    /// DB transaction.
    pub async fn append_transaction(
        &self,
        account: &Account,
        amount: MoneyCents,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        require_non_zero(amount)?;
        with_tx!(self, |db_tx| {
            self.append_transaction_in(&db_tx, account.id, amount, occurred_at)
                .await
        })
    }

    pub(super) async fn append_transaction_in(
        &self,
        db: &DatabaseTransaction,
        account_id: i32,
        amount: MoneyCents,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        self.require_account(db, account_id).await?;

        let latest = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id))
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::Id)
            .one(db)
            .await?;

        let previous = match latest {
            Some(latest) if occurred_at < latest.occurred_at => {
                return Err(EngineError::OutOfOrder(format!(
                    "transaction at {occurred_at} is older than the latest one at {}",
                    latest.occurred_at
                )));
            }
            Some(latest) => MoneyCents::new(latest.balance_minor),
            None => MoneyCents::ZERO,
        };
        let balance = previous
            .checked_add(amount)
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;

        let model = transactions::ActiveModel {
            id: ActiveValue::NotSet,
            account_id: ActiveValue::Set(account_id),
            occurred_at: ActiveValue::Set(occurred_at),
            amount_minor: ActiveValue::Set(amount.cents()),
            balance_minor: ActiveValue::Set(balance.cents()),
        }
        .insert(db)
        .await?;

        Ok(Transaction::from(model))
    }

    /// Latest transactions of `account`, newest first, at most
    /// [`TRANSACTION_WINDOW`] of them.
    pub async fn transactions(&self, account: &Account) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account.id))
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::Id)
            .limit(TRANSACTION_WINDOW)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Transaction::from).collect())
    }

    /// A single transaction of `account`, `None` when it is not part of it.
    pub async fn transaction(
        &self,
        account: &Account,
        transaction_id: i32,
    ) -> ResultEngine<Option<Transaction>> {
        let model = transactions::Entity::find_by_id(transaction_id)
            .filter(transactions::Column::AccountId.eq(account.id))
            .one(&self.database)
            .await?;
        Ok(model.map(Transaction::from))
    }
}
