use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Account, EngineError, MoneyCents, ResultEngine, Schedule, SchedulePeriod, ScheduleRun,
    ScheduleState, schedules, util::require_non_zero,
};

use super::{Engine, with_tx};

impl Engine {
    /// Register a recurring transfer on `account`.
    pub async fn new_schedule(
        &self,
        account: &Account,
        period: SchedulePeriod,
        next_run: DateTime<Utc>,
        amount: MoneyCents,
    ) -> ResultEngine<Schedule> {
        require_non_zero(amount)?;
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account.id).await?;
            let model = schedules::ActiveModel {
                id: ActiveValue::NotSet,
                account_id: ActiveValue::Set(account.id),
                period: ActiveValue::Set(period.as_str().to_string()),
                next_run: ActiveValue::Set(next_run),
                amount_minor: ActiveValue::Set(amount.cents()),
            }
            .insert(&db_tx)
            .await?;
            Schedule::try_from(model)
        })
    }

    /// Schedules of `account`, oldest first.
    pub async fn schedules(&self, account: &Account) -> ResultEngine<Vec<Schedule>> {
        schedules::Entity::find()
            .filter(schedules::Column::AccountId.eq(account.id))
            .order_by_asc(schedules::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Schedule::try_from)
            .collect()
    }

    /// A single schedule of `account`, `None` when it is not part of it.
    pub async fn schedule(
        &self,
        account: &Account,
        schedule_id: i32,
    ) -> ResultEngine<Option<Schedule>> {
        schedules::Entity::find_by_id(schedule_id)
            .filter(schedules::Column::AccountId.eq(account.id))
            .one(&self.database)
            .await?
            .map(Schedule::try_from)
            .transpose()
    }

    /// Delete a schedule of `account`, returning it when it existed.
    pub async fn delete_schedule(
        &self,
        account: &Account,
        schedule_id: i32,
    ) -> ResultEngine<Option<Schedule>> {
        with_tx!(self, |db_tx| {
            let Some(model) = schedules::Entity::find_by_id(schedule_id)
                .filter(schedules::Column::AccountId.eq(account.id))
                .one(&db_tx)
                .await?
            else {
                return Ok(None);
            };
            let schedule = Schedule::try_from(model)?;
            schedules::Entity::delete_by_id(schedule.id)
                .exec(&db_tx)
                .await?;
            Ok(Some(schedule))
        })
    }

    /// Fire every schedule that is due at `now`.
    ///
    /// Each due schedule appends exactly one transaction dated `now`, then
    /// its `next_run` moves to the first period boundary after `now`. Every
    /// schedule is handled in its own DB transaction; a failure is returned
    /// in the list and does not stop the others.
    pub async fn run_due_schedules(
        &self,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<(i32, ResultEngine<ScheduleRun>)>> {
        let due = schedules::Entity::find()
            .filter(schedules::Column::NextRun.lte(now))
            .order_by_asc(schedules::Column::NextRun)
            .order_by_asc(schedules::Column::Id)
            .all(&self.database)
            .await?;

        let mut runs = Vec::with_capacity(due.len());
        for model in due {
            let schedule_id = model.id;
            runs.push((schedule_id, self.fire_schedule(schedule_id, now).await));
        }
        Ok(runs)
    }

    /// Fire one schedule if it is still due at `now`.
    async fn fire_schedule(&self, schedule_id: i32, now: DateTime<Utc>) -> ResultEngine<ScheduleRun> {
        with_tx!(self, |db_tx| {
            let model = schedules::Entity::find_by_id(schedule_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("schedule {schedule_id}")))?;
            let schedule = Schedule::try_from(model)?;
            if schedule.state(now) != ScheduleState::Due {
                return Err(EngineError::OutOfOrder(format!(
                    "schedule {schedule_id} is not due"
                )));
            }

            let transaction = self
                .append_transaction_in(&db_tx, schedule.account_id, schedule.amount, now)
                .await?;
            let next_run = schedule.next_run_after(now)?;

            schedules::ActiveModel {
                id: ActiveValue::Unchanged(schedule.id),
                next_run: ActiveValue::Set(next_run),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            Ok(ScheduleRun {
                schedule_id,
                transaction,
                next_run,
            })
        })
    }
}
