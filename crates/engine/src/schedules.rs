//! Recurring transfers.
//!
//! A `Schedule` is either idle (its next run lies in the future) or due. When
//! due it fires one transaction for its amount and moves `next_run` forward
//! until it is in the future again. Missed periods are not replayed.

use chrono::{DateTime, Months, TimeDelta, Utc};
use sea_orm::entity::prelude::*;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchedulePeriod {
    Day,
    Week,
    Month,
    Year,
}

impl SchedulePeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Moves `from` forward by one period.
    ///
    /// Months are calendar months: Jan 31 + 1 month is the last day of
    /// February. Returns `None` when the result is out of range.
    pub fn advance(self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Day => from.checked_add_signed(TimeDelta::days(1)),
            Self::Week => from.checked_add_signed(TimeDelta::weeks(1)),
            Self::Month => from.checked_add_months(Months::new(1)),
            Self::Year => from.checked_add_months(Months::new(12)),
        }
    }
}

impl TryFrom<&str> for SchedulePeriod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(EngineError::Inconsistent(format!(
                "schedule period {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleState {
    Idle,
    Due,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub id: i32,
    pub account_id: i32,
    pub period: SchedulePeriod,
    pub next_run: DateTime<Utc>,
    pub amount: MoneyCents,
}

impl Schedule {
    pub fn state(&self, now: DateTime<Utc>) -> ScheduleState {
        if now >= self.next_run {
            ScheduleState::Due
        } else {
            ScheduleState::Idle
        }
    }

    /// First run strictly after `now`, stepping one period at a time from
    /// the current `next_run`.
    pub fn next_run_after(&self, now: DateTime<Utc>) -> ResultEngine<DateTime<Utc>> {
        let mut next = self.next_run;
        while next <= now {
            next = self.period.advance(next).ok_or_else(|| {
                EngineError::OutOfOrder(format!("schedule {} next run out of range", self.id))
            })?;
        }
        Ok(next)
    }
}

/// Outcome of firing one due schedule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleRun {
    pub schedule_id: i32,
    pub transaction: crate::Transaction,
    pub next_run: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: i32,
    pub period: String,
    pub next_run: DateTimeUtc,
    pub amount_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Schedule {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            period: SchedulePeriod::try_from(model.period.as_str())?,
            next_run: model.next_run,
            amount: MoneyCents::new(model.amount_minor),
        })
    }
}
