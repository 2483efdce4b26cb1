//! Schedules API endpoints

use api_types::schedule::{
    SchedulePeriod as ApiPeriod, ScheduleRequest, ScheduleResponse, ScheduleResponseCollection,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{MoneyCents, Schedule, SchedulePeriod};

use crate::{
    ServerError, accounts::owned_account,
    links::{Caller, ResourceRef, links},
    require_login,
    server::ServerState,
};

fn map_period(period: SchedulePeriod) -> ApiPeriod {
    match period {
        SchedulePeriod::Day => ApiPeriod::Day,
        SchedulePeriod::Week => ApiPeriod::Week,
        SchedulePeriod::Month => ApiPeriod::Month,
        SchedulePeriod::Year => ApiPeriod::Year,
    }
}

fn engine_period(period: ApiPeriod) -> SchedulePeriod {
    match period {
        ApiPeriod::Day => SchedulePeriod::Day,
        ApiPeriod::Week => SchedulePeriod::Week,
        ApiPeriod::Month => SchedulePeriod::Month,
        ApiPeriod::Year => SchedulePeriod::Year,
    }
}

fn schedule_response(
    schedule: Schedule,
    resource: ResourceRef,
    caller: &Caller,
) -> ScheduleResponse {
    ScheduleResponse {
        schedule_id: schedule.id,
        time_period: map_period(schedule.period),
        next_run: schedule.next_run.fixed_offset(),
        amount_minor: schedule.amount.cents(),
        links: links(&resource, caller),
    }
}

fn schedule_resource(schedule: &Schedule) -> ResourceRef {
    ResourceRef::Schedule {
        account_id: schedule.account_id,
        schedule_id: schedule.id,
    }
}

pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(account_id): Path<i32>,
) -> Result<Json<ScheduleResponseCollection>, ServerError> {
    let login = require_login(&caller)?;
    let account = owned_account(&state, login, account_id).await?;
    let schedules = state
        .engine
        .schedules(&account)
        .await?
        .into_iter()
        .map(|schedule| {
            let resource = schedule_resource(&schedule);
            schedule_response(schedule, resource, &caller)
        })
        .collect();

    Ok(Json(ScheduleResponseCollection {
        schedules,
        links: links(&ResourceRef::ScheduleList { account_id }, &caller),
    }))
}

pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(account_id): Path<i32>,
    Json(payload): Json<ScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>), ServerError> {
    let login = require_login(&caller)?;
    let account = owned_account(&state, login, account_id).await?;
    let schedule = state
        .engine
        .new_schedule(
            &account,
            engine_period(payload.time_period),
            payload.next_run.with_timezone(&Utc),
            MoneyCents::new(payload.amount_minor),
        )
        .await?;
    tracing::info!(account_id, schedule_id = schedule.id, "schedule created");

    let resource = schedule_resource(&schedule);
    Ok((
        StatusCode::CREATED,
        Json(schedule_response(schedule, resource, &caller)),
    ))
}

pub async fn get(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path((account_id, schedule_id)): Path<(i32, i32)>,
) -> Result<Json<ScheduleResponse>, ServerError> {
    let login = require_login(&caller)?;
    let account = owned_account(&state, login, account_id).await?;
    let schedule = state
        .engine
        .schedule(&account, schedule_id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("schedule {schedule_id}")))?;

    let resource = schedule_resource(&schedule);
    Ok(Json(schedule_response(schedule, resource, &caller)))
}

pub async fn delete(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path((account_id, schedule_id)): Path<(i32, i32)>,
) -> Result<Json<ScheduleResponse>, ServerError> {
    let login = require_login(&caller)?;
    let account = owned_account(&state, login, account_id).await?;
    let schedule = state
        .engine
        .delete_schedule(&account, schedule_id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("schedule {schedule_id}")))?;
    tracing::info!(account_id, schedule_id, "schedule deleted");

    Ok(Json(schedule_response(
        schedule,
        ResourceRef::ScheduleDeleted { account_id },
        &caller,
    )))
}
