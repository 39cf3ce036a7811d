//! Doctor working-hours endpoints.
//!
//! - `GET /api/doctors/:id/schedules` (`?day=1..7`)
//! - `POST /api/doctors/:id/schedules`: add a weekday window
//! - `PUT|DELETE /api/schedules/:id`
//! - `POST /api/schedules/deduplicate`: keep one window per doctor and day

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::endpoints::doctors;
use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, UserContext};
use crate::db;
use crate::models::{DoctorSchedule, ScheduleInput, ScheduleSummary, UserRole};
use crate::validation;

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleQuery {
    pub day: Option<u8>,
}

#[derive(Serialize)]
pub struct SchedulesResponse {
    pub schedules: Vec<ScheduleSummary>,
}

/// `GET /api/doctors/:id/schedules`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(doctor_id): Path<String>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<SchedulesResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let doctor = doctors::load(&conn, &doctor_id)?;
    let schedules = match query.day {
        Some(day) => db::list_schedules_by_day(&conn, &doctor.id, day)?,
        None => db::list_schedules(&conn, &doctor.id)?,
    };
    Ok(Json(SchedulesResponse {
        schedules: schedules.iter().map(DoctorSchedule::summary).collect(),
    }))
}

#[derive(Deserialize)]
pub struct CreateSchedule {
    #[serde(flatten)]
    pub schedule: ScheduleInput,
    /// Overwrite an existing window for the same weekday instead of
    /// failing with 409.
    #[serde(default)]
    pub replace_existing: bool,
}

/// `POST /api/doctors/:id/schedules`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(doctor_id): Path<String>,
    Json(body): Json<CreateSchedule>,
) -> Result<(StatusCode, Json<ScheduleSummary>), ApiError> {
    user.require(UserRole::Receptionist)?;
    validation::validate_schedule(&body.schedule)?;

    let conn = ctx.core.open_db()?;
    let doctor = doctors::load(&conn, &doctor_id)?;
    let schedule = DoctorSchedule::new(doctor.id, body.schedule);
    let saved = db::save_schedule(&conn, &schedule, body.replace_existing)?;
    Ok((StatusCode::CREATED, Json(saved.summary())))
}

/// `PUT /api/schedules/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(input): Json<ScheduleInput>,
) -> Result<Json<ScheduleSummary>, ApiError> {
    user.require(UserRole::Receptionist)?;
    validation::validate_schedule(&input)?;

    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let current = db::get_schedule(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Schedule {id} not found")))?;
    let updated = DoctorSchedule {
        id: current.id,
        ..DoctorSchedule::new(current.doctor_id, input)
    };
    db::update_schedule(&conn, &updated)?;
    Ok(Json(updated.summary()))
}

/// `DELETE /api/schedules/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(UserRole::Receptionist)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    db::delete_schedule(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct DeduplicateResponse {
    pub removed: usize,
}

/// `POST /api/schedules/deduplicate`
pub async fn deduplicate(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<DeduplicateResponse>, ApiError> {
    user.require(UserRole::Admin)?;
    let conn = ctx.core.open_db()?;
    let removed = db::remove_duplicate_schedules(&conn)?;
    Ok(Json(DeduplicateResponse { removed }))
}
