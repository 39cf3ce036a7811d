//! Appointment endpoints.
//!
//! - `GET /api/appointments`: one day (`?date=`, default today) or a
//!   range (`?from=&to=`)
//! - `POST /api/appointments`: book a free slot
//! - `GET|DELETE /api/appointments/:id`
//! - `PUT /api/appointments/:id/status`, `POST /api/appointments/:id/cancel`

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, UserContext};
use crate::booking::{self, BookingRequest};
use crate::db;
use crate::models::{AppointmentStatus, AppointmentView, UserRole};
use crate::validation;

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentQuery {
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<AppointmentView>,
}

/// `GET /api/appointments`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let appointments = match (query.from, query.to) {
        (Some(from), Some(to)) => {
            validation::validate_date_range(from, to)?;
            db::list_appointments_by_date_range(&conn, from, to)?
        }
        (None, None) => {
            let date = query.date.unwrap_or_else(|| Local::now().date_naive());
            db::list_appointments_by_date(&conn, date)?
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Both 'from' and 'to' are required for a date range".into(),
            ))
        }
    };
    Ok(Json(AppointmentsResponse { appointments }))
}

fn view(conn: &rusqlite::Connection, id: &uuid::Uuid) -> Result<AppointmentView, ApiError> {
    db::get_appointment_view(conn, id)?
        .ok_or_else(|| ApiError::NotFound(format!("Appointment {id} not found")))
}

/// `POST /api/appointments`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<AppointmentView>), ApiError> {
    user.require(UserRole::Receptionist)?;
    let mut conn = ctx.core.open_db()?;
    let appointment = booking::book_appointment(&mut conn, &request, Local::now().naive_local())?;
    Ok((StatusCode::CREATED, Json(view(&conn, &appointment.id)?)))
}

/// `GET /api/appointments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentView>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(view(&conn, &id)?))
}

#[derive(Deserialize)]
pub struct StatusChange {
    pub status: AppointmentStatus,
}

/// `PUT /api/appointments/:id/status`
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Result<Json<AppointmentView>, ApiError> {
    user.require(UserRole::Receptionist)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    db::update_appointment_status(&conn, &id, change.status)?;
    Ok(Json(view(&conn, &id)?))
}

/// `POST /api/appointments/:id/cancel`
pub async fn cancel(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentView>, ApiError> {
    user.require(UserRole::Receptionist)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    db::cancel_appointment(&conn, &id)?;
    Ok(Json(view(&conn, &id)?))
}

/// `DELETE /api/appointments/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(UserRole::Receptionist)?;
    let id = parse_id(&id)?;
    let mut conn = ctx.core.open_db()?;
    db::delete_appointment(&mut conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
