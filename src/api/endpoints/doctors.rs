//! Doctor endpoints.
//!
//! - `GET /api/doctors` (`?specialization=`), `POST /api/doctors`
//! - `GET /api/doctors/specializations`
//! - `GET|PUT|DELETE /api/doctors/:id`
//! - `GET /api/doctors/:id/slots?date=`: free 30-minute slots
//! - `GET /api/doctors/:id/appointments?date=`: the doctor's day

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, UserContext};
use crate::db;
use crate::models::display;
use crate::models::{AppointmentView, Doctor, DoctorFilter, DoctorInput, DoctorSummary, UserRole};
use crate::scheduling;
use crate::validation;

#[derive(Debug, Default, Deserialize)]
pub struct DoctorQuery {
    pub specialization: Option<String>,
}

#[derive(Serialize)]
pub struct DoctorsResponse {
    pub doctors: Vec<DoctorSummary>,
}

/// `GET /api/doctors`: all doctors, or active ones of a specialization.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<DoctorQuery>,
) -> Result<Json<DoctorsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let doctors = match query.specialization.filter(|s| !s.trim().is_empty()) {
        Some(spec) => db::list_doctors_by_specialization(&conn, &spec)?,
        None => db::list_doctors(&conn, &DoctorFilter::default())?,
    };
    Ok(Json(DoctorsResponse {
        doctors: doctors.iter().map(Doctor::summary).collect(),
    }))
}

/// `GET /api/doctors/specializations`
pub async fn specializations(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<String>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_specializations(&conn)?))
}

/// `POST /api/doctors`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Json(input): Json<DoctorInput>,
) -> Result<(StatusCode, Json<DoctorSummary>), ApiError> {
    user.require(UserRole::Admin)?;
    validation::validate_doctor(&input)?;

    let conn = ctx.core.open_db()?;
    let doctor = Doctor::new(input, db::now_timestamp());
    db::insert_doctor(&conn, &doctor)?;
    tracing::info!(doctor_id = %doctor.id, "Doctor added");
    Ok((StatusCode::CREATED, Json(doctor.summary())))
}

pub(crate) fn load(conn: &rusqlite::Connection, id: &str) -> Result<Doctor, ApiError> {
    let id = parse_id(id)?;
    db::get_doctor(conn, &id)?.ok_or_else(|| ApiError::NotFound(format!("Doctor {id} not found")))
}

/// `GET /api/doctors/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<DoctorSummary>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(load(&conn, &id)?.summary()))
}

/// `PUT /api/doctors/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(input): Json<DoctorInput>,
) -> Result<Json<DoctorSummary>, ApiError> {
    user.require(UserRole::Admin)?;
    validation::validate_doctor(&input)?;

    let conn = ctx.core.open_db()?;
    let mut doctor = load(&conn, &id)?;
    doctor.apply(input);
    db::update_doctor(&conn, &doctor)?;
    Ok(Json(doctor.summary()))
}

/// `DELETE /api/doctors/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(UserRole::Admin)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    db::delete_doctor(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

#[derive(Serialize)]
pub struct Slot {
    pub time: NaiveTime,
    pub label: String,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    pub doctor_id: uuid::Uuid,
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
}

/// `GET /api/doctors/:id/slots?date=YYYY-MM-DD`
pub async fn slots(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<SlotsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let doctor = load(&conn, &id)?;
    let slots = if doctor.is_active {
        scheduling::available_slots_for(&conn, &doctor.id, query.date)?
    } else {
        Vec::new()
    };

    Ok(Json(SlotsResponse {
        doctor_id: doctor.id,
        date: query.date,
        slots: slots
            .into_iter()
            .map(|time| Slot {
                label: display::format_time(time),
                time,
            })
            .collect(),
    }))
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<AppointmentView>,
}

/// `GET /api/doctors/:id/appointments?date=YYYY-MM-DD`
pub async fn appointments(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let doctor = load(&conn, &id)?;
    let appointments = db::list_doctor_appointments(&conn, &doctor.id, query.date)?;
    Ok(Json(AppointmentsResponse { appointments }))
}
