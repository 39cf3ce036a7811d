//! Patient registry endpoints.
//!
//! - `GET /api/patients`: list, `?q=` last-name search, `?phone=` lookup
//! - `POST /api/patients`: register
//! - `GET|PUT|DELETE /api/patients/:id`
//! - `PUT /api/patients/:id/telegram`: link a Telegram account
//! - `GET /api/patients/:id/appointments`: visit history, newest first

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, UserContext};
use crate::db;
use crate::models::{
    AppointmentView, Patient, PatientDeletion, PatientInput, PatientSummary, UserRole,
};
use crate::validation;

#[derive(Debug, Default, Deserialize)]
pub struct PatientQuery {
    pub q: Option<String>,
    pub phone: Option<String>,
}

#[derive(Serialize)]
pub struct PatientsResponse {
    pub patients: Vec<PatientSummary>,
}

/// `GET /api/patients`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<PatientQuery>,
) -> Result<Json<PatientsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let patients = if let Some(phone) = query.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        db::get_patient_by_phone(&conn, phone)?.into_iter().collect()
    } else if let Some(term) = query.q.as_deref().filter(|q| !q.trim().is_empty()) {
        db::search_patients(&conn, term)?
    } else {
        db::list_patients(&conn)?
    };

    Ok(Json(PatientsResponse {
        patients: patients.iter().map(Patient::summary).collect(),
    }))
}

/// `POST /api/patients`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Json(input): Json<PatientInput>,
) -> Result<(StatusCode, Json<PatientSummary>), ApiError> {
    user.require(UserRole::Receptionist)?;
    validation::validate_patient(&input)?;

    let conn = ctx.core.open_db()?;
    let patient = Patient::new(input, db::now_timestamp());
    db::insert_patient(&conn, &patient)?;
    tracing::info!(patient_id = %patient.id, by = %user.username, "Patient registered");

    Ok((StatusCode::CREATED, Json(patient.summary())))
}

fn load(conn: &rusqlite::Connection, id: &str) -> Result<Patient, ApiError> {
    let id = parse_id(id)?;
    db::get_patient(conn, &id)?.ok_or_else(|| ApiError::NotFound(format!("Patient {id} not found")))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<PatientSummary>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(load(&conn, &id)?.summary()))
}

/// `PUT /api/patients/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(input): Json<PatientInput>,
) -> Result<Json<PatientSummary>, ApiError> {
    user.require(UserRole::Receptionist)?;
    validation::validate_patient(&input)?;

    let conn = ctx.core.open_db()?;
    let mut patient = load(&conn, &id)?;
    patient.apply(input, db::now_timestamp());
    db::update_patient(&conn, &patient)?;

    Ok(Json(patient.summary()))
}

#[derive(Deserialize)]
pub struct TelegramLink {
    pub telegram_id: i64,
}

/// `PUT /api/patients/:id/telegram`
pub async fn link_telegram(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(link): Json<TelegramLink>,
) -> Result<Json<PatientSummary>, ApiError> {
    user.require(UserRole::Receptionist)?;
    let conn = ctx.core.open_db()?;
    let patient = load(&conn, &id)?;
    db::update_patient_telegram_id(&conn, &patient.id, link.telegram_id)?;
    Ok(Json(load(&conn, &id)?.summary()))
}

/// `DELETE /api/patients/:id`: cascades to appointments, reviews and
/// notifications; refused while active appointments remain.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<PatientDeletion>, ApiError> {
    user.require(UserRole::Receptionist)?;
    let id = parse_id(&id)?;
    let mut conn = ctx.core.open_db()?;
    let report = db::delete_patient(&mut conn, &id)?;
    Ok(Json(report))
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<AppointmentView>,
}

/// `GET /api/patients/:id/appointments`
pub async fn appointments(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let patient = load(&conn, &id)?;
    let appointments = db::list_patient_appointments(&conn, &patient.id)?;
    Ok(Json(AppointmentsResponse { appointments }))
}
