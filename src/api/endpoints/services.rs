//! Service catalogue endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, UserContext};
use crate::db;
use crate::models::{Service, ServiceInput, ServiceSummary, UserRole};
use crate::validation;

#[derive(Debug, Default, Deserialize)]
pub struct ServiceQuery {
    #[serde(default)]
    pub active: bool,
}

#[derive(Serialize)]
pub struct ServicesResponse {
    pub services: Vec<ServiceSummary>,
}

/// `GET /api/services` (`?active=true` for the bookable ones only)
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<ServiceQuery>,
) -> Result<Json<ServicesResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let services = db::list_services(&conn, query.active)?;
    Ok(Json(ServicesResponse {
        services: services.iter().map(Service::summary).collect(),
    }))
}

/// `POST /api/services`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Json(input): Json<ServiceInput>,
) -> Result<(StatusCode, Json<ServiceSummary>), ApiError> {
    user.require(UserRole::Admin)?;
    validation::validate_service(&input)?;

    let conn = ctx.core.open_db()?;
    let service = Service::new(input);
    db::insert_service(&conn, &service)?;
    Ok((StatusCode::CREATED, Json(service.summary())))
}

fn load(conn: &rusqlite::Connection, id: &str) -> Result<Service, ApiError> {
    let id = parse_id(id)?;
    db::get_service(conn, &id)?.ok_or_else(|| ApiError::NotFound(format!("Service {id} not found")))
}

/// `GET /api/services/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<ServiceSummary>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(load(&conn, &id)?.summary()))
}

/// `PUT /api/services/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(input): Json<ServiceInput>,
) -> Result<Json<ServiceSummary>, ApiError> {
    user.require(UserRole::Admin)?;
    validation::validate_service(&input)?;

    let conn = ctx.core.open_db()?;
    let mut service = load(&conn, &id)?;
    service.apply(input);
    db::update_service(&conn, &service)?;
    Ok(Json(service.summary()))
}

/// `DELETE /api/services/:id`: refused while appointments reference it.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(UserRole::Admin)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    db::delete_service(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
