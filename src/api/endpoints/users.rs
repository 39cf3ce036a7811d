//! Staff account administration. Every route requires the admin role.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use crate::accounts;
use crate::api::error::ApiError;
use crate::api::types::{parse_id, run_blocking, ApiContext, UserContext};
use crate::db;
use crate::models::{User, UserInput, UserRole, UserSummary};

#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

/// `GET /api/users`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<UsersResponse>, ApiError> {
    user.require(UserRole::Admin)?;
    let conn = ctx.core.open_db()?;
    let users = db::list_users(&conn)?;
    Ok(Json(UsersResponse {
        users: users.iter().map(User::summary).collect(),
    }))
}

/// `POST /api/users`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Json(input): Json<UserInput>,
) -> Result<(StatusCode, Json<UserSummary>), ApiError> {
    user.require(UserRole::Admin)?;
    let core = ctx.core.clone();
    let created = run_blocking(move || {
        let conn = core.open_db()?;
        Ok(accounts::create_user(&conn, &input)?)
    })
    .await?;
    tracing::info!(username = %created.username, role = %created.role, by = %user.username, "User created");
    Ok((StatusCode::CREATED, Json(created.summary())))
}

/// `GET /api/users/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<UserSummary>, ApiError> {
    user.require(UserRole::Admin)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let found = db::get_user(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("User {id} not found")))?;
    Ok(Json(found.summary()))
}

/// `PUT /api/users/:id`: every session of the account is revoked, the
/// caller's own included, so role and status changes apply immediately.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(input): Json<UserInput>,
) -> Result<Json<UserSummary>, ApiError> {
    user.require(UserRole::Admin)?;
    let id = parse_id(&id)?;
    let core = ctx.core.clone();
    let updated = run_blocking(move || {
        let conn = core.open_db()?;
        Ok(accounts::update_user(&conn, &id, &input)?)
    })
    .await?;

    let revoked = ctx.core.write_sessions()?.revoke_user(&id);
    tracing::info!(username = %updated.username, revoked, by = %user.username, "User updated");
    Ok(Json(updated.summary()))
}

/// `DELETE /api/users/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(UserRole::Admin)?;
    let id = parse_id(&id)?;
    if id == user.user_id {
        return Err(ApiError::Conflict("You cannot delete your own account".into()));
    }

    let conn = ctx.core.open_db()?;
    db::delete_user(&conn, &id)?;
    ctx.core.write_sessions()?.revoke_user(&id);
    Ok(StatusCode::NO_CONTENT)
}
