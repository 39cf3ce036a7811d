//! Authentication endpoints.
//!
//! `POST /api/auth/login` (public): exchange credentials for a token
//! `POST /api/auth/logout`: revoke the presented token
//! `GET /api/auth/me`: current account

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::accounts;
use crate::api::error::ApiError;
use crate::api::types::{run_blocking, ApiContext, UserContext};
use crate::db;
use crate::models::UserSummary;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in_hours: u32,
    pub user: UserSummary,
}

/// `POST /api/auth/login`: Check credentials and start a session.
///
/// Attempts are rate-limited per username; a success clears the history.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = request.username.trim().to_lowercase();
    if username.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest("Username and password are required".into()));
    }

    {
        let mut limiter = ctx
            .login_limiter
            .lock()
            .map_err(|_| ApiError::Internal("login limiter lock".into()))?;
        limiter
            .check(&username)
            .map_err(|retry_after| ApiError::RateLimited { retry_after })?;
    }

    let core = ctx.core.clone();
    let LoginRequest { username: given, password } = request;
    let given = given.trim().to_string();
    let lookup = given.clone();
    let found = run_blocking(move || {
        let conn = core.open_db()?;
        Ok(accounts::authenticate_user(&conn, &lookup, &password)?)
    })
    .await?;
    let user = match found {
        Some(user) => user,
        None => {
            tracing::warn!(username = %given, "Rejected login");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if let Ok(mut limiter) = ctx.login_limiter.lock() {
        limiter.clear(&username);
    }

    let token = ctx.core.write_sessions()?.issue(&user);
    tracing::info!(username = %user.username, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        token,
        expires_in_hours: ctx.core.config().security_settings.token_expiration_hours,
        user: user.summary(),
    }))
}

/// `POST /api/auth/logout`: Revoke the token used for this request.
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<StatusCode, ApiError> {
    ctx.core.write_sessions()?.revoke_hash(&user.token_hash);
    tracing::info!(username = %user.username, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`: Account behind the current token.
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<UserSummary>, ApiError> {
    let conn = ctx.core.open_db()?;
    let account = db::get_user(&conn, &user.user_id)?
        .filter(|u| u.is_active)
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(account.summary()))
}
