//! HTTP router for the front-office API.
//!
//! Routes are nested under `/api/`. Health and login are public; all other
//! routes pass through Auth → Audit before reaching the handler.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router over shared application state.
///
/// Middleware reads `Extension<ApiContext>` (outermost layer); handlers use
/// `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/auth/logout", post(endpoints::auth::logout))
        .route("/auth/me", get(endpoints::auth::me))
        // Patients
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::remove),
        )
        .route("/patients/:id/telegram", put(endpoints::patients::link_telegram))
        .route(
            "/patients/:id/appointments",
            get(endpoints::patients::appointments),
        )
        // Doctors and their working hours
        .route(
            "/doctors",
            get(endpoints::doctors::list).post(endpoints::doctors::create),
        )
        .route(
            "/doctors/specializations",
            get(endpoints::doctors::specializations),
        )
        .route(
            "/doctors/:id",
            get(endpoints::doctors::detail)
                .put(endpoints::doctors::update)
                .delete(endpoints::doctors::remove),
        )
        .route(
            "/doctors/:id/schedules",
            get(endpoints::schedules::list).post(endpoints::schedules::create),
        )
        .route("/doctors/:id/slots", get(endpoints::doctors::slots))
        .route(
            "/doctors/:id/appointments",
            get(endpoints::doctors::appointments),
        )
        .route(
            "/schedules/deduplicate",
            post(endpoints::schedules::deduplicate),
        )
        .route(
            "/schedules/:id",
            put(endpoints::schedules::update).delete(endpoints::schedules::remove),
        )
        // Services
        .route(
            "/services",
            get(endpoints::services::list).post(endpoints::services::create),
        )
        .route(
            "/services/:id",
            get(endpoints::services::detail)
                .put(endpoints::services::update)
                .delete(endpoints::services::remove),
        )
        // Appointments
        .route(
            "/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::create),
        )
        .route(
            "/appointments/:id",
            get(endpoints::appointments::detail).delete(endpoints::appointments::remove),
        )
        .route(
            "/appointments/:id/status",
            put(endpoints::appointments::update_status),
        )
        .route(
            "/appointments/:id/cancel",
            post(endpoints::appointments::cancel),
        )
        // Staff accounts
        .route(
            "/users",
            get(endpoints::users::list).post(endpoints::users::create),
        )
        .route(
            "/users/:id",
            get(endpoints::users::detail)
                .put(endpoints::users::update)
                .delete(endpoints::users::remove),
        )
        .with_state(ctx.clone())
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(cors)
}
