//! Clinic API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack on protected routes (outermost first):
//! Extension(ApiContext) → caller lookup → audit logger → handler

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the clinic API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn clinic_api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    // Layers apply bottom (outermost) to top (innermost).
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/users", get(endpoints::users::list))
        .route("/users/me", get(endpoints::users::me))
        .route(
            "/users/:id",
            patch(endpoints::users::update).delete(endpoints::users::delete),
        )
        .route("/users/:id/role", put(endpoints::users::change_role))
        .route("/users/:id/otp", post(endpoints::users::issue_otp))
        .route("/doctors", get(endpoints::profiles::list_doctors))
        .route("/doctors/me", patch(endpoints::profiles::update_doctor))
        .route("/patients/me", patch(endpoints::profiles::update_patient))
        .route("/appointments", get(endpoints::appointments::list))
        .route("/appointments/book", post(endpoints::appointments::book))
        .route("/appointments/:id", get(endpoints::appointments::detail))
        .route(
            "/appointments/:id/status",
            patch(endpoints::appointments::update_status),
        )
        .route(
            "/availability",
            get(endpoints::availability::list).post(endpoints::availability::declare),
        )
        .route(
            "/availability/:id",
            axum::routing::delete(endpoints::availability::delete),
        )
        .route("/patient/history", get(endpoints::treatments::patient_history))
        .route(
            "/doctor/history",
            get(endpoints::treatments::doctor_history).post(endpoints::treatments::record),
        )
        .route(
            "/doctor/history/:id",
            get(endpoints::treatments::detail)
                .put(endpoints::treatments::update)
                .delete(endpoints::treatments::delete),
        )
        .route("/receptionist/history", get(endpoints::treatments::all_history))
        .route("/search", get(endpoints::treatments::search))
        .route(
            "/treatments",
            get(endpoints::treatments::list_treatments).post(endpoints::treatments::create_treatment),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_caller))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/users", post(endpoints::users::register))
        .route("/users/verify-email", post(endpoints::users::verify_email))
        .with_state(ctx);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::HeaderName::from_static("x-user-id")]);

    Router::new()
        .nest("/api", protected)
        .nest("/api", public)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(cors)
}
