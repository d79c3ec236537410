//! Caller identification middleware.
//!
//! Reads the user id asserted by the gateway in `X-User-Id`, loads the
//! user, and injects `CallerContext` into request extensions for
//! downstream handlers. Missing, malformed, unknown or inactive callers
//! get 401.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext, CALLER_HEADER};
use crate::db::repository;

pub async fn require_caller(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_caller_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_caller_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let user_id = req
        .headers()
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or(ApiError::Unauthorized)?;

    // Connection dropped before the handler runs
    let user = {
        let conn = ctx.core.open_db()?;
        repository::get_user(&conn, user_id)?
    };

    let user = match user {
        Some(user) if user.is_active => user,
        _ => {
            tracing::warn!(user_id, "Rejected caller");
            return Err(ApiError::Unauthorized);
        }
    };

    req.extensions_mut().insert(CallerContext {
        user_id: user.id,
        username: user.username,
        role: user.role,
    });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));

    Ok(response)
}
