//! Audit logging middleware.
//!
//! Logs every authenticated request with caller, method, path and
//! response status. Runs innermost, after auth has injected CallerContext.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::CallerContext;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let caller = req
        .extensions()
        .get::<CallerContext>()
        .map(|c| (c.user_id, c.role));

    let response = next.run(req).await;
    let status = response.status().as_u16();

    match caller {
        Some((user_id, role)) => {
            tracing::info!(target: "audit", user_id, role = %role, %method, %path, status, "API access")
        }
        None => tracing::info!(target: "audit", %method, %path, status, "API access"),
    }

    response
}
