//! Clinic HTTP API.
//!
//! Exposes the user, scheduling and treatment modules as JSON endpoints.
//! Routes are nested under `/api/`. Protected routes pass through
//! caller lookup and audit logging.
//!
//! `clinic_api_router()` returns a `Router` that can be mounted on any
//! axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::clinic_api_router;
pub use server::{bind, serve_until, ServerError};
pub use types::{ApiContext, CallerContext};
