//! API endpoint handlers, one module per resource.
//!
//! Handlers open a connection per request and delegate to the domain
//! modules.

pub mod appointments;
pub mod availability;
pub mod health;
pub mod profiles;
pub mod treatments;
pub mod users;
