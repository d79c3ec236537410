//! Repository layer: entity-scoped database operations.
//!
//! Plain functions over a borrowed `Connection`. Callers own transaction
//! boundaries; nothing here opens one except where noted.

mod appointment;
mod availability;
mod profile;
mod treatment;
mod user;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use super::DatabaseError;

pub use appointment::*;
pub use availability::*;
pub use profile::*;
pub use treatment::*;
pub use user::*;

/// Timestamps are stored as RFC 3339 UTC with a fixed nine-digit fraction,
/// so nothing is lost and lexical order equals chronological order.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {raw:?}: {e}")))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad date {raw:?}: {e}")))
}
