//! API middleware stack.
//!
//! Execution order (outermost first):
//! 1. Caller lookup, injects CallerContext
//! 2. Audit logger, sees the caller

pub mod audit;
pub mod auth;
