//! Shared types for the HTTP layer.

use std::sync::Arc;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::models::Role;

/// Header carrying the authenticated user id, set by the upstream gateway.
pub const CALLER_HEADER: &str = "X-User-Id";

// ═══════════════════════════════════════════════════════════
// API context, shared by routes and middleware
// ═══════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

// ═══════════════════════════════════════════════════════════
// Caller context, injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// The active user behind a request. Role is read fresh on every request.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl CallerContext {
    /// Reject callers whose role is not in `allowed`.
    pub fn require_any(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            tracing::warn!(user_id = self.user_id, role = %self.role, "Role not permitted");
            Err(ApiError::Forbidden(format!(
                "Role {} may not access this resource",
                self.role
            )))
        }
    }

    pub fn require(&self, role: Role) -> Result<(), ApiError> {
        self.require_any(&[role])
    }

    /// Staff who see every record: admins and receptionists.
    pub fn is_front_office(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Receptionist)
    }

    /// Allow the user themself, or an admin.
    pub fn require_self_or_admin(&self, user_id: i64) -> Result<(), ApiError> {
        if self.user_id == user_id || self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Only the user or an admin may do this".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> CallerContext {
        CallerContext {
            user_id: 5,
            username: "someone".into(),
            role,
        }
    }

    #[test]
    fn require_any_accepts_listed_roles() {
        assert!(caller(Role::Doctor).require_any(&[Role::Doctor, Role::Admin]).is_ok());
        assert!(matches!(
            caller(Role::Patient).require(Role::Doctor),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn self_or_admin() {
        assert!(caller(Role::Patient).require_self_or_admin(5).is_ok());
        assert!(caller(Role::Patient).require_self_or_admin(6).is_err());
        assert!(caller(Role::Admin).require_self_or_admin(6).is_ok());
    }

    #[test]
    fn front_office_roles() {
        assert!(caller(Role::Receptionist).is_front_office());
        assert!(caller(Role::Admin).is_front_office());
        assert!(!caller(Role::Doctor).is_front_office());
    }
}
