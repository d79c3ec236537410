use super::enums::{AppointmentStatus, Role};

#[derive(Debug, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub active_only: bool,
}

#[derive(Debug, Default)]
pub struct AppointmentFilter {
    pub patient: Option<i64>,
    pub doctor: Option<i64>,
    pub status: Option<AppointmentStatus>,
}

/// Treatment history scoping. Fields combine with AND.
#[derive(Debug, Default)]
pub struct HistoryFilter {
    pub patient: Option<i64>,
    pub doctor: Option<i64>,
    pub query: Option<String>,
}
