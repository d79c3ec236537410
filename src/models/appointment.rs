use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;
use super::profile::{DoctorView, PatientView};

/// Appointment with nested patient and doctor projections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentView {
    pub id: i64,
    pub patient: PatientView,
    pub doctor: DoctorView,
    pub appointment_date: DateTime<Utc>,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub patient: i64,
    pub doctor: i64,
    pub appointment_date: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
}
