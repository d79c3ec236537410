use serde::{Deserialize, Serialize};

use super::user::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: i64,
    pub user_id: i64,
    pub specialization: String,
    pub bio: String,
    pub profile_picture: Option<String>,
    pub experience: u32,
    pub qualification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: i64,
    pub user_id: i64,
    pub medical_history: String,
    pub allergies: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceptionistProfile {
    pub id: i64,
    pub user_id: i64,
}

/// Doctor profile with its user, as nested in appointment listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorView {
    pub id: i64,
    pub user: UserSummary,
    pub specialization: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientView {
    pub id: i64,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DoctorProfileUpdate {
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub experience: Option<u32>,
    pub qualification: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatientProfileUpdate {
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
}
