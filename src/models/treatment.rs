use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTreatment {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A treatment event. `doctor` and `patient` are user ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentHistory {
    pub id: i64,
    pub doctor: i64,
    pub patient: i64,
    pub treatment: Option<i64>,
    pub treatment_date: NaiveDate,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// History entry with names resolved for listing screens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentHistoryView {
    pub id: i64,
    pub doctor: i64,
    pub doctor_name: String,
    pub patient: i64,
    pub patient_name: String,
    pub treatment: Option<Treatment>,
    pub treatment_date: NaiveDate,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTreatmentHistory {
    pub patient: i64,
    #[serde(default)]
    pub treatment: Option<i64>,
    pub treatment_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TreatmentHistoryUpdate {
    pub treatment: Option<i64>,
    pub treatment_date: Option<NaiveDate>,
    pub notes: Option<String>,
}
