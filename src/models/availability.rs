use serde::{Deserialize, Serialize};

use super::enums::DayOfWeek;

pub const DEFAULT_MAX_PATIENTS: u32 = 10;

/// Recurring weekly availability of a doctor. Not a concrete bookable slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub id: i64,
    pub doctor: Option<i64>,
    pub day_of_week: DayOfWeek,
    pub max_patients: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAvailability {
    #[serde(default)]
    pub doctor: Option<i64>,
    pub day_of_week: DayOfWeek,
    #[serde(default)]
    pub max_patients: Option<u32>,
}
