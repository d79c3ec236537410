use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{Gender, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub phone_number: String,
    pub address: String,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,
    pub role: Role,
    pub email_verified: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {} {}", self.first_name, self.middle_name, self.last_name)
    }

    /// Completed years of age on `today`, `None` without a birth date.
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        let dob = self.date_of_birth?;
        let before_birthday = (today.month(), today.day()) < (dob.month(), dob.day());
        Some(today.year() - dob.year() - i32::from(before_birthday))
    }

    pub fn age(&self) -> Option<i32> {
        self.age_on(Utc::now().date_naive())
    }
}

/// Read-only user projection nested inside profile and appointment views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            middle_name: user.middle_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
        }
    }
}

/// Input for user registration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub phone_number: String,
    pub address: String,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Partial update of demographic fields. The role is changed separately.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_number: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 1,
            username: "ada".into(),
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            middle_name: "K".into(),
            last_name: "Lovelace".into(),
            gender: Some(Gender::Female),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 6, 15),
            phone_number: String::new(),
            address: String::new(),
            emergency_contact_name: String::new(),
            emergency_contact_number: String::new(),
            role: Role::Patient,
            email_verified: false,
            is_staff: false,
            is_superuser: false,
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn full_name_joins_all_parts() {
        assert_eq!(sample_user().full_name(), "Ada K Lovelace");
    }

    #[test]
    fn age_counts_completed_years() {
        let user = sample_user();
        assert_eq!(user.age_on(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()), Some(33));
        assert_eq!(user.age_on(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()), Some(34));
    }

    #[test]
    fn age_is_none_without_birth_date() {
        let mut user = sample_user();
        user.date_of_birth = None;
        assert_eq!(user.age(), None);
    }
}
