//! Field-level validation for user-supplied records.
//!
//! Every check runs before any write. Failures carry the offending field
//! name so the API can report it next to the message.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{NewUser, UserUpdate};

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{10,15}$").unwrap());

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

static OTP_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{6}$").unwrap());

pub const USERNAME_MAX_LEN: usize = 150;
pub const NAME_PART_MAX_LEN: usize = 30;
pub const CONTACT_NAME_MAX_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Empty is allowed; otherwise 10 to 15 consecutive digits.
pub fn validate_phone(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || PHONE_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            "Phone number must be between 10 and 15 digits.",
        ))
    }
}

pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("email", "The email field must be set"));
    }
    if !EMAIL_PATTERN.is_match(value) {
        return Err(ValidationError::new("email", "Enter a valid email address."));
    }
    Ok(())
}

/// Lower-cases the domain part, leaves the local part untouched.
pub fn normalize_email(value: &str) -> String {
    let value = value.trim();
    match value.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => value.to_string(),
    }
}

pub fn validate_username(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("username", "This field is required."));
    }
    validate_max_len("username", value, USERNAME_MAX_LEN)?;
    if !USERNAME_PATTERN.is_match(value) {
        return Err(ValidationError::new(
            "username",
            "Enter a valid username. Letters, digits and @/./+/-/_ only.",
        ));
    }
    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        Err(ValidationError::new(
            field,
            format!("Ensure this field has no more than {max} characters."),
        ))
    } else {
        Ok(())
    }
}

pub fn validate_otp(value: &str) -> Result<(), ValidationError> {
    if OTP_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("otp", "OTP must be 6 digits."))
    }
}

pub fn validate_new_user(user: &NewUser) -> Result<(), ValidationError> {
    validate_username(&user.username)?;
    validate_email(&user.email)?;
    validate_name_parts(
        Some(&user.first_name),
        Some(&user.middle_name),
        Some(&user.last_name),
    )?;
    validate_phone("phone_number", &user.phone_number)?;
    validate_phone("emergency_contact_number", &user.emergency_contact_number)?;
    validate_max_len(
        "emergency_contact_name",
        &user.emergency_contact_name,
        CONTACT_NAME_MAX_LEN,
    )?;
    Ok(())
}

pub fn validate_user_update(update: &UserUpdate) -> Result<(), ValidationError> {
    validate_name_parts(
        update.first_name.as_deref(),
        update.middle_name.as_deref(),
        update.last_name.as_deref(),
    )?;
    if let Some(phone) = &update.phone_number {
        validate_phone("phone_number", phone)?;
    }
    if let Some(phone) = &update.emergency_contact_number {
        validate_phone("emergency_contact_number", phone)?;
    }
    if let Some(name) = &update.emergency_contact_name {
        validate_max_len("emergency_contact_name", name, CONTACT_NAME_MAX_LEN)?;
    }
    Ok(())
}

fn validate_name_parts(
    first: Option<&str>,
    middle: Option<&str>,
    last: Option<&str>,
) -> Result<(), ValidationError> {
    for (field, value) in [("first_name", first), ("middle_name", middle), ("last_name", last)] {
        if let Some(value) = value {
            validate_max_len(field, value, NAME_PART_MAX_LEN)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_rejects_short_numbers() {
        let err = validate_phone("phone_number", "12345").unwrap_err();
        assert_eq!(err.field, "phone_number");
    }

    #[test]
    fn phone_accepts_ten_to_fifteen_digits() {
        assert!(validate_phone("phone_number", "1234567890").is_ok());
        assert!(validate_phone("phone_number", "123456789012345").is_ok());
        assert!(validate_phone("phone_number", "1234567890123456").is_err());
    }

    #[test]
    fn phone_rejects_formatting_characters() {
        assert!(validate_phone("phone_number", "+1234567890").is_err());
        assert!(validate_phone("phone_number", "123-456-7890").is_err());
    }

    #[test]
    fn empty_phone_is_allowed() {
        assert!(validate_phone("emergency_contact_number", "").is_ok());
    }

    #[test]
    fn missing_email_is_rejected() {
        let err = validate_email("  ").unwrap_err();
        assert_eq!(err.field, "email");
        assert_eq!(err.message, "The email field must be set");
    }

    #[test]
    fn email_domain_is_lowercased() {
        assert_eq!(normalize_email("Jane.Doe@Clinic.ORG"), "Jane.Doe@clinic.org");
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("dr.house+1").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn long_name_part_is_rejected() {
        let user = NewUser {
            username: "u".into(),
            email: "u@example.com".into(),
            last_name: "x".repeat(31),
            ..Default::default()
        };
        assert_eq!(validate_new_user(&user).unwrap_err().field, "last_name");
    }

    #[test]
    fn update_checks_only_present_fields() {
        let update = UserUpdate {
            phone_number: Some("12345".into()),
            ..Default::default()
        };
        assert_eq!(validate_user_update(&update).unwrap_err().field, "phone_number");
        assert!(validate_user_update(&UserUpdate::default()).is_ok());
    }

    #[test]
    fn otp_must_be_six_digits() {
        assert!(validate_otp("123456").is_ok());
        assert!(validate_otp("12345").is_err());
        assert!(validate_otp("abcdef").is_err());
    }
}
