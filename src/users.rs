//! User store and role-based profile provisioning.
//!
//! Profiles are provisioned only by `change_user_role`, which runs the
//! read-compare-write and the profile insert inside one `BEGIN IMMEDIATE`
//! transaction. Creating a user never provisions a profile.

use chrono::Utc;
use rand::Rng;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::db::repository;
use crate::error::ClinicError;
use crate::models::*;
use crate::password;
use crate::validation::{self, ValidationError};

/// Outcome of a `change_user_role` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleChange {
    pub user_id: i64,
    pub previous: Role,
    pub current: Role,
    pub profile_created: bool,
}

/// Register a user. Email is normalized and required; the password, if any, is hashed.
pub fn create_user(conn: &Connection, mut input: NewUser) -> Result<User, ClinicError> {
    input.email = validation::normalize_email(&input.email);
    validation::validate_new_user(&input)?;

    let password_hash = input.password.as_deref().map(password::hash_password);
    let id = repository::insert_user(conn, &input, password_hash.as_deref(), &Utc::now())?;

    tracing::info!(user_id = id, role = %input.role, "User created");
    get_user(conn, id)
}

/// Register a staff superuser with the admin role.
pub fn create_superuser(conn: &Connection, mut input: NewUser) -> Result<User, ClinicError> {
    input.is_staff = true;
    input.is_superuser = true;
    input.role = Role::Admin;
    create_user(conn, input)
}

pub fn get_user(conn: &Connection, id: i64) -> Result<User, ClinicError> {
    repository::get_user(conn, id)?.ok_or_else(|| ClinicError::not_found("User", id))
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, ClinicError> {
    Ok(repository::get_user_by_email(conn, &validation::normalize_email(email))?)
}

pub fn list_users(conn: &Connection, filter: &UserFilter) -> Result<Vec<User>, ClinicError> {
    Ok(repository::list_users(conn, filter)?)
}

/// Apply a partial demographic update. The role is never touched here.
pub fn update_user(conn: &Connection, id: i64, update: UserUpdate) -> Result<User, ClinicError> {
    validation::validate_user_update(&update)?;
    let mut user = get_user(conn, id)?;

    if let Some(v) = update.first_name {
        user.first_name = v;
    }
    if let Some(v) = update.middle_name {
        user.middle_name = v;
    }
    if let Some(v) = update.last_name {
        user.last_name = v;
    }
    if let Some(v) = update.gender {
        user.gender = Some(v);
    }
    if let Some(v) = update.date_of_birth {
        user.date_of_birth = Some(v);
    }
    if let Some(v) = update.phone_number {
        user.phone_number = v;
    }
    if let Some(v) = update.address {
        user.address = v;
    }
    if let Some(v) = update.emergency_contact_name {
        user.emergency_contact_name = v;
    }
    if let Some(v) = update.emergency_contact_number {
        user.emergency_contact_number = v;
    }
    if let Some(v) = update.is_active {
        user.is_active = v;
    }

    repository::update_user_details(conn, &user)?;
    Ok(user)
}

/// Change a user's role and provision the matching profile if it is missing.
///
/// A transition to the same role, or to `admin`, creates nothing. The
/// previous role's profile is kept.
pub fn change_user_role(
    conn: &Connection,
    user_id: i64,
    new_role: Role,
) -> Result<RoleChange, ClinicError> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let previous = repository::get_user_role(&tx, user_id)?
        .ok_or_else(|| ClinicError::not_found("User", user_id))?;

    let mut profile_created = false;
    if previous != new_role {
        repository::set_user_role(&tx, user_id, new_role)?;
        if let Some(kind) = new_role.profile_kind() {
            profile_created = repository::insert_profile_if_missing(&tx, kind, user_id)?;
        }
    }

    tx.commit()?;

    tracing::info!(
        user_id,
        previous = %previous,
        current = %new_role,
        profile_created,
        "User role changed"
    );

    Ok(RoleChange {
        user_id,
        previous,
        current: new_role,
        profile_created,
    })
}

/// Delete a user. Profiles, their appointments and availability, and
/// treatment histories naming the user go with it.
pub fn delete_user(conn: &Connection, id: i64) -> Result<(), ClinicError> {
    repository::delete_user(conn, id)?;
    tracing::info!(user_id = id, "User deleted");
    Ok(())
}

/// Check an e-mail/password pair. Users without a password never match.
pub fn verify_password(
    conn: &Connection,
    email: &str,
    candidate: &str,
) -> Result<Option<User>, ClinicError> {
    let email = validation::normalize_email(email);
    let Some((id, Some(stored))) = repository::get_credentials(conn, &email)? else {
        return Ok(None);
    };
    if !password::verify_password(candidate, &stored) {
        return Ok(None);
    }
    Ok(Some(get_user(conn, id)?))
}

// ═══════════════════════════════════════════
// E-mail verification
// ═══════════════════════════════════════════

/// Generate and store a fresh 6-digit OTP. Delivery is the caller's concern.
pub fn issue_otp(conn: &Connection, user_id: i64) -> Result<String, ClinicError> {
    let otp = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
    repository::set_otp(conn, user_id, Some(&otp))?;
    tracing::info!(user_id, "OTP issued");
    Ok(otp)
}

/// Mark the e-mail verified when `otp` matches the stored one. The OTP is single use.
pub fn verify_email(conn: &Connection, email: &str, otp: &str) -> Result<bool, ClinicError> {
    validation::validate_otp(otp)?;
    let email = validation::normalize_email(email);

    let Some((id, Some(stored))) = repository::get_otp(conn, &email)? else {
        return Ok(false);
    };
    if !bool::from(stored.as_bytes().ct_eq(otp.as_bytes())) {
        tracing::warn!(user_id = id, "OTP mismatch");
        return Ok(false);
    }

    repository::mark_email_verified(conn, id)?;
    tracing::info!(user_id = id, "E-mail verified");
    Ok(true)
}

pub fn issue_verification_token(conn: &Connection, user_id: i64) -> Result<String, ClinicError> {
    let token = Uuid::new_v4().simple().to_string();
    repository::set_verification_token(conn, user_id, &token)?;
    Ok(token)
}

// ═══════════════════════════════════════════
// Profile edits
// ═══════════════════════════════════════════

/// Active doctors with their user summary, ordered by name.
pub fn list_doctors(conn: &Connection) -> Result<Vec<DoctorView>, ClinicError> {
    Ok(repository::list_doctors(conn)?)
}

pub fn update_doctor_profile(
    conn: &Connection,
    user_id: i64,
    update: DoctorProfileUpdate,
) -> Result<DoctorProfile, ClinicError> {
    let mut profile = repository::get_doctor_profile_by_user(conn, user_id)?
        .ok_or_else(|| ClinicError::not_found("DoctorProfile", format!("user {user_id}")))?;

    if let Some(v) = update.specialization {
        validation::validate_max_len("specialization", &v, 100)?;
        profile.specialization = v;
    }
    if let Some(v) = update.qualification {
        validation::validate_max_len("qualification", &v, 255)?;
        profile.qualification = v;
    }
    if let Some(v) = update.bio {
        profile.bio = v;
    }
    if let Some(v) = update.profile_picture {
        profile.profile_picture = if v.is_empty() { None } else { Some(v) };
    }
    if let Some(v) = update.experience {
        profile.experience = v;
    }

    repository::update_doctor_profile(conn, &profile)?;
    Ok(profile)
}

pub fn update_patient_profile(
    conn: &Connection,
    user_id: i64,
    update: PatientProfileUpdate,
) -> Result<PatientProfile, ClinicError> {
    let mut profile = repository::get_patient_profile_by_user(conn, user_id)?
        .ok_or_else(|| ClinicError::not_found("PatientProfile", format!("user {user_id}")))?;

    if let Some(v) = update.medical_history {
        profile.medical_history = v;
    }
    if let Some(v) = update.allergies {
        profile.allergies = v;
    }

    repository::update_patient_profile(conn, &profile)?;
    Ok(profile)
}

/// Reject a request for a user that does not hold `role`.
pub(crate) fn require_role(conn: &Connection, user_id: i64, role: Role) -> Result<(), ClinicError> {
    match repository::get_user_role(conn, user_id)? {
        None => Err(ClinicError::not_found("User", user_id)),
        Some(actual) if actual == role => Ok(()),
        Some(actual) => Err(ValidationError::new(
            role.as_str(),
            format!("User {user_id} is a {actual}, expected {role}"),
        )
        .into()),
    }
}
