use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

/// Creates the profile of `kind` for `user_id` unless one exists.
///
/// Returns `true` when a row was inserted. Relies on `UNIQUE(user_id)`,
/// so two concurrent calls can never produce two profiles.
pub fn insert_profile_if_missing(
    conn: &Connection,
    kind: ProfileKind,
    user_id: i64,
) -> Result<bool, DatabaseError> {
    let inserted = conn.execute(
        &format!("INSERT OR IGNORE INTO {} (user_id) VALUES (?1)", kind.table()),
        params![user_id],
    )?;
    Ok(inserted == 1)
}

pub fn profile_exists(
    conn: &Connection,
    kind: ProfileKind,
    user_id: i64,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE user_id = ?1", kind.table()),
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

// ═══════════════════════════════════════════
// Doctor profiles
// ═══════════════════════════════════════════

const DOCTOR_COLUMNS: &str =
    "id, user_id, specialization, bio, profile_picture, experience, qualification";

fn read_doctor(row: &Row<'_>) -> rusqlite::Result<DoctorProfile> {
    Ok(DoctorProfile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        specialization: row.get(2)?,
        bio: row.get(3)?,
        profile_picture: row.get(4)?,
        experience: row.get(5)?,
        qualification: row.get(6)?,
    })
}

pub fn get_doctor_profile(conn: &Connection, id: i64) -> Result<Option<DoctorProfile>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {DOCTOR_COLUMNS} FROM doctor_profiles WHERE id = ?1"),
        params![id],
        read_doctor,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn get_doctor_profile_by_user(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<DoctorProfile>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {DOCTOR_COLUMNS} FROM doctor_profiles WHERE user_id = ?1"),
        params![user_id],
        read_doctor,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn update_doctor_profile(conn: &Connection, profile: &DoctorProfile) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctor_profiles SET specialization = ?2, bio = ?3, profile_picture = ?4,
         experience = ?5, qualification = ?6 WHERE id = ?1",
        params![
            profile.id,
            profile.specialization,
            profile.bio,
            profile.profile_picture,
            profile.experience,
            profile.qualification,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("DoctorProfile", profile.id));
    }
    Ok(())
}

// ═══════════════════════════════════════════
// Patient and receptionist profiles
// ═══════════════════════════════════════════

fn read_patient(row: &Row<'_>) -> rusqlite::Result<PatientProfile> {
    Ok(PatientProfile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        medical_history: row.get(2)?,
        allergies: row.get(3)?,
    })
}

pub fn get_patient_profile(conn: &Connection, id: i64) -> Result<Option<PatientProfile>, DatabaseError> {
    conn.query_row(
        "SELECT id, user_id, medical_history, allergies FROM patient_profiles WHERE id = ?1",
        params![id],
        read_patient,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn get_patient_profile_by_user(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<PatientProfile>, DatabaseError> {
    conn.query_row(
        "SELECT id, user_id, medical_history, allergies FROM patient_profiles WHERE user_id = ?1",
        params![user_id],
        read_patient,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn update_patient_profile(conn: &Connection, profile: &PatientProfile) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patient_profiles SET medical_history = ?2, allergies = ?3 WHERE id = ?1",
        params![profile.id, profile.medical_history, profile.allergies],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("PatientProfile", profile.id));
    }
    Ok(())
}

pub fn get_receptionist_profile_by_user(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<ReceptionistProfile>, DatabaseError> {
    conn.query_row(
        "SELECT id, user_id FROM receptionist_profiles WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok(ReceptionistProfile {
                id: row.get(0)?,
                user_id: row.get(1)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

// ═══════════════════════════════════════════
// Nested views
// ═══════════════════════════════════════════

/// Column list for a `UserSummary` read from alias `u`.
pub(crate) const USER_SUMMARY_COLUMNS: &str =
    "u.id, u.username, u.email, u.first_name, u.middle_name, u.last_name, u.role";

/// Reads a `UserSummary` starting at column `offset`.
pub(crate) fn read_user_summary(row: &Row<'_>, offset: usize) -> rusqlite::Result<UserSummaryRow> {
    Ok(UserSummaryRow {
        id: row.get(offset)?,
        username: row.get(offset + 1)?,
        email: row.get(offset + 2)?,
        first_name: row.get(offset + 3)?,
        middle_name: row.get(offset + 4)?,
        last_name: row.get(offset + 5)?,
        role: row.get(offset + 6)?,
    })
}

pub(crate) struct UserSummaryRow {
    id: i64,
    username: String,
    email: String,
    first_name: String,
    middle_name: String,
    last_name: String,
    role: String,
}

impl UserSummaryRow {
    pub(crate) fn into_summary(self) -> Result<UserSummary, DatabaseError> {
        Ok(UserSummary {
            id: self.id,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            middle_name: self.middle_name,
            last_name: self.last_name,
            role: Role::from_str(&self.role)?,
        })
    }
}

/// Doctor profiles of active users who still hold the doctor role, ordered
/// by last name. Demoted users keep their profile but leave the directory.
pub fn list_doctors(conn: &Connection) -> Result<Vec<DoctorView>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT d.id, d.specialization, {USER_SUMMARY_COLUMNS}
         FROM doctor_profiles d
         JOIN users u ON u.id = d.user_id
         WHERE u.is_active = 1 AND u.role = 'doctor'
         ORDER BY u.last_name, u.first_name, d.id"
    ))?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            read_user_summary(row, 2)?,
        ))
    })?;

    let mut doctors = Vec::new();
    for row in rows {
        let (id, specialization, user) = row?;
        doctors.push(DoctorView {
            id,
            user: user.into_summary()?,
            specialization,
        });
    }
    Ok(doctors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::insert_user;
    use crate::db::sqlite::open_memory_database;
    use chrono::Utc;

    fn setup() -> (Connection, i64) {
        let conn = open_memory_database().unwrap();
        let id = insert_user(
            &conn,
            &NewUser {
                username: "house".into(),
                email: "house@example.com".into(),
                last_name: "House".into(),
                role: Role::Doctor,
                ..Default::default()
            },
            None,
            &Utc::now(),
        )
        .unwrap();
        (conn, id)
    }

    #[test]
    fn insert_if_missing_creates_once() {
        let (conn, user_id) = setup();
        assert!(insert_profile_if_missing(&conn, ProfileKind::Doctor, user_id).unwrap());
        assert!(!insert_profile_if_missing(&conn, ProfileKind::Doctor, user_id).unwrap());
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM doctor_profiles WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn profile_for_unknown_user_violates_foreign_key() {
        let (conn, _) = setup();
        assert!(insert_profile_if_missing(&conn, ProfileKind::Patient, 9999).is_err());
    }

    #[test]
    fn doctor_profile_update_round_trip() {
        let (conn, user_id) = setup();
        insert_profile_if_missing(&conn, ProfileKind::Doctor, user_id).unwrap();
        let mut profile = get_doctor_profile_by_user(&conn, user_id).unwrap().unwrap();
        assert_eq!(profile.experience, 0);

        profile.specialization = "Diagnostics".into();
        profile.experience = 12;
        update_doctor_profile(&conn, &profile).unwrap();

        let stored = get_doctor_profile(&conn, profile.id).unwrap().unwrap();
        assert_eq!(stored.specialization, "Diagnostics");
        assert_eq!(stored.experience, 12);
    }

    #[test]
    fn list_doctors_nests_user_summary() {
        let (conn, user_id) = setup();
        insert_profile_if_missing(&conn, ProfileKind::Doctor, user_id).unwrap();
        let doctors = list_doctors(&conn).unwrap();
        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0].user.username, "house");
        assert_eq!(doctors[0].user.role, Role::Doctor);
    }

    #[test]
    fn list_doctors_skips_users_no_longer_doctors() {
        let (conn, user_id) = setup();
        insert_profile_if_missing(&conn, ProfileKind::Doctor, user_id).unwrap();
        crate::db::repository::set_user_role(&conn, user_id, Role::Patient).unwrap();

        assert!(profile_exists(&conn, ProfileKind::Doctor, user_id).unwrap());
        assert!(list_doctors(&conn).unwrap().is_empty());
    }

    #[test]
    fn patient_profile_lookup_by_user() {
        let (conn, user_id) = setup();
        assert!(get_patient_profile_by_user(&conn, user_id).unwrap().is_none());
        insert_profile_if_missing(&conn, ProfileKind::Patient, user_id).unwrap();
        let profile = get_patient_profile_by_user(&conn, user_id).unwrap().unwrap();
        assert_eq!(profile.allergies, "");
        assert!(profile_exists(&conn, ProfileKind::Patient, user_id).unwrap());
        assert!(!profile_exists(&conn, ProfileKind::Receptionist, user_id).unwrap());
    }
}
