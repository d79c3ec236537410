use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_timestamp, parse_date, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::*;

const USER_COLUMNS: &str = "id, username, email, first_name, middle_name, last_name, gender,
     date_of_birth, phone_number, address, emergency_contact_name, emergency_contact_number,
     role, email_verified, is_staff, is_superuser, is_active, date_joined";

pub fn insert_user(
    conn: &Connection,
    user: &NewUser,
    password_hash: Option<&str>,
    date_joined: &DateTime<Utc>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO users (username, email, password_hash, first_name, middle_name, last_name,
         gender, date_of_birth, phone_number, address, emergency_contact_name,
         emergency_contact_number, role, is_staff, is_superuser, date_joined)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            user.username,
            user.email,
            password_hash,
            user.first_name,
            user.middle_name,
            user.last_name,
            user.gender.map(|g| g.as_str()),
            user.date_of_birth.map(|d| d.to_string()),
            user.phone_number,
            user.address,
            user.emergency_contact_name,
            user.emergency_contact_number,
            user.role.as_str(),
            user.is_staff as i32,
            user.is_superuser as i32,
            format_timestamp(date_joined),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            read_user_row,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            read_user_row,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

pub fn list_users(conn: &Connection, filter: &UserFilter) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE (?1 IS NULL OR role = ?1) AND (?2 = 0 OR is_active = 1)
         ORDER BY id"
    ))?;

    let rows = stmt.query_map(
        params![filter.role.map(|r| r.as_str()), filter.active_only as i32],
        read_user_row,
    )?;

    let mut users = Vec::new();
    for row in rows {
        users.push(user_from_row(row?)?);
    }
    Ok(users)
}

/// Current role of a user, without loading the whole record.
pub fn get_user_role(conn: &Connection, id: i64) -> Result<Option<Role>, DatabaseError> {
    let raw: Option<String> = conn
        .query_row("SELECT role FROM users WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?;
    raw.map(|r| Role::from_str(&r)).transpose()
}

/// Writes every editable demographic column of `user`.
pub fn update_user_details(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET first_name = ?2, middle_name = ?3, last_name = ?4, gender = ?5,
         date_of_birth = ?6, phone_number = ?7, address = ?8, emergency_contact_name = ?9,
         emergency_contact_number = ?10, is_active = ?11
         WHERE id = ?1",
        params![
            user.id,
            user.first_name,
            user.middle_name,
            user.last_name,
            user.gender.map(|g| g.as_str()),
            user.date_of_birth.map(|d| d.to_string()),
            user.phone_number,
            user.address,
            user.emergency_contact_name,
            user.emergency_contact_number,
            user.is_active as i32,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("User", user.id));
    }
    Ok(())
}

pub fn set_user_role(conn: &Connection, id: i64, role: Role) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET role = ?2 WHERE id = ?1",
        params![id, role.as_str()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("User", id));
    }
    Ok(())
}

pub fn delete_user(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("User", id));
    }
    Ok(())
}

// ═══════════════════════════════════════════
// Credentials and verification
// ═══════════════════════════════════════════

/// Returns `(user_id, password_hash)` for an e-mail, if the user exists.
pub fn get_credentials(
    conn: &Connection,
    email: &str,
) -> Result<Option<(i64, Option<String>)>, DatabaseError> {
    conn.query_row(
        "SELECT id, password_hash FROM users WHERE email = ?1 AND is_active = 1",
        params![email],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn set_otp(conn: &Connection, id: i64, otp: Option<&str>) -> Result<(), DatabaseError> {
    let changed = conn.execute("UPDATE users SET otp = ?2 WHERE id = ?1", params![id, otp])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("User", id));
    }
    Ok(())
}

/// Returns `(user_id, otp)` for an e-mail.
pub fn get_otp(
    conn: &Connection,
    email: &str,
) -> Result<Option<(i64, Option<String>)>, DatabaseError> {
    conn.query_row(
        "SELECT id, otp FROM users WHERE email = ?1",
        params![email],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Marks the e-mail as verified and consumes the OTP.
pub fn mark_email_verified(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE users SET email_verified = 1, otp = NULL WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

pub fn set_verification_token(
    conn: &Connection,
    id: i64,
    token: &str,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET verification_token = ?2 WHERE id = ?1",
        params![id, token],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("User", id));
    }
    Ok(())
}

// Internal row type for User mapping
struct UserRow {
    id: i64,
    username: String,
    email: String,
    first_name: String,
    middle_name: String,
    last_name: String,
    gender: Option<String>,
    date_of_birth: Option<String>,
    phone_number: String,
    address: String,
    emergency_contact_name: String,
    emergency_contact_number: String,
    role: String,
    email_verified: i32,
    is_staff: i32,
    is_superuser: i32,
    is_active: i32,
    date_joined: String,
}

fn read_user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        middle_name: row.get(4)?,
        last_name: row.get(5)?,
        gender: row.get(6)?,
        date_of_birth: row.get(7)?,
        phone_number: row.get(8)?,
        address: row.get(9)?,
        emergency_contact_name: row.get(10)?,
        emergency_contact_number: row.get(11)?,
        role: row.get(12)?,
        email_verified: row.get(13)?,
        is_staff: row.get(14)?,
        is_superuser: row.get(15)?,
        is_active: row.get(16)?,
        date_joined: row.get(17)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: row.id,
        username: row.username,
        email: row.email,
        first_name: row.first_name,
        middle_name: row.middle_name,
        last_name: row.last_name,
        gender: row.gender.as_deref().map(Gender::from_str).transpose()?,
        date_of_birth: row.date_of_birth.as_deref().map(parse_date).transpose()?,
        phone_number: row.phone_number,
        address: row.address,
        emergency_contact_name: row.emergency_contact_name,
        emergency_contact_number: row.emergency_contact_number,
        role: Role::from_str(&row.role)?,
        email_verified: row.email_verified != 0,
        is_staff: row.is_staff != 0,
        is_superuser: row.is_superuser != 0,
        is_active: row.is_active != 0,
        date_joined: parse_timestamp(&row.date_joined)?,
    })
}
