use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::profile::{read_user_summary, UserSummaryRow};
use super::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_appointment(
    conn: &Connection,
    patient: i64,
    doctor: i64,
    appointment_date: &DateTime<Utc>,
    status: AppointmentStatus,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (patient_id, doctor_id, appointment_date, status)
         VALUES (?1, ?2, ?3, ?4)",
        params![patient, doctor, format_timestamp(appointment_date), status.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_appointment_status(
    conn: &Connection,
    id: i64,
    status: AppointmentStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?2 WHERE id = ?1",
        params![id, status.as_str()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    Ok(())
}

const VIEW_QUERY: &str = "SELECT a.id, a.appointment_date, a.status,
        p.id, pu.id, pu.username, pu.email, pu.first_name, pu.middle_name, pu.last_name, pu.role,
        d.id, d.specialization,
        du.id, du.username, du.email, du.first_name, du.middle_name, du.last_name, du.role
     FROM appointments a
     JOIN patient_profiles p ON p.id = a.patient_id
     JOIN users pu ON pu.id = p.user_id
     JOIN doctor_profiles d ON d.id = a.doctor_id
     JOIN users du ON du.id = d.user_id";

pub fn get_appointment_view(
    conn: &Connection,
    id: i64,
) -> Result<Option<AppointmentView>, DatabaseError> {
    let row = conn
        .query_row(&format!("{VIEW_QUERY} WHERE a.id = ?1"), params![id], read_view_row)
        .optional()?;
    row.map(view_from_row).transpose()
}

/// Appointments with nested patient and doctor, oldest first.
pub fn list_appointment_views(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{VIEW_QUERY}
         WHERE (?1 IS NULL OR a.patient_id = ?1)
           AND (?2 IS NULL OR a.doctor_id = ?2)
           AND (?3 IS NULL OR a.status = ?3)
         ORDER BY a.appointment_date, a.id"
    ))?;

    let rows = stmt.query_map(
        params![filter.patient, filter.doctor, filter.status.map(|s| s.as_str())],
        read_view_row,
    )?;

    let mut views = Vec::new();
    for row in rows {
        views.push(view_from_row(row?)?);
    }
    Ok(views)
}

struct ViewRow {
    id: i64,
    appointment_date: String,
    status: String,
    patient_id: i64,
    patient_user: UserSummaryRow,
    doctor_id: i64,
    specialization: String,
    doctor_user: UserSummaryRow,
}

fn read_view_row(row: &Row<'_>) -> rusqlite::Result<ViewRow> {
    Ok(ViewRow {
        id: row.get(0)?,
        appointment_date: row.get(1)?,
        status: row.get(2)?,
        patient_id: row.get(3)?,
        patient_user: read_user_summary(row, 4)?,
        doctor_id: row.get(11)?,
        specialization: row.get(12)?,
        doctor_user: read_user_summary(row, 13)?,
    })
}

fn view_from_row(row: ViewRow) -> Result<AppointmentView, DatabaseError> {
    Ok(AppointmentView {
        id: row.id,
        patient: PatientView {
            id: row.patient_id,
            user: row.patient_user.into_summary()?,
        },
        doctor: DoctorView {
            id: row.doctor_id,
            user: row.doctor_user.into_summary()?,
            specialization: row.specialization,
        },
        appointment_date: parse_timestamp(&row.appointment_date)?,
        status: AppointmentStatus::from_str(&row.status)?,
    })
}
