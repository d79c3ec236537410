use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_availability(
    conn: &Connection,
    doctor: Option<i64>,
    day_of_week: DayOfWeek,
    max_patients: u32,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO availability (doctor_id, day_of_week, max_patients) VALUES (?1, ?2, ?3)",
        params![doctor, day_of_week.as_str(), max_patients],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_availability(conn: &Connection, id: i64) -> Result<Option<Availability>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, doctor_id, day_of_week, max_patients FROM availability WHERE id = ?1",
            params![id],
            read_availability_row,
        )
        .optional()?;
    row.map(availability_from_row).transpose()
}

/// Entries ordered Monday → Sunday, ties by id. `None` lists every doctor.
pub fn list_availability(
    conn: &Connection,
    doctor: Option<i64>,
) -> Result<Vec<Availability>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, doctor_id, day_of_week, max_patients FROM availability
         WHERE (?1 IS NULL OR doctor_id = ?1)
         ORDER BY id",
    )?;

    let rows = stmt.query_map(params![doctor], read_availability_row)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(availability_from_row(row?)?);
    }
    // Stable sort keeps id order within a day
    entries.sort_by_key(|e| e.day_of_week.ordinal());
    Ok(entries)
}

pub fn delete_availability(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM availability WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Availability", id));
    }
    Ok(())
}

struct AvailabilityRow {
    id: i64,
    doctor_id: Option<i64>,
    day_of_week: String,
    max_patients: u32,
}

fn read_availability_row(row: &Row<'_>) -> rusqlite::Result<AvailabilityRow> {
    Ok(AvailabilityRow {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        day_of_week: row.get(2)?,
        max_patients: row.get(3)?,
    })
}

fn availability_from_row(row: AvailabilityRow) -> Result<Availability, DatabaseError> {
    Ok(Availability {
        id: row.id,
        doctor: row.doctor_id,
        day_of_week: DayOfWeek::from_str(&row.day_of_week)?,
        max_patients: row.max_patients,
    })
}
