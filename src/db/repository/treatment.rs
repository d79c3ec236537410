use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_timestamp, parse_date, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::*;

// ═══════════════════════════════════════════
// Treatment catalog
// ═══════════════════════════════════════════

pub fn insert_treatment(conn: &Connection, name: &str, description: &str) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO treatments (name, description) VALUES (?1, ?2)",
        params![name, description],
    )?;
    Ok(conn.last_insert_rowid())
}

fn read_treatment(row: &Row<'_>) -> rusqlite::Result<Treatment> {
    Ok(Treatment {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

pub fn get_treatment(conn: &Connection, id: i64) -> Result<Option<Treatment>, DatabaseError> {
    conn.query_row(
        "SELECT id, name, description FROM treatments WHERE id = ?1",
        params![id],
        read_treatment,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_treatments(conn: &Connection) -> Result<Vec<Treatment>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, description FROM treatments ORDER BY name, id")?;
    let rows = stmt.query_map([], read_treatment)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn delete_treatment(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM treatments WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Treatment", id));
    }
    Ok(())
}

// ═══════════════════════════════════════════
// Treatment histories
// ═══════════════════════════════════════════

pub fn insert_history(
    conn: &Connection,
    doctor: i64,
    patient: i64,
    treatment: Option<i64>,
    treatment_date: NaiveDate,
    notes: &str,
    created_at: &DateTime<Utc>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO treatment_histories
         (doctor_id, patient_id, treatment_id, treatment_date, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            doctor,
            patient,
            treatment,
            treatment_date.to_string(),
            notes,
            format_timestamp(created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_history(conn: &Connection, id: i64) -> Result<Option<TreatmentHistory>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, doctor_id, patient_id, treatment_id, treatment_date, notes, created_at
             FROM treatment_histories WHERE id = ?1",
            params![id],
            |row| {
                Ok(HistoryRow {
                    id: row.get(0)?,
                    doctor_id: row.get(1)?,
                    patient_id: row.get(2)?,
                    treatment_id: row.get(3)?,
                    treatment_date: row.get(4)?,
                    notes: row.get(5)?,
                    created_at: row.get(6)?,
                })
            },
        )
        .optional()?;
    row.map(history_from_row).transpose()
}

pub fn update_history(conn: &Connection, history: &TreatmentHistory) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE treatment_histories SET treatment_id = ?2, treatment_date = ?3, notes = ?4
         WHERE id = ?1",
        params![
            history.id,
            history.treatment,
            history.treatment_date.to_string(),
            history.notes,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("TreatmentHistory", history.id));
    }
    Ok(())
}

pub fn delete_history(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM treatment_histories WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("TreatmentHistory", id));
    }
    Ok(())
}

/// History entries matching `filter`, newest treatment date first.
///
/// `query` is a case-insensitive substring match on the patient's
/// username, names and e-mail, and on the treatment name.
pub fn list_history_views(
    conn: &Connection,
    filter: &HistoryFilter,
) -> Result<Vec<TreatmentHistoryView>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT h.id, h.doctor_id, du.first_name, du.last_name, du.username,
                h.patient_id, pu.first_name, pu.last_name, pu.username,
                t.id, t.name, t.description,
                h.treatment_date, h.notes, h.created_at
         FROM treatment_histories h
         JOIN users du ON du.id = h.doctor_id
         JOIN users pu ON pu.id = h.patient_id
         LEFT JOIN treatments t ON t.id = h.treatment_id
         WHERE (?1 IS NULL OR h.patient_id = ?1)
           AND (?2 IS NULL OR h.doctor_id = ?2)
           AND (?3 IS NULL
                OR instr(lower(pu.username), lower(?3)) > 0
                OR instr(lower(pu.first_name), lower(?3)) > 0
                OR instr(lower(pu.middle_name), lower(?3)) > 0
                OR instr(lower(pu.last_name), lower(?3)) > 0
                OR instr(lower(pu.email), lower(?3)) > 0
                OR instr(lower(COALESCE(t.name, '')), lower(?3)) > 0)
         ORDER BY h.treatment_date DESC, h.id DESC",
    )?;

    let query = filter
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    let rows = stmt.query_map(params![filter.patient, filter.doctor, query], |row| {
        Ok(HistoryViewRow {
            id: row.get(0)?,
            doctor_id: row.get(1)?,
            doctor_name: display_name(row.get(2)?, row.get(3)?, row.get(4)?),
            patient_id: row.get(5)?,
            patient_name: display_name(row.get(6)?, row.get(7)?, row.get(8)?),
            treatment_id: row.get(9)?,
            treatment_name: row.get(10)?,
            treatment_description: row.get(11)?,
            treatment_date: row.get(12)?,
            notes: row.get(13)?,
            created_at: row.get(14)?,
        })
    })?;

    let mut views = Vec::new();
    for row in rows {
        let row = row?;
        let treatment = match (row.treatment_id, row.treatment_name) {
            (Some(id), Some(name)) => Some(Treatment {
                id,
                name,
                description: row.treatment_description.unwrap_or_default(),
            }),
            _ => None,
        };
        views.push(TreatmentHistoryView {
            id: row.id,
            doctor: row.doctor_id,
            doctor_name: row.doctor_name,
            patient: row.patient_id,
            patient_name: row.patient_name,
            treatment,
            treatment_date: parse_date(&row.treatment_date)?,
            notes: row.notes,
            created_at: parse_timestamp(&row.created_at)?,
        });
    }
    Ok(views)
}

fn display_name(first: String, last: String, username: String) -> String {
    let joined = format!("{first} {last}");
    let joined = joined.trim();
    if joined.is_empty() {
        username
    } else {
        joined.to_string()
    }
}

struct HistoryRow {
    id: i64,
    doctor_id: i64,
    patient_id: i64,
    treatment_id: Option<i64>,
    treatment_date: String,
    notes: String,
    created_at: String,
}

fn history_from_row(row: HistoryRow) -> Result<TreatmentHistory, DatabaseError> {
    Ok(TreatmentHistory {
        id: row.id,
        doctor: row.doctor_id,
        patient: row.patient_id,
        treatment: row.treatment_id,
        treatment_date: parse_date(&row.treatment_date)?,
        notes: row.notes,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

struct HistoryViewRow {
    id: i64,
    doctor_id: i64,
    doctor_name: String,
    patient_id: i64,
    patient_name: String,
    treatment_id: Option<i64>,
    treatment_name: Option<String>,
    treatment_description: Option<String>,
    treatment_date: String,
    notes: String,
    created_at: String,
}
