//! Treatment catalog and per-patient treatment histories.
//!
//! Histories reference users directly, not profiles. A doctor only sees and
//! edits the entries where they are the recorded doctor.

use chrono::Utc;
use rusqlite::Connection;

use crate::db::repository;
use crate::error::ClinicError;
use crate::models::*;
use crate::users::require_role;
use crate::validation::{self, ValidationError};

const TREATMENT_NAME_MAX_LEN: usize = 100;

pub fn create_treatment(conn: &Connection, input: NewTreatment) -> Result<Treatment, ClinicError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("name", "This field is required.").into());
    }
    validation::validate_max_len("name", name, TREATMENT_NAME_MAX_LEN)?;

    let id = repository::insert_treatment(conn, name, &input.description)?;
    tracing::info!(treatment_id = id, "Treatment added to catalog");

    Ok(Treatment {
        id,
        name: name.to_string(),
        description: input.description,
    })
}

pub fn list_treatments(conn: &Connection) -> Result<Vec<Treatment>, ClinicError> {
    Ok(repository::list_treatments(conn)?)
}

/// Record a treatment given by `doctor` (a user id) to `input.patient`.
pub fn record_history(
    conn: &Connection,
    doctor: i64,
    input: NewTreatmentHistory,
) -> Result<TreatmentHistory, ClinicError> {
    require_role(conn, doctor, Role::Doctor)?;
    require_role(conn, input.patient, Role::Patient)?;
    if let Some(treatment) = input.treatment {
        repository::get_treatment(conn, treatment)?
            .ok_or_else(|| ClinicError::not_found("Treatment", treatment))?;
    }

    let id = repository::insert_history(
        conn,
        doctor,
        input.patient,
        input.treatment,
        input.treatment_date,
        &input.notes,
        &Utc::now(),
    )?;
    tracing::info!(history_id = id, doctor, patient = input.patient, "Treatment recorded");

    owned_history(conn, doctor, id)
}

/// A history entry recorded by `doctor`. Entries of other doctors read as missing.
pub fn get_history(conn: &Connection, doctor: i64, id: i64) -> Result<TreatmentHistory, ClinicError> {
    owned_history(conn, doctor, id)
}

pub fn update_history(
    conn: &Connection,
    doctor: i64,
    id: i64,
    update: TreatmentHistoryUpdate,
) -> Result<TreatmentHistory, ClinicError> {
    let mut history = owned_history(conn, doctor, id)?;

    if let Some(treatment) = update.treatment {
        repository::get_treatment(conn, treatment)?
            .ok_or_else(|| ClinicError::not_found("Treatment", treatment))?;
        history.treatment = Some(treatment);
    }
    if let Some(date) = update.treatment_date {
        history.treatment_date = date;
    }
    if let Some(notes) = update.notes {
        history.notes = notes;
    }

    repository::update_history(conn, &history)?;
    Ok(history)
}

pub fn delete_history(conn: &Connection, doctor: i64, id: i64) -> Result<(), ClinicError> {
    owned_history(conn, doctor, id)?;
    repository::delete_history(conn, id)?;
    tracing::info!(history_id = id, doctor, "Treatment history deleted");
    Ok(())
}

fn owned_history(conn: &Connection, doctor: i64, id: i64) -> Result<TreatmentHistory, ClinicError> {
    match repository::get_history(conn, id)? {
        Some(history) if history.doctor == doctor => Ok(history),
        _ => Err(ClinicError::not_found("TreatmentHistory", id)),
    }
}

// ═══════════════════════════════════════════
// Read side
// ═══════════════════════════════════════════

pub fn histories_for_patient(
    conn: &Connection,
    patient: i64,
) -> Result<Vec<TreatmentHistoryView>, ClinicError> {
    list(conn, HistoryFilter {
        patient: Some(patient),
        ..Default::default()
    })
}

pub fn histories_for_doctor(
    conn: &Connection,
    doctor: i64,
) -> Result<Vec<TreatmentHistoryView>, ClinicError> {
    list(conn, HistoryFilter {
        doctor: Some(doctor),
        ..Default::default()
    })
}

pub fn all_histories(conn: &Connection) -> Result<Vec<TreatmentHistoryView>, ClinicError> {
    list(conn, HistoryFilter::default())
}

/// Case-insensitive search over patient identity and treatment name.
pub fn search_histories(conn: &Connection, query: &str) -> Result<Vec<TreatmentHistoryView>, ClinicError> {
    list(conn, HistoryFilter {
        query: Some(query.to_string()),
        ..Default::default()
    })
}

fn list(conn: &Connection, filter: HistoryFilter) -> Result<Vec<TreatmentHistoryView>, ClinicError> {
    Ok(repository::list_history_views(conn, &filter)?)
}
