//! Weekly availability and appointment booking.
//!
//! Availability is declarative. `max_patients` is stored and returned but
//! booking does not count against it.

use rusqlite::Connection;

use crate::db::repository;
use crate::error::ClinicError;
use crate::models::*;

// ═══════════════════════════════════════════
// Availability
// ═══════════════════════════════════════════

pub fn declare_availability(
    conn: &Connection,
    input: NewAvailability,
) -> Result<Availability, ClinicError> {
    if let Some(doctor) = input.doctor {
        repository::get_doctor_profile(conn, doctor)?
            .ok_or_else(|| ClinicError::not_found("DoctorProfile", doctor))?;
    }
    let max_patients = input.max_patients.unwrap_or(DEFAULT_MAX_PATIENTS);
    let id = repository::insert_availability(conn, input.doctor, input.day_of_week, max_patients)?;

    tracing::info!(
        availability_id = id,
        doctor = ?input.doctor,
        day = %input.day_of_week,
        max_patients,
        "Availability declared"
    );

    repository::get_availability(conn, id)?.ok_or_else(|| ClinicError::not_found("Availability", id))
}

/// Entries in week order. `None` lists every doctor.
pub fn list_availability(
    conn: &Connection,
    doctor: Option<i64>,
) -> Result<Vec<Availability>, ClinicError> {
    Ok(repository::list_availability(conn, doctor)?)
}

pub fn get_availability(conn: &Connection, id: i64) -> Result<Availability, ClinicError> {
    repository::get_availability(conn, id)?.ok_or_else(|| ClinicError::not_found("Availability", id))
}

pub fn delete_availability(conn: &Connection, id: i64) -> Result<(), ClinicError> {
    repository::delete_availability(conn, id)?;
    tracing::info!(availability_id = id, "Availability removed");
    Ok(())
}

// ═══════════════════════════════════════════
// Appointments
// ═══════════════════════════════════════════

/// Book an appointment between a patient profile and a doctor profile.
///
/// Status defaults to `Scheduled`. No overlap or capacity check is made.
pub fn book_appointment(
    conn: &Connection,
    request: BookingRequest,
) -> Result<AppointmentView, ClinicError> {
    repository::get_patient_profile(conn, request.patient)?
        .ok_or_else(|| ClinicError::not_found("PatientProfile", request.patient))?;
    repository::get_doctor_profile(conn, request.doctor)?
        .ok_or_else(|| ClinicError::not_found("DoctorProfile", request.doctor))?;

    let status = request.status.unwrap_or_default();
    let id = repository::insert_appointment(
        conn,
        request.patient,
        request.doctor,
        &request.appointment_date,
        status,
    )?;

    tracing::info!(
        appointment_id = id,
        patient = request.patient,
        doctor = request.doctor,
        %status,
        "Appointment booked"
    );

    get_appointment(conn, id)
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<AppointmentView, ClinicError> {
    repository::get_appointment_view(conn, id)?
        .ok_or_else(|| ClinicError::not_found("Appointment", id))
}

pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> Result<Vec<AppointmentView>, ClinicError> {
    Ok(repository::list_appointment_views(conn, filter)?)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: i64,
    status: AppointmentStatus,
) -> Result<AppointmentView, ClinicError> {
    repository::update_appointment_status(conn, id, status)?;
    tracing::info!(appointment_id = id, %status, "Appointment status changed");
    get_appointment(conn, id)
}

/// Profile id of the user's patient profile, if provisioned.
pub fn patient_profile_id(conn: &Connection, user_id: i64) -> Result<Option<i64>, ClinicError> {
    Ok(repository::get_patient_profile_by_user(conn, user_id)?.map(|p| p.id))
}

/// Profile id of the user's doctor profile, if provisioned.
pub fn doctor_profile_id(conn: &Connection, user_id: i64) -> Result<Option<i64>, ClinicError> {
    Ok(repository::get_doctor_profile_by_user(conn, user_id)?.map(|p| p.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::users;
    use chrono::{TimeZone, Utc};

    /// Creates a user and moves it into `role` so the profile is provisioned.
    fn provisioned(conn: &Connection, username: &str, role: Role) -> i64 {
        let start = if role == Role::Patient { Role::Admin } else { Role::Patient };
        let user = users::create_user(
            conn,
            NewUser {
                username: username.into(),
                email: format!("{username}@example.com"),
                role: start,
                ..Default::default()
            },
        )
        .unwrap();
        users::change_user_role(conn, user.id, role).unwrap();
        user.id
    }

    fn setup() -> (Connection, i64, i64) {
        let conn = open_memory_database().unwrap();
        let patient_user = provisioned(&conn, "pat", Role::Patient);
        let doctor_user = provisioned(&conn, "doc", Role::Doctor);
        let patient = patient_profile_id(&conn, patient_user).unwrap().unwrap();
        let doctor = doctor_profile_id(&conn, doctor_user).unwrap().unwrap();
        (conn, patient, doctor)
    }

    fn booking(patient: i64, doctor: i64) -> BookingRequest {
        BookingRequest {
            patient,
            doctor,
            appointment_date: Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap(),
            status: None,
        }
    }

    #[test]
    fn booking_defaults_to_scheduled() {
        let (conn, patient, doctor) = setup();
        let view = book_appointment(&conn, booking(patient, doctor)).unwrap();
        assert_eq!(view.status, AppointmentStatus::Scheduled);
        assert_eq!(view.patient.user.username, "pat");
        assert_eq!(view.doctor.user.username, "doc");
    }

    #[test]
    fn booking_ignores_declared_capacity() {
        let (conn, patient, doctor) = setup();
        declare_availability(
            &conn,
            NewAvailability {
                doctor: Some(doctor),
                day_of_week: DayOfWeek::Monday,
                max_patients: Some(1),
            },
        )
        .unwrap();

        for _ in 0..3 {
            let view = book_appointment(&conn, booking(patient, doctor)).unwrap();
            assert_eq!(view.status, AppointmentStatus::Scheduled);
        }
        assert_eq!(list_appointments(&conn, &AppointmentFilter::default()).unwrap().len(), 3);
    }

    #[test]
    fn booking_unknown_doctor_is_not_found() {
        let (conn, patient, _) = setup();
        let err = book_appointment(&conn, booking(patient, 999)).unwrap_err();
        assert!(matches!(err, ClinicError::NotFound { ref entity, .. } if entity == "DoctorProfile"));
    }

    #[test]
    fn booking_unknown_patient_is_not_found() {
        let (conn, _, doctor) = setup();
        let err = book_appointment(&conn, booking(999, doctor)).unwrap_err();
        assert!(matches!(err, ClinicError::NotFound { ref entity, .. } if entity == "PatientProfile"));
    }

    #[test]
    fn explicit_status_is_kept() {
        let (conn, patient, doctor) = setup();
        let mut request = booking(patient, doctor);
        request.status = Some(AppointmentStatus::Completed);
        assert_eq!(
            book_appointment(&conn, request).unwrap().status,
            AppointmentStatus::Completed
        );
    }

    #[test]
    fn status_can_be_changed() {
        let (conn, patient, doctor) = setup();
        let view = book_appointment(&conn, booking(patient, doctor)).unwrap();
        let updated = update_appointment_status(&conn, view.id, AppointmentStatus::Canceled).unwrap();
        assert_eq!(updated.status, AppointmentStatus::Canceled);
        assert!(matches!(
            update_appointment_status(&conn, 4242, AppointmentStatus::Canceled),
            Err(ClinicError::NotFound { .. })
        ));
    }

    #[test]
    fn listing_is_scoped_by_patient() {
        let (conn, patient, doctor) = setup();
        book_appointment(&conn, booking(patient, doctor)).unwrap();
        let other_user = provisioned(&conn, "other", Role::Patient);
        let other = patient_profile_id(&conn, other_user).unwrap().unwrap();
        book_appointment(&conn, booking(other, doctor)).unwrap();

        let mine = list_appointments(
            &conn,
            &AppointmentFilter {
                patient: Some(patient),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].patient.id, patient);
    }

    #[test]
    fn availability_defaults_to_ten_patients() {
        let (conn, _, doctor) = setup();
        let entry = declare_availability(
            &conn,
            NewAvailability {
                doctor: Some(doctor),
                day_of_week: DayOfWeek::Tuesday,
                max_patients: None,
            },
        )
        .unwrap();
        assert_eq!(entry.max_patients, DEFAULT_MAX_PATIENTS);
        assert_eq!(list_availability(&conn, Some(doctor)).unwrap(), vec![entry.clone()]);

        delete_availability(&conn, entry.id).unwrap();
        assert!(list_availability(&conn, Some(doctor)).unwrap().is_empty());
    }

    #[test]
    fn availability_for_unknown_doctor_is_not_found() {
        let (conn, _, _) = setup();
        let err = declare_availability(
            &conn,
            NewAvailability {
                doctor: Some(404),
                day_of_week: DayOfWeek::Friday,
                max_patients: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ClinicError::NotFound { .. }));
    }

    #[test]
    fn deleting_doctor_user_cascades_schedule() {
        let conn = open_memory_database().unwrap();
        let patient_user = provisioned(&conn, "pat", Role::Patient);
        let doctor_user = provisioned(&conn, "doc", Role::Doctor);
        let patient = patient_profile_id(&conn, patient_user).unwrap().unwrap();
        let doctor = doctor_profile_id(&conn, doctor_user).unwrap().unwrap();
        book_appointment(&conn, booking(patient, doctor)).unwrap();
        declare_availability(
            &conn,
            NewAvailability {
                doctor: Some(doctor),
                day_of_week: DayOfWeek::Monday,
                max_patients: None,
            },
        )
        .unwrap();

        users::delete_user(&conn, doctor_user).unwrap();
        assert!(list_appointments(&conn, &AppointmentFilter::default()).unwrap().is_empty());
        assert!(list_availability(&conn, None).unwrap().is_empty());
    }
}
