//! Appointment endpoints.
//!
//! - `GET /api/appointments`: scoped by caller role
//! - `POST /api/appointments/book`
//! - `GET /api/appointments/:id`
//! - `PATCH /api/appointments/:id/status`

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::models::{AppointmentFilter, AppointmentStatus, AppointmentView, BookingRequest, Role};
use crate::scheduling;

/// Whose appointments a caller may see.
enum Scope {
    All,
    Patient(i64),
    Doctor(i64),
    Nothing,
}

fn caller_scope(conn: &Connection, caller: &CallerContext) -> Result<Scope, ApiError> {
    if caller.is_front_office() {
        return Ok(Scope::All);
    }
    let scope = match caller.role {
        Role::Patient => scheduling::patient_profile_id(conn, caller.user_id)?.map(Scope::Patient),
        Role::Doctor => scheduling::doctor_profile_id(conn, caller.user_id)?.map(Scope::Doctor),
        _ => None,
    };
    Ok(scope.unwrap_or(Scope::Nothing))
}

fn can_see(scope: &Scope, view: &AppointmentView) -> bool {
    match scope {
        Scope::All => true,
        Scope::Patient(id) => view.patient.id == *id,
        Scope::Doctor(id) => view.doctor.id == *id,
        Scope::Nothing => false,
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<AppointmentStatus>,
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<AppointmentView>,
}

/// `GET /api/appointments?status=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let Query(query) = query?;
    let conn = ctx.core.open_db()?;

    let mut filter = AppointmentFilter {
        status: query.status,
        ..Default::default()
    };
    match caller_scope(&conn, &caller)? {
        Scope::All => {}
        Scope::Patient(id) => filter.patient = Some(id),
        Scope::Doctor(id) => filter.doctor = Some(id),
        Scope::Nothing => {
            return Ok(Json(AppointmentsResponse {
                appointments: Vec::new(),
            }))
        }
    }

    let appointments = scheduling::list_appointments(&conn, &filter)?;
    Ok(Json(AppointmentsResponse { appointments }))
}

/// `POST /api/appointments/book`: patients may only book for themselves.
pub async fn book(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AppointmentView>), ApiError> {
    let Json(request) = payload?;
    let conn = ctx.core.open_db()?;

    if caller.role == Role::Patient {
        let own = scheduling::patient_profile_id(&conn, caller.user_id)?;
        if own != Some(request.patient) {
            return Err(ApiError::Forbidden(
                "Patients can only book their own appointments".into(),
            ));
        }
    }

    let view = scheduling::book_appointment(&conn, request)?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /api/appointments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<AppointmentView>, ApiError> {
    let Path(id) = id?;
    let conn = ctx.core.open_db()?;

    let view = scheduling::get_appointment(&conn, id)?;
    if !can_see(&caller_scope(&conn, &caller)?, &view) {
        return Err(ApiError::Forbidden("Not your appointment".into()));
    }
    Ok(Json(view))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: AppointmentStatus,
}

/// `PATCH /api/appointments/:id/status`: patients may only cancel.
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<AppointmentView>, ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let conn = ctx.core.open_db()?;

    let view = scheduling::get_appointment(&conn, id)?;
    if !can_see(&caller_scope(&conn, &caller)?, &view) {
        return Err(ApiError::Forbidden("Not your appointment".into()));
    }
    if caller.role == Role::Patient && req.status != AppointmentStatus::Canceled {
        return Err(ApiError::Forbidden("Patients can only cancel".into()));
    }

    Ok(Json(scheduling::update_appointment_status(&conn, id, req.status)?))
}
