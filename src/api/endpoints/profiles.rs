//! Doctor and patient profile endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::models::{
    DoctorProfile, DoctorProfileUpdate, DoctorView, PatientProfile, PatientProfileUpdate, Role,
};
use crate::users;

#[derive(Serialize)]
pub struct DoctorsResponse {
    pub doctors: Vec<DoctorView>,
}

/// `GET /api/doctors`: directory of active doctors.
pub async fn list_doctors(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<CallerContext>,
) -> Result<Json<DoctorsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let doctors = users::list_doctors(&conn)?;
    Ok(Json(DoctorsResponse { doctors }))
}

/// `PATCH /api/doctors/me`
pub async fn update_doctor(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    payload: Result<Json<DoctorProfileUpdate>, JsonRejection>,
) -> Result<Json<DoctorProfile>, ApiError> {
    caller.require(Role::Doctor)?;
    let Json(update) = payload?;

    let conn = ctx.core.open_db()?;
    Ok(Json(users::update_doctor_profile(&conn, caller.user_id, update)?))
}

/// `PATCH /api/patients/me`
pub async fn update_patient(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    payload: Result<Json<PatientProfileUpdate>, JsonRejection>,
) -> Result<Json<PatientProfile>, ApiError> {
    caller.require(Role::Patient)?;
    let Json(update) = payload?;

    let conn = ctx.core.open_db()?;
    Ok(Json(users::update_patient_profile(&conn, caller.user_id, update)?))
}
