//! Weekly availability endpoints.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::models::{Availability, NewAvailability, Role};
use crate::scheduling;

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub doctor: Option<i64>,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub availability: Vec<Availability>,
}

/// `GET /api/availability?doctor=`: Monday first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<CallerContext>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let Query(query) = query?;
    let conn = ctx.core.open_db()?;
    let availability = scheduling::list_availability(&conn, query.doctor)?;
    Ok(Json(AvailabilityResponse { availability }))
}

/// `POST /api/availability`
///
/// Doctors declare for their own profile; `doctor` defaults to it and any
/// other value is rejected. Admins and receptionists may declare for anyone.
pub async fn declare(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    payload: Result<Json<NewAvailability>, JsonRejection>,
) -> Result<(StatusCode, Json<Availability>), ApiError> {
    caller.require_any(&[Role::Doctor, Role::Admin, Role::Receptionist])?;
    let Json(mut input) = payload?;
    let conn = ctx.core.open_db()?;

    if caller.role == Role::Doctor {
        let own = scheduling::doctor_profile_id(&conn, caller.user_id)?
            .ok_or_else(|| ApiError::NotFound("Doctor profile not provisioned".into()))?;
        match input.doctor {
            None => input.doctor = Some(own),
            Some(id) if id == own => {}
            Some(_) => {
                return Err(ApiError::Forbidden(
                    "Doctors can only declare their own availability".into(),
                ))
            }
        }
    }

    let entry = scheduling::declare_availability(&conn, input)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `DELETE /api/availability/:id`: owning doctor, admin or receptionist.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    caller.require_any(&[Role::Doctor, Role::Admin, Role::Receptionist])?;
    let Path(id) = id?;
    let conn = ctx.core.open_db()?;

    if caller.role == Role::Doctor {
        let entry = scheduling::get_availability(&conn, id)?;
        let own = scheduling::doctor_profile_id(&conn, caller.user_id)?;
        if entry.doctor.is_none() || entry.doctor != own {
            return Err(ApiError::Forbidden("Not your availability".into()));
        }
    }

    scheduling::delete_availability(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
