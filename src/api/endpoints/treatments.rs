//! Treatment catalog and treatment history endpoints.
//!
//! - `GET /api/patient/history`: the calling patient's history
//! - `GET|POST /api/doctor/history`, `GET|PUT|DELETE /api/doctor/history/:id`
//! - `GET /api/receptionist/history`: every entry
//! - `GET /api/search?q=`
//! - `GET|POST /api/treatments`

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::models::{
    NewTreatment, NewTreatmentHistory, Role, Treatment, TreatmentHistory, TreatmentHistoryUpdate,
    TreatmentHistoryView,
};
use crate::treatments;

#[derive(Serialize)]
pub struct HistoryResponse {
    pub history: Vec<TreatmentHistoryView>,
}

/// `GET /api/patient/history`
pub async fn patient_history(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<HistoryResponse>, ApiError> {
    caller.require(Role::Patient)?;
    let conn = ctx.core.open_db()?;
    let history = treatments::histories_for_patient(&conn, caller.user_id)?;
    Ok(Json(HistoryResponse { history }))
}

/// `GET /api/doctor/history`
pub async fn doctor_history(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<HistoryResponse>, ApiError> {
    caller.require(Role::Doctor)?;
    let conn = ctx.core.open_db()?;
    let history = treatments::histories_for_doctor(&conn, caller.user_id)?;
    Ok(Json(HistoryResponse { history }))
}

/// `POST /api/doctor/history`: the caller is recorded as the doctor.
pub async fn record(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    payload: Result<Json<NewTreatmentHistory>, JsonRejection>,
) -> Result<(StatusCode, Json<TreatmentHistory>), ApiError> {
    caller.require(Role::Doctor)?;
    let Json(input) = payload?;
    let conn = ctx.core.open_db()?;
    let history = treatments::record_history(&conn, caller.user_id, input)?;
    Ok((StatusCode::CREATED, Json(history)))
}

/// `GET /api/doctor/history/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<TreatmentHistory>, ApiError> {
    caller.require(Role::Doctor)?;
    let Path(id) = id?;
    let conn = ctx.core.open_db()?;
    Ok(Json(treatments::get_history(&conn, caller.user_id, id)?))
}

/// `PUT /api/doctor/history/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TreatmentHistoryUpdate>, JsonRejection>,
) -> Result<Json<TreatmentHistory>, ApiError> {
    caller.require(Role::Doctor)?;
    let Path(id) = id?;
    let Json(update) = payload?;
    let conn = ctx.core.open_db()?;
    Ok(Json(treatments::update_history(&conn, caller.user_id, id, update)?))
}

/// `DELETE /api/doctor/history/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    caller.require(Role::Doctor)?;
    let Path(id) = id?;
    let conn = ctx.core.open_db()?;
    treatments::delete_history(&conn, caller.user_id, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/receptionist/history`
pub async fn all_history(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<HistoryResponse>, ApiError> {
    caller.require_any(&[Role::Receptionist, Role::Admin])?;
    let conn = ctx.core.open_db()?;
    let history = treatments::all_histories(&conn)?;
    Ok(Json(HistoryResponse { history }))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// `GET /api/search?q=`: blank queries return everything.
pub async fn search(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    caller.require_any(&[Role::Doctor, Role::Receptionist, Role::Admin])?;
    let Query(query) = query?;
    let conn = ctx.core.open_db()?;
    let history = treatments::search_histories(&conn, &query.q)?;
    Ok(Json(HistoryResponse { history }))
}

#[derive(Serialize)]
pub struct TreatmentsResponse {
    pub treatments: Vec<Treatment>,
}

/// `GET /api/treatments`
pub async fn list_treatments(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<CallerContext>,
) -> Result<Json<TreatmentsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let treatments = treatments::list_treatments(&conn)?;
    Ok(Json(TreatmentsResponse { treatments }))
}

/// `POST /api/treatments`: doctors and admins.
pub async fn create_treatment(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    payload: Result<Json<NewTreatment>, JsonRejection>,
) -> Result<(StatusCode, Json<Treatment>), ApiError> {
    caller.require_any(&[Role::Doctor, Role::Admin])?;
    let Json(input) = payload?;
    let conn = ctx.core.open_db()?;
    let treatment = treatments::create_treatment(&conn, input)?;
    Ok((StatusCode::CREATED, Json(treatment)))
}
