//! User endpoints.
//!
//! - `POST /api/users`: register (public)
//! - `POST /api/users/verify-email`: confirm an OTP (public)
//! - `GET /api/users/me`, `GET /api/users`
//! - `PATCH /api/users/:id`, `PUT /api/users/:id/role`, `DELETE /api/users/:id`
//! - `POST /api/users/:id/otp`

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::models::{NewUser, Role, User, UserFilter, UserUpdate};
use crate::users::{self, RoleChange};

/// `POST /api/users`: register a patient. No profile is provisioned.
///
/// Role and elevated flags are never taken from the public endpoint; roles
/// change only through the admin-only role endpoint.
pub async fn register(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(mut input) = payload?;
    input.role = Role::default();
    input.is_staff = false;
    input.is_superuser = false;

    // Password hashing is CPU-bound
    let core = ctx.core.clone();
    let user = tokio::task::spawn_blocking(move || -> Result<User, ApiError> {
        let conn = core.open_db()?;
        let user = users::create_user(&conn, input)?;
        users::issue_verification_token(&conn, user.id)?;
        Ok(user)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Registration task failed: {e}")))??;

    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Serialize)]
pub struct VerifyEmailResponse {
    pub verified: bool,
}

/// `POST /api/users/verify-email`
pub async fn verify_email(
    State(ctx): State<ApiContext>,
    payload: Result<Json<VerifyEmailRequest>, JsonRejection>,
) -> Result<Json<VerifyEmailResponse>, ApiError> {
    let Json(req) = payload?;
    let conn = ctx.core.open_db()?;
    let verified = users::verify_email(&conn, &req.email, &req.otp)?;
    Ok(Json(VerifyEmailResponse { verified }))
}

/// `GET /api/users/me`
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<User>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(users::get_user(&conn, caller.user_id)?))
}

#[derive(Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
}

#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

/// `GET /api/users?role=`: admin and receptionist only.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<UsersResponse>, ApiError> {
    caller.require_any(&[Role::Admin, Role::Receptionist])?;
    let Query(query) = query?;

    let conn = ctx.core.open_db()?;
    let users = users::list_users(
        &conn,
        &UserFilter {
            role: query.role,
            active_only: false,
        },
    )?;
    Ok(Json(UsersResponse { users }))
}

/// `PATCH /api/users/:id`: the user themself or an admin.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Path(id) = id?;
    caller.require_self_or_admin(id)?;
    let Json(mut update) = payload?;
    if caller.role != Role::Admin {
        update.is_active = None;
    }

    let conn = ctx.core.open_db()?;
    Ok(Json(users::update_user(&conn, id, update)?))
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

/// `PUT /api/users/:id/role`: admin only. Provisions the matching profile.
pub async fn change_role(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ChangeRoleRequest>, JsonRejection>,
) -> Result<Json<RoleChange>, ApiError> {
    caller.require(Role::Admin)?;
    let Path(id) = id?;
    let Json(req) = payload?;

    let conn = ctx.core.open_db()?;
    Ok(Json(users::change_user_role(&conn, id, req.role)?))
}

/// `DELETE /api/users/:id`: admin only.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    caller.require(Role::Admin)?;
    let Path(id) = id?;

    let conn = ctx.core.open_db()?;
    users::delete_user(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct OtpResponse {
    pub issued: bool,
}

/// `POST /api/users/:id/otp`: store a fresh OTP. Delivery happens out of band.
pub async fn issue_otp(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<(StatusCode, Json<OtpResponse>), ApiError> {
    let Path(id) = id?;
    caller.require_self_or_admin(id)?;

    let conn = ctx.core.open_db()?;
    users::issue_otp(&conn, id)?;
    Ok((StatusCode::ACCEPTED, Json(OtpResponse { issued: true })))
}
