use crate::error::{AppError, AppResult};
use crate::extract::{Json, Path, Query};
use crate::handlers::auth::{parse_optional, UserResponse};
use crate::middleware::AuthUser;
use crate::models::{Department, Role};
use crate::response::ApiResponse;
use crate::services::user::{ProfileUpdate, UserService};
use axum::{response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct FieldHeadQuery {
    /// Restrict to one department
    pub department: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    security(("jwt_token" = [])),
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_user(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
    Path(user_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user = UserService::new(db).get_by_id(user_id).await?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    security(("jwt_token" = [])),
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the account owner", body = AppError),
    ),
    tag = "users"
)]
pub async fn update_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<impl IntoResponse> {
    if auth_user.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let department = parse_optional::<Department>(payload.department.as_deref())?;

    let user = UserService::new(db)
        .update_profile(
            user_id,
            ProfileUpdate {
                name: payload.name,
                email: payload.email,
                phone: payload.phone,
                department,
            },
        )
        .await?;

    Ok(ApiResponse::with_message(
        UserResponse::from(user),
        "User updated successfully",
    ))
}

/// Field heads, for the assignment picker.
#[utoipa::path(
    get,
    path = "/api/users",
    security(("jwt_token" = [])),
    params(FieldHeadQuery),
    responses(
        (status = 200, description = "Field heads", body = Vec<UserResponse>),
        (status = 400, description = "Unknown department", body = AppError),
    ),
    tag = "users"
)]
pub async fn list_field_heads(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
    Query(query): Query<FieldHeadQuery>,
) -> AppResult<impl IntoResponse> {
    let department = parse_optional::<Department>(query.department.as_deref())?;
    let users = UserService::new(db)
        .find_by_role(Role::FieldHead, department)
        .await?;

    let data: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(ApiResponse::ok(data))
}
