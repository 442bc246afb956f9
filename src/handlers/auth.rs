use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::AuthUser;
use crate::models::{Department, Role, UserModel};
use crate::response::ApiResponse;
use crate::services::auth::{AuthService, Registration};
use crate::services::user::UserService;
use axum::{response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// College-issued identifier, unique per account
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "collegeId is required"))]
    pub college_id: String,
    /// Password (min 6 characters)
    #[serde(default)]
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    /// Display name
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    /// user (default), maintainer or field_head
    pub role: Option<String>,
    /// Required for maintainer and field_head
    pub department: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub college_id: String,
    #[serde(default)]
    pub password: String,
    /// Role the caller is logging in as
    pub role: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub college_id: String,
    pub name: String,
    pub role: Role,
    pub department: Option<Department>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: String,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            college_id: user.college_id,
            name: user.name,
            role: user.role,
            department: user.department,
            email: user.email,
            phone: user.phone,
            created_at: user.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// JWT access token
    pub token: String,
    pub user: UserResponse,
}

pub(crate) fn parse_optional<T>(raw: Option<&str>) -> AppResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e: T::Err| AppError::Validation(e.to_string())),
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "College ID already registered", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Json(mut payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload.email = blank_to_none(payload.email);
    payload.phone = blank_to_none(payload.phone);
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let role = parse_optional::<Role>(payload.role.as_deref())?.unwrap_or(Role::User);
    let department = parse_optional::<Department>(payload.department.as_deref())?;

    let service = AuthService::new(db);
    let (user, token) = service
        .register(Registration {
            college_id: payload.college_id.trim().to_string(),
            password: payload.password,
            name: payload.name.trim().to_string(),
            role,
            department,
            email: payload.email,
            phone: payload.phone,
        })
        .await?;

    Ok(ApiResponse::with_message(
        AuthResponse {
            token,
            user: UserResponse::from(user),
        },
        "Registration successful.",
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing credentials", body = AppError),
        (status = 401, description = "Invalid credentials", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    if payload.college_id.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "collegeId and password are required".to_string(),
        ));
    }
    let role = parse_optional::<Role>(payload.role.as_deref())?
        .ok_or_else(|| AppError::Validation("role is required".to_string()))?;

    let service = AuthService::new(db);
    let (user, token) = service
        .login(payload.college_id.trim(), &payload.password, role)
        .await?;

    Ok(ApiResponse::ok(AuthResponse {
        token,
        user: UserResponse::from(user),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current user retrieved successfully", body = UserResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user = UserService::new(db).get_by_id(auth_user.user_id).await?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}
