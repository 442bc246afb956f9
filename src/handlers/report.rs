use crate::error::{AppError, AppResult};
use crate::extract::{Json, Path, Query};
use crate::handlers::auth::parse_optional;
use crate::middleware::AuthUser;
use crate::models::{Department, FakeReportModel, ReportModel, ReportStatus};
use crate::response::ApiResponse;
use crate::services::notification::NotificationDispatcher;
use crate::services::policy::{HistoryFilter, ListFilters, ReportView};
use crate::services::report::{HistoryEntry, ReportDraft, ReportService};
use axum::{response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub category: Department,
    pub location: String,
    pub image_url: Option<String>,
    pub status: ReportStatus,
    pub reporter_id: i32,
    pub reporter_name: String,
    pub maintainer_id: Option<i32>,
    pub maintainer_name: Option<String>,
    pub field_head_id: Option<i32>,
    pub field_head_name: Option<String>,
    pub department: Department,
    pub verified_at: Option<String>,
    pub assigned_at: Option<String>,
    pub in_progress_at: Option<String>,
    pub resolved_at: Option<String>,
    pub closure_image_url: Option<String>,
    /// Set on archived (fake) rows only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_report_id: Option<i32>,
    pub created_at: String,
}

fn timestamp(value: Option<chrono::NaiveDateTime>) -> Option<String> {
    value.map(|v| v.to_string())
}

impl From<ReportModel> for ReportResponse {
    fn from(r: ReportModel) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            category: r.category,
            location: r.location,
            image_url: r.image_url,
            status: r.status,
            reporter_id: r.reporter_id,
            reporter_name: r.reporter_name,
            maintainer_id: r.maintainer_id,
            maintainer_name: r.maintainer_name,
            field_head_id: r.field_head_id,
            field_head_name: r.field_head_name,
            department: r.department,
            verified_at: timestamp(r.verified_at),
            assigned_at: timestamp(r.assigned_at),
            in_progress_at: timestamp(r.in_progress_at),
            resolved_at: timestamp(r.resolved_at),
            closure_image_url: r.closure_image_url,
            original_report_id: None,
            created_at: r.created_at.to_string(),
        }
    }
}

impl From<FakeReportModel> for ReportResponse {
    fn from(f: FakeReportModel) -> Self {
        Self {
            id: f.id,
            title: f.title,
            description: f.description,
            category: f.category,
            location: f.location,
            image_url: f.image_url,
            status: f.status,
            reporter_id: f.reporter_id,
            reporter_name: f.reporter_name,
            maintainer_id: f.maintainer_id,
            maintainer_name: f.maintainer_name,
            field_head_id: f.field_head_id,
            field_head_name: f.field_head_name,
            department: f.department,
            verified_at: Some(f.verified_at.to_string()),
            assigned_at: timestamp(f.assigned_at),
            in_progress_at: timestamp(f.in_progress_at),
            resolved_at: timestamp(f.resolved_at),
            closure_image_url: f.closure_image_url,
            original_report_id: Some(f.original_report_id),
            created_at: f.created_at.to_string(),
        }
    }
}

impl From<HistoryEntry> for ReportResponse {
    fn from(entry: HistoryEntry) -> Self {
        match entry {
            HistoryEntry::Live(r) => r.into(),
            HistoryEntry::Archived(f) => f.into(),
        }
    }
}

fn into_responses<T: Into<ReportResponse>>(rows: Vec<T>) -> Vec<ReportResponse> {
    rows.into_iter().map(Into::into).collect()
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    #[validate(length(max = 200, message = "title must be at most 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    pub description: Option<String>,
    /// road, electric, water, building or other
    pub category: Option<String>,
    #[validate(length(max = 255, message = "location must be at most 255 characters"))]
    pub location: Option<String>,
    #[validate(length(max = 500, message = "imageUrl must be at most 500 characters"))]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyReportRequest {
    /// verified or fake
    #[serde(default)]
    pub status: String,
    /// Department to route a verified report to; defaults to the current one
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignReportRequest {
    pub field_head_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// in_progress or resolved
    #[serde(default)]
    pub status: String,
    #[validate(length(max = 500, message = "closureImageUrl must be at most 500 characters"))]
    pub closure_image_url: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReportListQuery {
    pub status: Option<String>,
    /// `verify_section` for the field-head verification queue
    pub view: Option<String>,
    pub category: Option<String>,
    pub department: Option<String>,
}

impl ReportListQuery {
    fn into_filters(self) -> AppResult<ListFilters> {
        Ok(ListFilters {
            status: parse_optional::<ReportStatus>(self.status.as_deref())?,
            view: parse_optional::<ReportView>(self.view.as_deref())?,
            category: parse_optional::<Department>(self.category.as_deref())?,
            department: parse_optional::<Department>(self.department.as_deref())?,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// all, fake or a live status
    pub status: Option<String>,
}

fn service(db: DatabaseConnection, dispatcher: NotificationDispatcher) -> ReportService {
    ReportService::new(db, dispatcher)
}

#[utoipa::path(
    post,
    path = "/api/reports",
    security(("jwt_token" = [])),
    request_body = CreateReportRequest,
    responses(
        (status = 200, description = "Report submitted", body = ReportResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "reports"
)]
pub async fn create_report(
    Extension(db): Extension<DatabaseConnection>,
    Extension(dispatcher): Extension<NotificationDispatcher>,
    auth_user: AuthUser,
    Json(payload): Json<CreateReportRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let report = service(db, dispatcher)
        .submit(
            &auth_user,
            ReportDraft {
                title: payload.title,
                description: payload.description,
                category: payload.category,
                location: payload.location,
                image_url: payload.image_url,
            },
        )
        .await?;

    Ok(ApiResponse::with_message(
        ReportResponse::from(report),
        "Report submitted successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/api/reports",
    security(("jwt_token" = [])),
    params(ReportListQuery),
    responses(
        (status = 200, description = "Reports visible to the caller", body = Vec<ReportResponse>),
        (status = 400, description = "Invalid filter", body = AppError),
        (status = 403, description = "Foreign department", body = AppError),
    ),
    tag = "reports"
)]
pub async fn list_reports(
    Extension(db): Extension<DatabaseConnection>,
    Extension(dispatcher): Extension<NotificationDispatcher>,
    auth_user: AuthUser,
    Query(query): Query<ReportListQuery>,
) -> AppResult<impl IntoResponse> {
    let filters = query.into_filters()?;
    let reports = service(db, dispatcher).list(&auth_user, &filters).await?;
    Ok(ApiResponse::ok(into_responses(reports)))
}

#[utoipa::path(
    get,
    path = "/api/reports/{report_id}",
    security(("jwt_token" = [])),
    params(("report_id" = i32, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report", body = ReportResponse),
        (status = 403, description = "Not visible to the caller", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
    ),
    tag = "reports"
)]
pub async fn get_report(
    Extension(db): Extension<DatabaseConnection>,
    Extension(dispatcher): Extension<NotificationDispatcher>,
    auth_user: AuthUser,
    Path(report_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let report = service(db, dispatcher).get(&auth_user, report_id).await?;
    Ok(ApiResponse::ok(ReportResponse::from(report)))
}

#[utoipa::path(
    get,
    path = "/api/reports/user/{user_id}",
    security(("jwt_token" = [])),
    params(("user_id" = i32, Path, description = "Reporter ID")),
    responses(
        (status = 200, description = "Reports filed by the user", body = Vec<ReportResponse>),
        (status = 403, description = "Not allowed", body = AppError),
    ),
    tag = "reports"
)]
pub async fn list_user_reports(
    Extension(db): Extension<DatabaseConnection>,
    Extension(dispatcher): Extension<NotificationDispatcher>,
    auth_user: AuthUser,
    Path(user_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let reports = service(db, dispatcher)
        .list_by_reporter(&auth_user, user_id)
        .await?;
    Ok(ApiResponse::ok(into_responses(reports)))
}

#[utoipa::path(
    put,
    path = "/api/reports/{report_id}/verify",
    security(("jwt_token" = [])),
    params(("report_id" = i32, Path, description = "Report ID")),
    request_body = VerifyReportRequest,
    responses(
        (status = 200, description = "Report verified or archived as fake", body = ReportResponse),
        (status = 400, description = "Invalid decision or department", body = AppError),
        (status = 403, description = "Not a field head of this department", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
        (status = 409, description = "Concurrent modification", body = AppError),
    ),
    tag = "reports"
)]
pub async fn verify_report(
    Extension(db): Extension<DatabaseConnection>,
    Extension(dispatcher): Extension<NotificationDispatcher>,
    auth_user: AuthUser,
    Path(report_id): Path<i32>,
    Json(payload): Json<VerifyReportRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = service(db, dispatcher)
        .verify(
            &auth_user,
            report_id,
            &payload.status,
            payload.department.as_deref(),
        )
        .await?;

    let response = match outcome {
        Some(report) => ApiResponse::with_message(
            ReportResponse::from(report),
            "Report verified successfully",
        )
        .into_response(),
        None => ApiResponse::<()>::message("Report marked as fake and archived").into_response(),
    };
    Ok(response)
}

#[utoipa::path(
    put,
    path = "/api/reports/{report_id}/assign",
    security(("jwt_token" = [])),
    params(("report_id" = i32, Path, description = "Report ID")),
    request_body = AssignReportRequest,
    responses(
        (status = 200, description = "Report assigned", body = ReportResponse),
        (status = 400, description = "Not assignable or unknown field head", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
        (status = 409, description = "Concurrent modification", body = AppError),
    ),
    tag = "reports"
)]
pub async fn assign_report(
    Extension(db): Extension<DatabaseConnection>,
    Extension(dispatcher): Extension<NotificationDispatcher>,
    auth_user: AuthUser,
    Path(report_id): Path<i32>,
    Json(payload): Json<AssignReportRequest>,
) -> AppResult<impl IntoResponse> {
    let field_head_id = payload
        .field_head_id
        .ok_or_else(|| AppError::Validation("fieldHeadId is required".to_string()))?;

    let report = service(db, dispatcher)
        .assign(&auth_user, report_id, field_head_id)
        .await?;

    Ok(ApiResponse::with_message(
        ReportResponse::from(report),
        "Report assigned successfully",
    ))
}

#[utoipa::path(
    put,
    path = "/api/reports/{report_id}/status",
    security(("jwt_token" = [])),
    params(("report_id" = i32, Path, description = "Report ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ReportResponse),
        (status = 400, description = "Transition not allowed", body = AppError),
        (status = 403, description = "Not a maintainer of this department", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
        (status = 409, description = "Concurrent modification", body = AppError),
    ),
    tag = "reports"
)]
pub async fn update_report_status(
    Extension(db): Extension<DatabaseConnection>,
    Extension(dispatcher): Extension<NotificationDispatcher>,
    auth_user: AuthUser,
    Path(report_id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let report = service(db, dispatcher)
        .advance_status(
            &auth_user,
            report_id,
            &payload.status,
            payload.closure_image_url,
        )
        .await?;

    Ok(ApiResponse::with_message(
        ReportResponse::from(report),
        "Report status updated successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/api/reports/department/{department}",
    security(("jwt_token" = [])),
    params(("department" = String, Path, description = "Department")),
    responses(
        (status = 200, description = "Active reports of the department", body = Vec<ReportResponse>),
        (status = 403, description = "Not a field head of this department", body = AppError),
    ),
    tag = "reports"
)]
pub async fn department_reports(
    Extension(db): Extension<DatabaseConnection>,
    Extension(dispatcher): Extension<NotificationDispatcher>,
    auth_user: AuthUser,
    Path(department): Path<String>,
) -> AppResult<impl IntoResponse> {
    let reports = service(db, dispatcher)
        .department_reports(&auth_user, &department)
        .await?;
    Ok(ApiResponse::ok(into_responses(reports)))
}

#[utoipa::path(
    get,
    path = "/api/reports/department-history/{department}",
    security(("jwt_token" = [])),
    params(
        ("department" = String, Path, description = "Department"),
        HistoryQuery,
    ),
    responses(
        (status = 200, description = "Department history, newest first", body = Vec<ReportResponse>),
        (status = 400, description = "Invalid status filter", body = AppError),
        (status = 403, description = "Not a field head of this department", body = AppError),
    ),
    tag = "reports"
)]
pub async fn department_history(
    Extension(db): Extension<DatabaseConnection>,
    Extension(dispatcher): Extension<NotificationDispatcher>,
    auth_user: AuthUser,
    Path(department): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = HistoryFilter::parse(query.status.as_deref())?;
    let entries = service(db, dispatcher)
        .department_history(&auth_user, &department, filter)
        .await?;
    Ok(ApiResponse::ok(into_responses(entries)))
}
