use super::enums::{Department, ReportStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Append-only archive of reports rejected as fake.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "fake_reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub original_report_id: i32,
    #[sea_orm(column_type = "String(StringLen::N(200))")]
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category: Department,
    #[sea_orm(column_type = "String(StringLen::N(255))")]
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
    /// Time of rejection.
    pub verified_at: DateTime,
    pub assigned_at: Option<DateTime>,
    pub in_progress_at: Option<DateTime>,
    pub resolved_at: Option<DateTime>,
    pub closure_image_url: Option<String>,
    /// Creation time of the original report.
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
