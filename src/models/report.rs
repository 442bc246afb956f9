use super::enums::{Department, ReportStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A live report. Rows rejected as fake are moved to `fake_reports` and never
/// carry `ReportStatus::Fake` here.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
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
    pub verified_at: Option<DateTime>,
    pub assigned_at: Option<DateTime>,
    pub in_progress_at: Option<DateTime>,
    pub resolved_at: Option<DateTime>,
    pub closure_image_url: Option<String>,
    /// Bumped on every lifecycle write; guards against lost updates.
    pub version: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReporterId",
        to = "super::user::Column::Id"
    )]
    Reporter,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reporter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
