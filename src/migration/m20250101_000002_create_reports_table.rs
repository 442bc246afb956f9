use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Reports {
    Table,
    Id,
    Title,
    Description,
    Category,
    Location,
    ImageUrl,
    Status,
    ReporterId,
    ReporterName,
    MaintainerId,
    MaintainerName,
    FieldHeadId,
    FieldHeadName,
    Department,
    VerifiedAt,
    AssignedAt,
    InProgressAt,
    ResolvedAt,
    ClosureImageUrl,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reports::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reports::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Reports::Description).text().not_null())
                    .col(ColumnDef::new(Reports::Category).string_len(20).not_null())
                    .col(ColumnDef::new(Reports::Location).string_len(255).not_null())
                    .col(ColumnDef::new(Reports::ImageUrl).string_len(500).null())
                    .col(
                        ColumnDef::new(Reports::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Reports::ReporterId).integer().not_null())
                    .col(
                        ColumnDef::new(Reports::ReporterName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reports::MaintainerId).integer().null())
                    .col(ColumnDef::new(Reports::MaintainerName).string_len(100).null())
                    .col(ColumnDef::new(Reports::FieldHeadId).integer().null())
                    .col(ColumnDef::new(Reports::FieldHeadName).string_len(100).null())
                    .col(
                        ColumnDef::new(Reports::Department)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reports::VerifiedAt).timestamp().null())
                    .col(ColumnDef::new(Reports::AssignedAt).timestamp().null())
                    .col(ColumnDef::new(Reports::InProgressAt).timestamp().null())
                    .col(ColumnDef::new(Reports::ResolvedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Reports::ClosureImageUrl)
                            .string_len(500)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Reports::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Reports::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Reports::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reports_reporter_id")
                            .from(Reports::Table, Reports::ReporterId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reports_department_status")
                    .table(Reports::Table)
                    .col(Reports::Department)
                    .col(Reports::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reports_reporter_id")
                    .table(Reports::Table)
                    .col(Reports::ReporterId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reports::Table).to_owned())
            .await
    }
}
