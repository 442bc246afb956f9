use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum FakeReports {
    Table,
    Id,
    OriginalReportId,
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
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FakeReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FakeReports::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // No foreign key: the original row is deleted once archived.
                    .col(
                        ColumnDef::new(FakeReports::OriginalReportId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FakeReports::Title).string_len(200).not_null())
                    .col(ColumnDef::new(FakeReports::Description).text().not_null())
                    .col(
                        ColumnDef::new(FakeReports::Category)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FakeReports::Location)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FakeReports::ImageUrl).string_len(500).null())
                    .col(
                        ColumnDef::new(FakeReports::Status)
                            .string_len(20)
                            .not_null()
                            .default("fake"),
                    )
                    .col(ColumnDef::new(FakeReports::ReporterId).integer().not_null())
                    .col(
                        ColumnDef::new(FakeReports::ReporterName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FakeReports::MaintainerId).integer().null())
                    .col(
                        ColumnDef::new(FakeReports::MaintainerName)
                            .string_len(100)
                            .null(),
                    )
                    .col(ColumnDef::new(FakeReports::FieldHeadId).integer().null())
                    .col(
                        ColumnDef::new(FakeReports::FieldHeadName)
                            .string_len(100)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FakeReports::Department)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FakeReports::VerifiedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FakeReports::AssignedAt).timestamp().null())
                    .col(ColumnDef::new(FakeReports::InProgressAt).timestamp().null())
                    .col(ColumnDef::new(FakeReports::ResolvedAt).timestamp().null())
                    .col(
                        ColumnDef::new(FakeReports::ClosureImageUrl)
                            .string_len(500)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FakeReports::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Makes re-archiving the same report a no-op.
        manager
            .create_index(
                Index::create()
                    .name("idx_fake_reports_original_report_id")
                    .table(FakeReports::Table)
                    .col(FakeReports::OriginalReportId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_fake_reports_department")
                    .table(FakeReports::Table)
                    .col(FakeReports::Department)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FakeReports::Table).to_owned())
            .await
    }
}
