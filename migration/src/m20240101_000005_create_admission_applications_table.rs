use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdmissionApplications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdmissionApplications::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AdmissionApplications::FirstName)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdmissionApplications::LastName)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdmissionApplications::Email)
                            .string_len(254)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdmissionApplications::Phone)
                            .string_len(15)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdmissionApplications::DateOfBirth)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdmissionApplications::Gender)
                            .string_len(1)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AdmissionApplications::Address).text().not_null())
                    .col(
                        ColumnDef::new(AdmissionApplications::PreviousSchool)
                            .string_len(200)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AdmissionApplications::GradeApplyingFor)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdmissionApplications::ParentName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdmissionApplications::ParentPhone)
                            .string_len(15)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdmissionApplications::ParentEmail)
                            .string_len(254)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdmissionApplications::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admission_applications_grade")
                    .table(AdmissionApplications::Table)
                    .col(AdmissionApplications::GradeApplyingFor)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdmissionApplications::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AdmissionApplications {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    Phone,
    DateOfBirth,
    Gender,
    Address,
    PreviousSchool,
    GradeApplyingFor,
    ParentName,
    ParentPhone,
    ParentEmail,
    CreatedAt,
}
