pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240101_000002_create_user_sessions_table;
mod m20240101_000003_create_auth_tables;
mod m20240101_000004_create_notices_table;
mod m20240101_000005_create_admission_applications_table;
mod m20240101_000006_seed_content_types_and_permissions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_user_sessions_table::Migration),
            Box::new(m20240101_000003_create_auth_tables::Migration),
            Box::new(m20240101_000004_create_notices_table::Migration),
            Box::new(m20240101_000005_create_admission_applications_table::Migration),
            Box::new(m20240101_000006_seed_content_types_and_permissions::Migration),
        ]
    }
}
