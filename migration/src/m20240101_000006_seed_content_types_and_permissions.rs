use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (app_label, model, 展示名称, 额外的自定义权限)
const CONTENT_TYPES: &[(&str, &str, &str, &[(&str, &str)])] = &[
    ("accounts", "user", "user", &[]),
    ("auth", "group", "group", &[]),
    ("auth", "permission", "permission", &[]),
    (
        "public",
        "notice",
        "notice",
        &[("can_manage_notices", "Can manage notices")],
    ),
    (
        "public",
        "admissionapplication",
        "admission application",
        &[("can_manage_admissions", "Can manage admission applications")],
    ),
];

const DEFAULT_ACTIONS: [&str; 4] = ["view", "add", "change", "delete"];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (app_label, model, name, custom) in CONTENT_TYPES {
            manager
                .exec_stmt(
                    Query::insert()
                        .into_table(ContentTypes::Table)
                        .columns([ContentTypes::AppLabel, ContentTypes::Model, ContentTypes::Name])
                        .values_panic([(*app_label).into(), (*model).into(), (*name).into()])
                        .to_owned(),
                )
                .await?;

            let mut permissions: Vec<(String, String)> = DEFAULT_ACTIONS
                .iter()
                .map(|action| (format!("{action}_{model}"), format!("Can {action} {name}")))
                .collect();
            permissions.extend(
                custom
                    .iter()
                    .map(|(codename, label)| ((*codename).to_string(), (*label).to_string())),
            );

            for (codename, label) in permissions {
                let select = Query::select()
                    .expr(Expr::val(codename))
                    .expr(Expr::val(label))
                    .column(ContentTypes::Id)
                    .from(ContentTypes::Table)
                    .and_where(Expr::col(ContentTypes::AppLabel).eq(*app_label))
                    .and_where(Expr::col(ContentTypes::Model).eq(*model))
                    .to_owned();

                let insert = Query::insert()
                    .into_table(Permissions::Table)
                    .columns([
                        Permissions::Codename,
                        Permissions::Name,
                        Permissions::ContentTypeId,
                    ])
                    .select_from(select)
                    .map_err(|e| DbErr::Migration(e.to_string()))?
                    .to_owned();

                manager.exec_stmt(insert).await?;
            }
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 权限随内容类型级联删除
        manager
            .exec_stmt(Query::delete().from_table(Permissions::Table).to_owned())
            .await?;
        manager
            .exec_stmt(Query::delete().from_table(ContentTypes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ContentTypes {
    Table,
    Id,
    AppLabel,
    Model,
    Name,
}

#[derive(DeriveIden)]
enum Permissions {
    Table,
    Codename,
    Name,
    ContentTypeId,
}
