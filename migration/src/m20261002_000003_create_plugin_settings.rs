use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PluginSetting::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PluginSetting::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PluginSetting::OrgId).big_integer().not_null())
                    .col(ColumnDef::new(PluginSetting::PluginId).string().not_null())
                    .col(
                        ColumnDef::new(PluginSetting::Enabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PluginSetting::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PluginSetting::UpdatedAt)
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
                    .name("idx_plugin_setting_org_plugin")
                    .table(PluginSetting::Table)
                    .col(PluginSetting::OrgId)
                    .col(PluginSetting::PluginId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PluginSetting::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PluginSetting {
    Table,
    Id,
    OrgId,
    PluginId,
    Enabled,
    CreatedAt,
    UpdatedAt,
}
