use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DataSourcePermission::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DataSourcePermission::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DataSourcePermission::DataSourceId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DataSourcePermission::UserId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DataSourcePermission::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dsp_datasource")
                            .from(
                                DataSourcePermission::Table,
                                DataSourcePermission::DataSourceId,
                            )
                            .to(DataSource::Table, DataSource::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_dsp_unique")
                    .table(DataSourcePermission::Table)
                    .col(DataSourcePermission::DataSourceId)
                    .col(DataSourcePermission::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DataSourcePermission::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DataSourcePermission {
    Table,
    Id,
    DataSourceId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum DataSource {
    Table,
    Id,
}
