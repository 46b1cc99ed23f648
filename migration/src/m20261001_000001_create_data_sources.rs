use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DataSource::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DataSource::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DataSource::OrgId).big_integer().not_null())
                    .col(ColumnDef::new(DataSource::Uid).string().not_null())
                    .col(ColumnDef::new(DataSource::Name).string().not_null())
                    .col(ColumnDef::new(DataSource::DsType).string().not_null())
                    .col(
                        ColumnDef::new(DataSource::Access)
                            .string_len(16)
                            .not_null()
                            .default("proxy"),
                    )
                    .col(
                        ColumnDef::new(DataSource::Url)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DataSource::Database)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DataSource::User)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DataSource::BasicAuth)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DataSource::BasicAuthUser)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DataSource::WithCredentials)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DataSource::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(DataSource::JsonData).text().null())
                    .col(
                        ColumnDef::new(DataSource::SecureJsonData)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DataSource::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(DataSource::UpdatedAt)
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
                    .name("idx_data_source_org_name")
                    .table(DataSource::Table)
                    .col(DataSource::OrgId)
                    .col(DataSource::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_data_source_org_uid")
                    .table(DataSource::Table)
                    .col(DataSource::OrgId)
                    .col(DataSource::Uid)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DataSource::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DataSource {
    Table,
    Id,
    OrgId,
    Uid,
    Name,
    DsType,
    Access,
    Url,
    Database,
    User,
    BasicAuth,
    BasicAuthUser,
    WithCredentials,
    IsDefault,
    JsonData,
    SecureJsonData,
    CreatedAt,
    UpdatedAt,
}
