use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sources::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sources::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sources::Owner).string().not_null())
                    .col(ColumnDef::new(Sources::Name).string().not_null())
                    .col(ColumnDef::new(Sources::Kind).string().not_null())
                    .col(ColumnDef::new(Sources::LastDigits).string())
                    .col(
                        ColumnDef::new(Sources::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Sources::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // One ledger record per (owner, name, kind); the ensure-source
        // upsert and the balance increment both key on this triple.
        manager
            .create_index(
                Index::create()
                    .name("idx-sources-owner-name-kind-unique")
                    .table(Sources::Table)
                    .col(Sources::Owner)
                    .col(Sources::Name)
                    .col(Sources::Kind)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sources::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Sources {
    Table,
    Id,
    Owner,
    Name,
    Kind,
    LastDigits,
    BalanceMinor,
    CreatedAt,
}
