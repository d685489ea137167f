use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Movements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Movements::Owner).string().not_null())
                    .col(ColumnDef::new(Movements::Name).string().not_null())
                    .col(ColumnDef::new(Movements::Description).string().not_null())
                    .col(ColumnDef::new(Movements::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Movements::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Movements::SourceName).string().not_null())
                    .col(ColumnDef::new(Movements::SourceKind).string().not_null())
                    .col(ColumnDef::new(Movements::Category).string().not_null())
                    .col(
                        ColumnDef::new(Movements::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-owner-occurred_at")
                    .table(Movements::Table)
                    .col(Movements::Owner)
                    .col(Movements::OccurredAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Movements::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Movements {
    Table,
    Id,
    Owner,
    Name,
    Description,
    Kind,
    AmountMinor,
    SourceName,
    SourceKind,
    Category,
    OccurredAt,
}
