use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WeeklyOffers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeeklyOffers::Id)
                            .integer()
                            .primary_key()
                            .auto_increment()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WeeklyOffers::Title).string().not_null())
                    .col(ColumnDef::new(WeeklyOffers::Description).text().null())
                    .col(ColumnDef::new(WeeklyOffers::ComboPrice).decimal().not_null())
                    .col(
                        ColumnDef::new(WeeklyOffers::Stock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(WeeklyOffers::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(WeeklyOffers::StartsAt).timestamp().null())
                    .col(ColumnDef::new(WeeklyOffers::EndsAt).timestamp().null())
                    .col(ColumnDef::new(WeeklyOffers::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(WeeklyOffers::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WeeklyOffers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum WeeklyOffers {
    Table,
    Id,
    Title,
    Description,
    ComboPrice,
    Stock,
    IsActive,
    StartsAt,
    EndsAt,
    CreatedAt,
    UpdatedAt,
}
