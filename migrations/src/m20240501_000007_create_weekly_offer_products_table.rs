use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WeeklyOfferProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeeklyOfferProducts::Id)
                            .integer()
                            .primary_key()
                            .auto_increment()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyOfferProducts::OfferId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyOfferProducts::ProductId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyOfferProducts::IsGift)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_weekly_offer_products_offer_id")
                            .from(WeeklyOfferProducts::Table, WeeklyOfferProducts::OfferId)
                            .to(
                                super::m20240501_000006_create_weekly_offers_table::WeeklyOffers::Table,
                                super::m20240501_000006_create_weekly_offers_table::WeeklyOffers::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_weekly_offer_products_product_id")
                            .from(WeeklyOfferProducts::Table, WeeklyOfferProducts::ProductId)
                            .to(
                                super::m20240501_000002_create_products_table::Products::Table,
                                super::m20240501_000002_create_products_table::Products::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_weekly_offer_products_offer_id")
                    .table(WeeklyOfferProducts::Table)
                    .col(WeeklyOfferProducts::OfferId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WeeklyOfferProducts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum WeeklyOfferProducts {
    Table,
    Id,
    OfferId,
    ProductId,
    IsGift,
}
