pub use sea_orm_migration::prelude::*;

mod m20240501_000001_create_brands_table;
mod m20240501_000002_create_products_table;
mod m20240501_000003_create_admin_users_table;
mod m20240501_000004_create_orders_table;
mod m20240501_000005_create_order_items_table;
mod m20240501_000006_create_weekly_offers_table;
mod m20240501_000007_create_weekly_offer_products_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240501_000001_create_brands_table::Migration),
            Box::new(m20240501_000002_create_products_table::Migration),
            Box::new(m20240501_000003_create_admin_users_table::Migration),
            Box::new(m20240501_000004_create_orders_table::Migration),
            Box::new(m20240501_000005_create_order_items_table::Migration),
            Box::new(m20240501_000006_create_weekly_offers_table::Migration),
            Box::new(m20240501_000007_create_weekly_offer_products_table::Migration),
        ]
    }
}
