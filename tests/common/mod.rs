use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tokio::sync::mpsc;

use aromashop_api::{
    db::{self, DbConfig},
    entities::{brand, product},
    events::EventSender,
    services::{
        catalog::CreateProductInput,
        notifications::Mailer,
        offers::{CreateOfferInput, OfferWithProducts},
        AppServices,
    },
};

/// Test harness over an in-memory SQLite database with the real
/// migrations applied. One pooled connection, so every query sees the
/// same memory database.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = db::establish_connection_with_config(&DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(5),
        })
        .await
        .expect("connect to in-memory sqlite");

        db::run_migrations(&pool).await.expect("run migrations");

        let (tx, mut rx) = mpsc::channel(64);
        tokio::spawn(async move { while rx.recv().await.is_some() {} });

        let db = Arc::new(pool);
        let mailer = Arc::new(Mailer::new(None, "Shop <noreply@example.com>".to_string()));
        let services = AppServices::new(db.clone(), Arc::new(EventSender::new(tx)), mailer);

        Self { db, services }
    }

    pub async fn seed_brand(&self, name: &str) -> brand::Model {
        self.services
            .catalog
            .create_brand(name)
            .await
            .expect("seed brand")
    }

    pub async fn seed_product(
        &self,
        brand_id: i32,
        name: &str,
        price: Decimal,
        stock: i32,
    ) -> product::Model {
        self.services
            .catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                brand_id,
                description: None,
                price,
                stock,
                image_url: None,
                category: None,
            })
            .await
            .expect("seed product")
    }

    pub async fn seed_offer(
        &self,
        title: &str,
        combo_price: Decimal,
        stock: i32,
        combo_product_ids: Vec<i32>,
        gift_product_id: i32,
        is_active: bool,
    ) -> OfferWithProducts {
        self.services
            .offers
            .create_offer(CreateOfferInput {
                title: title.to_string(),
                description: None,
                combo_price,
                stock,
                is_active,
                starts_at: None,
                ends_at: None,
                product_ids: combo_product_ids,
                gift_product_id,
            })
            .await
            .expect("seed offer")
    }
}
