// Core services
pub mod catalog;
pub mod notifications;
pub mod offers;
pub mod orders;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<catalog::CatalogService>,
    pub offers: Arc<offers::OfferService>,
    pub orders: Arc<orders::OrderService>,
    pub mailer: Arc<notifications::Mailer>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        mailer: Arc<notifications::Mailer>,
    ) -> Self {
        let catalog = Arc::new(catalog::CatalogService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let offers = Arc::new(offers::OfferService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let orders = Arc::new(orders::OrderService::new(
            db_pool,
            event_sender,
            mailer.clone(),
        ));

        Self {
            catalog,
            offers,
            orders,
            mailer,
        }
    }
}
