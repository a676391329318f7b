use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::order::{self, Entity as OrderEntity, OrderStatus},
    entities::order_item::{self, Entity as OrderItemEntity},
    entities::product::{self, Entity as ProductEntity},
    entities::weekly_offer::{self, Entity as WeeklyOfferEntity},
    entities::weekly_offer_product::{self, Entity as WeeklyOfferProductEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::notifications::{ConfirmationLine, Mailer},
};

/// One plain cart line in a checkout request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemInput {
    pub product_id: i32,
    pub quantity: i32,
}

/// Client echo of a bundle constituent. Accepted for wire compatibility
/// with the storefront cart; the server re-reads every name, price and
/// gift flag from the offer rows.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BundleProductInput {
    pub product_id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default)]
    pub is_gift: bool,
}

/// One bundle selection in a checkout request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BundleInput {
    pub offer_id: i32,
    pub quantity: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub combo_price: Decimal,
    #[serde(default)]
    pub products: Vec<BundleProductInput>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PlaceOrderRequest {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    #[validate(email(message = "A valid customer email is required"))]
    pub customer_email: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Delivery address is required"))]
    pub address: String,
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub bundles: Vec<BundleInput>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlacedOrder {
    pub order_id: i32,
    pub total_amount: Decimal,
}

/// Order summary for admin listings; line items are fetched separately.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderSummary {
    pub id: i32,
    pub customer_name: String,
    pub customer_email: String,
    pub address: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Price/name snapshot accumulated during validation, written verbatim as
/// an order line on commit.
struct LineSnapshot {
    product_id: i32,
    product_name: String,
    unit_price: Decimal,
    quantity: i32,
}

/// Pending stock decrement (product or offer row), applied only after
/// every line has validated.
struct StockDecrement {
    id: i32,
    quantity: i32,
}

/// The order placement engine. `place_order` is the only code path that
/// creates orders or decrements stock, and it does both inside a single
/// database transaction.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    mailer: Arc<Mailer>,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, mailer: Arc<Mailer>) -> Self {
        Self {
            db,
            event_sender,
            mailer,
        }
    }

    /// Places an order: validates every line against current stock,
    /// snapshots names and prices, writes the order with its lines and
    /// decrements inventory, all-or-nothing. The confirmation email is
    /// dispatched after commit and never affects the result.
    #[instrument(skip(self, request), fields(email = %request.customer_email))]
    pub async fn place_order(
        &self,
        request: PlaceOrderRequest,
    ) -> Result<PlacedOrder, ServiceError> {
        request.validate()?;

        if request.items.is_empty() && request.bundles.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order must contain at least one item or bundle".to_string(),
            ));
        }
        if request
            .items
            .iter()
            .map(|i| i.quantity)
            .chain(request.bundles.iter().map(|b| b.quantity))
            .any(|q| q <= 0)
        {
            return Err(ServiceError::ValidationError(
                "Quantities must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let mut total = Decimal::ZERO;
        let mut snapshots: Vec<LineSnapshot> = Vec::new();
        let mut product_decrements: Vec<StockDecrement> = Vec::new();
        let mut offer_decrements: Vec<StockDecrement> = Vec::new();

        for item in &request.items {
            let product = ProductEntity::find_by_id(item.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;

            if product.stock < item.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "Insufficient stock for \"{}\"",
                    product.name
                )));
            }

            total += product.price * Decimal::from(item.quantity);
            snapshots.push(LineSnapshot {
                product_id: product.id,
                product_name: product.name,
                unit_price: product.price,
                quantity: item.quantity,
            });
            product_decrements.push(StockDecrement {
                id: item.product_id,
                quantity: item.quantity,
            });
        }

        for bundle in &request.bundles {
            let offer = WeeklyOfferEntity::find_by_id(bundle.offer_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Offer {} not found", bundle.offer_id))
                })?;

            if offer.stock < bundle.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "Insufficient stock for \"{}\"",
                    offer.title
                )));
            }

            let constituents = WeeklyOfferProductEntity::find()
                .filter(weekly_offer_product::Column::OfferId.eq(offer.id))
                .order_by_asc(weekly_offer_product::Column::Id)
                .all(&txn)
                .await?;
            if constituents.is_empty() {
                return Err(ServiceError::ValidationError(format!(
                    "Offer \"{}\" has no products",
                    offer.title
                )));
            }

            // A bundle consumes `quantity` units of every constituent,
            // the gift included.
            for row in &constituents {
                let product = ProductEntity::find_by_id(row.product_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Product {} not found", row.product_id))
                    })?;

                if product.stock < bundle.quantity {
                    return Err(ServiceError::InsufficientStock(format!(
                        "Insufficient stock for \"{}\"",
                        offer.title
                    )));
                }

                product_decrements.push(StockDecrement {
                    id: row.product_id,
                    quantity: bundle.quantity,
                });
            }

            total += offer.combo_price * Decimal::from(bundle.quantity);
            snapshots.push(LineSnapshot {
                product_id: representative_product_id(&constituents),
                product_name: format!("Bundle: {}", offer.title),
                unit_price: offer.combo_price,
                quantity: bundle.quantity,
            });
            offer_decrements.push(StockDecrement {
                id: offer.id,
                quantity: bundle.quantity,
            });
        }

        let placed = order::ActiveModel {
            customer_name: Set(request.customer_name.clone()),
            customer_email: Set(request.customer_email.clone()),
            phone: Set(request.phone.clone()),
            address: Set(request.address.clone()),
            total_amount: Set(total),
            status: Set(OrderStatus::Confirmed),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for snapshot in &snapshots {
            order_item::ActiveModel {
                order_id: Set(placed.id),
                product_id: Set(snapshot.product_id),
                product_name: Set(snapshot.product_name.clone()),
                unit_price: Set(snapshot.unit_price),
                quantity: Set(snapshot.quantity),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        for dec in &product_decrements {
            ProductEntity::update_many()
                .col_expr(
                    product::Column::Stock,
                    Expr::col(product::Column::Stock).sub(dec.quantity),
                )
                .filter(product::Column::Id.eq(dec.id))
                .exec(&txn)
                .await?;
        }
        for dec in &offer_decrements {
            WeeklyOfferEntity::update_many()
                .col_expr(
                    weekly_offer::Column::Stock,
                    Expr::col(weekly_offer::Column::Stock).sub(dec.quantity),
                )
                .filter(weekly_offer::Column::Id.eq(dec.id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;

        info!(
            order_id = placed.id,
            %total,
            lines = snapshots.len(),
            "Order placed"
        );

        self.event_sender
            .send_or_log(Event::OrderPlaced {
                order_id: placed.id,
                total_amount: total,
                line_count: snapshots.len(),
            })
            .await;

        self.dispatch_confirmation(&request, placed.id, &snapshots, total);

        Ok(PlacedOrder {
            order_id: placed.id,
            total_amount: total,
        })
    }

    /// Fire-and-forget confirmation email. The placed order is already
    /// committed; delivery failure is logged and dropped.
    fn dispatch_confirmation(
        &self,
        request: &PlaceOrderRequest,
        order_id: i32,
        snapshots: &[LineSnapshot],
        total: Decimal,
    ) {
        let mailer = Arc::clone(&self.mailer);
        let to = request.customer_email.clone();
        let customer_name = request.customer_name.clone();
        let address = request.address.clone();
        let lines: Vec<ConfirmationLine> = snapshots
            .iter()
            .map(|s| ConfirmationLine {
                product_name: s.product_name.clone(),
                unit_price: s.unit_price,
                quantity: s.quantity,
            })
            .collect();

        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_order_confirmation(&to, &customer_name, order_id, &lines, total, &address)
                .await
            {
                warn!(error = %e, order_id, "Order confirmation email failed");
            }
        });
    }

    /// All orders, newest first, summary fields only.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderSummary>, ServiceError> {
        let orders = OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(orders
            .into_iter()
            .map(|o| OrderSummary {
                id: o.id,
                customer_name: o.customer_name,
                customer_email: o.customer_email,
                address: o.address,
                total_amount: o.total_amount,
                status: o.status,
                created_at: o.created_at,
            })
            .collect())
    }

    /// Line items for one order, keyed by order id.
    #[instrument(skip(self))]
    pub async fn get_order_items(
        &self,
        order_id: i32,
    ) -> Result<Vec<order_item::Model>, ServiceError> {
        OrderEntity::find_by_id(order_id)
            .select_only()
            .column(order::Column::Id)
            .into_tuple::<i32>()
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::Id)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Deletes an order; its line items cascade.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: i32) -> Result<(), ServiceError> {
        let existing = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let active: order::ActiveModel = existing.into();
        active.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderDeleted(order_id))
            .await;

        info!(order_id, "Order deleted");
        Ok(())
    }
}

/// The order line for a bundle references the first non-gift constituent,
/// falling back to the first row when every constituent is marked gift.
fn representative_product_id(constituents: &[weekly_offer_product::Model]) -> i32 {
    constituents
        .iter()
        .find(|row| !row.is_gift)
        .unwrap_or(&constituents[0])
        .product_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseConnection;
    use tokio::sync::mpsc;

    fn service() -> OrderService {
        let (tx, _rx) = mpsc::channel(8);
        OrderService::new(
            Arc::new(DatabaseConnection::Disconnected),
            Arc::new(EventSender::new(tx)),
            Arc::new(Mailer::new(None, "Shop <noreply@example.com>".to_string())),
        )
    }

    fn valid_contact() -> PlaceOrderRequest {
        PlaceOrderRequest {
            customer_name: "Iva Ivanova".to_string(),
            customer_email: "iva@example.com".to_string(),
            phone: "+359888888888".to_string(),
            address: "1 Main St, Sofia".to_string(),
            items: vec![],
            bundles: vec![],
        }
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_before_touching_the_store() {
        // Disconnected db: reaching the transaction would error differently
        let result = service().place_order(valid_contact()).await;
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn missing_contact_fields_are_rejected() {
        let mut request = valid_contact();
        request.customer_name = String::new();
        request.items = vec![OrderItemInput {
            product_id: 1,
            quantity: 1,
        }];

        let result = service().place_order(request).await;
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn non_positive_quantities_are_rejected() {
        let mut request = valid_contact();
        request.items = vec![OrderItemInput {
            product_id: 1,
            quantity: 0,
        }];

        let result = service().place_order(request).await;
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn bundle_line_prefers_the_first_non_gift_constituent() {
        let rows = vec![
            weekly_offer_product::Model {
                id: 1,
                offer_id: 1,
                product_id: 10,
                is_gift: true,
            },
            weekly_offer_product::Model {
                id: 2,
                offer_id: 1,
                product_id: 20,
                is_gift: false,
            },
        ];
        assert_eq!(representative_product_id(&rows), 20);
    }

    #[test]
    fn all_gift_bundle_falls_back_to_the_first_constituent() {
        let rows = vec![
            weekly_offer_product::Model {
                id: 1,
                offer_id: 1,
                product_id: 10,
                is_gift: true,
            },
            weekly_offer_product::Model {
                id: 2,
                offer_id: 1,
                product_id: 20,
                is_gift: true,
            },
        ];
        assert_eq!(representative_product_id(&rows), 10);
    }
}
