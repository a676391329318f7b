use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::{
    db::DbPool,
    entities::brand::Entity as BrandEntity,
    entities::product::{self, Entity as ProductEntity},
    entities::weekly_offer::{self, Entity as WeeklyOfferEntity},
    entities::weekly_offer_product::{self, Entity as WeeklyOfferProductEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// One constituent product of an offer, denormalized for display.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OfferItem {
    pub product_id: i32,
    pub name: String,
    pub unit_price: Decimal,
    pub image_url: Option<String>,
    pub brand_name: Option<String>,
    pub is_gift: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OfferWithProducts {
    #[serde(flatten)]
    pub offer: weekly_offer::Model,
    pub items: Vec<OfferItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOfferInput {
    pub title: String,
    pub description: Option<String>,
    pub combo_price: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// Paid combo products; the gift is listed separately
    pub product_ids: Vec<i32>,
    pub gift_product_id: i32,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOfferInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub combo_price: Option<Decimal>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// When present, replaces the constituent rows together with
    /// `gift_product_id`
    pub product_ids: Option<Vec<i32>>,
    pub gift_product_id: Option<i32>,
}

/// Weekly bundle offers: CRUD plus the exclusive-activation invariant.
/// At most one offer is active; activating one deactivates the rest in
/// the same transaction.
#[derive(Clone)]
pub struct OfferService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl OfferService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_offers(&self) -> Result<Vec<weekly_offer::Model>, ServiceError> {
        WeeklyOfferEntity::find()
            .order_by_desc(weekly_offer::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_offer(&self, offer_id: i32) -> Result<OfferWithProducts, ServiceError> {
        let offer = WeeklyOfferEntity::find_by_id(offer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Offer {} not found", offer_id)))?;

        let items = self.load_items(&offer).await?;
        Ok(OfferWithProducts { offer, items })
    }

    /// The single active offer for the storefront, if any.
    #[instrument(skip(self))]
    pub async fn active_offer(&self) -> Result<Option<OfferWithProducts>, ServiceError> {
        let offer = WeeklyOfferEntity::find()
            .filter(weekly_offer::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?;

        match offer {
            Some(offer) => {
                let items = self.load_items(&offer).await?;
                Ok(Some(OfferWithProducts { offer, items }))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_offer(
        &self,
        input: CreateOfferInput,
    ) -> Result<OfferWithProducts, ServiceError> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Offer title is required".to_string(),
            ));
        }
        if input.combo_price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Combo price must be positive".to_string(),
            ));
        }
        if input.stock < 0 {
            return Err(ServiceError::ValidationError(
                "Stock cannot be negative".to_string(),
            ));
        }
        if input.product_ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "An offer needs at least one combo product".to_string(),
            ));
        }

        let combo_ids: Vec<i32> = input
            .product_ids
            .iter()
            .copied()
            .filter(|id| *id != input.gift_product_id)
            .collect();
        if combo_ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "The gift product cannot be the only combo product".to_string(),
            ));
        }

        let mut referenced = combo_ids.clone();
        referenced.push(input.gift_product_id);
        self.ensure_products_exist(&*self.db, &referenced).await?;

        let txn = self.db.begin().await?;

        let deactivated = if input.is_active {
            deactivate_all_offers(&txn, None).await?
        } else {
            Vec::new()
        };

        let offer = weekly_offer::ActiveModel {
            title: Set(input.title.trim().to_string()),
            description: Set(input.description),
            combo_price: Set(input.combo_price),
            stock: Set(input.stock),
            is_active: Set(input.is_active),
            starts_at: Set(input.starts_at),
            ends_at: Set(input.ends_at),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        insert_offer_products(&txn, offer.id, &combo_ids, input.gift_product_id).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OfferCreated(offer.id))
            .await;
        if offer.is_active {
            self.event_sender
                .send_or_log(Event::OfferActivated {
                    offer_id: offer.id,
                    deactivated,
                })
                .await;
        }

        info!(offer_id = offer.id, "Weekly offer created");
        self.get_offer(offer.id).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_offer(
        &self,
        offer_id: i32,
        input: UpdateOfferInput,
    ) -> Result<OfferWithProducts, ServiceError> {
        let existing = WeeklyOfferEntity::find_by_id(offer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Offer {} not found", offer_id)))?;

        // Replacing constituents needs both lists to know which is the gift
        let replacement = match (&input.product_ids, &input.gift_product_id) {
            (Some(ids), Some(gift)) => {
                let combo_ids: Vec<i32> =
                    ids.iter().copied().filter(|id| *id != *gift).collect();
                if combo_ids.is_empty() {
                    return Err(ServiceError::ValidationError(
                        "An offer needs at least one combo product".to_string(),
                    ));
                }
                let mut referenced = combo_ids.clone();
                referenced.push(*gift);
                self.ensure_products_exist(&*self.db, &referenced).await?;
                Some((combo_ids, *gift))
            }
            (None, None) => None,
            _ => {
                return Err(ServiceError::ValidationError(
                    "product_ids and gift_product_id must be provided together".to_string(),
                ))
            }
        };

        let activating = input.is_active == Some(true) && !existing.is_active;

        let txn = self.db.begin().await?;

        let deactivated = if activating {
            deactivate_all_offers(&txn, Some(offer_id)).await?
        } else {
            Vec::new()
        };

        let mut active: weekly_offer::ActiveModel = existing.into();
        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Offer title is required".to_string(),
                ));
            }
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(combo_price) = input.combo_price {
            if combo_price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Combo price must be positive".to_string(),
                ));
            }
            active.combo_price = Set(combo_price);
        }
        if let Some(stock) = input.stock {
            if stock < 0 {
                return Err(ServiceError::ValidationError(
                    "Stock cannot be negative".to_string(),
                ));
            }
            active.stock = Set(stock);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if input.starts_at.is_some() {
            active.starts_at = Set(input.starts_at);
        }
        if input.ends_at.is_some() {
            active.ends_at = Set(input.ends_at);
        }

        active.update(&txn).await?;

        if let Some((combo_ids, gift_id)) = replacement {
            WeeklyOfferProductEntity::delete_many()
                .filter(weekly_offer_product::Column::OfferId.eq(offer_id))
                .exec(&txn)
                .await?;
            insert_offer_products(&txn, offer_id, &combo_ids, gift_id).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OfferUpdated(offer_id))
            .await;
        if activating {
            self.event_sender
                .send_or_log(Event::OfferActivated {
                    offer_id,
                    deactivated,
                })
                .await;
        }

        info!(offer_id, "Weekly offer updated");
        self.get_offer(offer_id).await
    }

    /// Deletes an offer; its constituent rows cascade.
    #[instrument(skip(self))]
    pub async fn delete_offer(&self, offer_id: i32) -> Result<(), ServiceError> {
        let existing = WeeklyOfferEntity::find_by_id(offer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Offer {} not found", offer_id)))?;

        let active: weekly_offer::ActiveModel = existing.into();
        active.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OfferDeleted(offer_id))
            .await;

        info!(offer_id, "Weekly offer deleted");
        Ok(())
    }

    async fn load_items(
        &self,
        offer: &weekly_offer::Model,
    ) -> Result<Vec<OfferItem>, ServiceError> {
        let rows = WeeklyOfferProductEntity::find()
            .filter(weekly_offer_product::Column::OfferId.eq(offer.id))
            .order_by_asc(weekly_offer_product::Column::Id)
            .all(&*self.db)
            .await?;

        let product_ids: Vec<i32> = rows.iter().map(|r| r.product_id).collect();
        let products: HashMap<i32, (product::Model, Option<String>)> = ProductEntity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .find_also_related(BrandEntity)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|(p, b)| (p.id, (p, b.map(|b| b.name))))
            .collect();

        let items = rows
            .into_iter()
            .filter_map(|row| {
                products.get(&row.product_id).map(|(product, brand_name)| OfferItem {
                    product_id: product.id,
                    name: product.name.clone(),
                    unit_price: product.price,
                    image_url: product.image_url.clone(),
                    brand_name: brand_name.clone(),
                    is_gift: row.is_gift,
                })
            })
            .collect();

        Ok(items)
    }

    async fn ensure_products_exist<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_ids: &[i32],
    ) -> Result<(), ServiceError> {
        let mut unique = product_ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let found = ProductEntity::find()
            .filter(product::Column::Id.is_in(unique.clone()))
            .all(conn)
            .await?;

        if found.len() != unique.len() {
            return Err(ServiceError::ValidationError(
                "Offer references a product that does not exist".to_string(),
            ));
        }
        Ok(())
    }
}

/// Clears `is_active` on every offer except `keep`, returning the ids that
/// were flipped.
async fn deactivate_all_offers<C: ConnectionTrait>(
    conn: &C,
    keep: Option<i32>,
) -> Result<Vec<i32>, ServiceError> {
    let mut find = WeeklyOfferEntity::find().filter(weekly_offer::Column::IsActive.eq(true));
    if let Some(keep_id) = keep {
        find = find.filter(weekly_offer::Column::Id.ne(keep_id));
    }
    let currently_active = find.all(conn).await?;

    let mut deactivated = Vec::with_capacity(currently_active.len());
    for offer in currently_active {
        let id = offer.id;
        let mut active: weekly_offer::ActiveModel = offer.into();
        active.is_active = Set(false);
        active.update(conn).await?;
        deactivated.push(id);
    }

    Ok(deactivated)
}

async fn insert_offer_products<C: ConnectionTrait>(
    conn: &C,
    offer_id: i32,
    combo_ids: &[i32],
    gift_product_id: i32,
) -> Result<(), ServiceError> {
    for product_id in combo_ids {
        weekly_offer_product::ActiveModel {
            offer_id: Set(offer_id),
            product_id: Set(*product_id),
            is_gift: Set(false),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }

    weekly_offer_product::ActiveModel {
        offer_id: Set(offer_id),
        product_id: Set(gift_product_id),
        is_gift: Set(true),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(())
}
