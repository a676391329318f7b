use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::{
    db::DbPool,
    entities::brand::{self, Entity as BrandEntity},
    entities::order_item::{self, Entity as OrderItemEntity},
    entities::product::{self, Entity as ProductEntity, ProductCategory},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Storefront page size for product listings
pub const PAGE_SIZE: u64 = 24;

/// Derives a URL slug from a display name: lowercase ASCII alphanumerics
/// joined by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductWithBrand {
    #[serde(flatten)]
    pub product: product::Model,
    pub brand_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    /// Filter by brand slug
    pub brand: Option<String>,
    /// Sort direction over brand name: "asc" (default) or "desc"
    pub sort: Option<String>,
    pub page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResult {
    pub products: Vec<ProductWithBrand>,
    pub total: u64,
    pub page: u64,
    pub page_count: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductInput {
    pub name: String,
    pub brand_id: i32,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    pub category: Option<ProductCategory>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub brand_id: Option<i32>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    /// Absolute stock level set by the admin form
    pub stock: Option<i32>,
    pub image_url: Option<String>,
    pub category: Option<ProductCategory>,
}

/// Read and admin CRUD operations over products and brands. No
/// cross-entity invariants live here beyond referential guards; stock is
/// only ever decremented by the order service.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Lists products with brand names, optional brand filter, brand-name
    /// sort direction and pagination.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: ProductListQuery,
    ) -> Result<ProductListResult, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let sort = match query.sort.as_deref() {
            Some("desc") => Order::Desc,
            _ => Order::Asc,
        };

        let mut find = ProductEntity::find().find_also_related(BrandEntity);

        if let Some(brand_slug) = &query.brand {
            let brand_row = BrandEntity::find()
                .filter(brand::Column::Slug.eq(brand_slug))
                .one(&*self.db)
                .await?;

            match brand_row {
                Some(b) => find = find.filter(product::Column::BrandId.eq(b.id)),
                // Unknown brand slug filters everything out rather than erroring
                None => {
                    return Ok(ProductListResult {
                        products: Vec::new(),
                        total: 0,
                        page,
                        page_count: 0,
                    })
                }
            }
        }

        let paginator = find
            .order_by(brand::Column::Name, sort)
            .order_by_asc(product::Column::Name)
            .paginate(&*self.db, PAGE_SIZE);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page - 1).await?;

        let products = rows
            .into_iter()
            .map(|(product, brand)| ProductWithBrand {
                product,
                brand_name: brand.map(|b| b.name),
            })
            .collect();

        Ok(ProductListResult {
            products,
            total,
            page,
            page_count: total.div_ceil(PAGE_SIZE),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: i32) -> Result<ProductWithBrand, ServiceError> {
        let row = ProductEntity::find_by_id(product_id)
            .find_also_related(BrandEntity)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        Ok(ProductWithBrand {
            product: row.0,
            brand_name: row.1.map(|b| b.name),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<ProductWithBrand, ServiceError> {
        let row = ProductEntity::find()
            .filter(product::Column::Slug.eq(slug))
            .find_also_related(BrandEntity)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product \"{}\" not found", slug)))?;

        Ok(ProductWithBrand {
            product: row.0,
            brand_name: row.1.map(|b| b.name),
        })
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Product name is required".to_string(),
            ));
        }
        if input.price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price must be positive".to_string(),
            ));
        }
        if input.stock < 0 {
            return Err(ServiceError::ValidationError(
                "Stock cannot be negative".to_string(),
            ));
        }

        BrandEntity::find_by_id(input.brand_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Brand {} does not exist", input.brand_id))
            })?;

        let slug = slugify(&input.name);
        self.ensure_unique_product_slug(&slug, None).await?;

        let model = product::ActiveModel {
            brand_id: Set(input.brand_id),
            name: Set(input.name.trim().to_string()),
            slug: Set(slug),
            description: Set(input.description),
            price: Set(input.price),
            stock: Set(input.stock),
            image_url: Set(input.image_url),
            category: Set(input.category.unwrap_or(ProductCategory::Parfum)),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(created.id))
            .await;

        info!(product_id = created.id, "Product created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: i32,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let existing = ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let mut active: product::ActiveModel = existing.into();

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Product name is required".to_string(),
                ));
            }
            let slug = slugify(&name);
            self.ensure_unique_product_slug(&slug, Some(product_id))
                .await?;
            active.name = Set(name.trim().to_string());
            active.slug = Set(slug);
        }
        if let Some(brand_id) = input.brand_id {
            BrandEntity::find_by_id(brand_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!("Brand {} does not exist", brand_id))
                })?;
            active.brand_id = Set(brand_id);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = input.price {
            if price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Price must be positive".to_string(),
                ));
            }
            active.price = Set(price);
        }
        if let Some(stock) = input.stock {
            if stock < 0 {
                return Err(ServiceError::ValidationError(
                    "Stock cannot be negative".to_string(),
                ));
            }
            active.stock = Set(stock);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        info!(product_id, "Product updated");
        Ok(updated)
    }

    /// Deletes a product unless historical order lines reference it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: i32) -> Result<(), ServiceError> {
        let existing = ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let referencing_orders = OrderItemEntity::find()
            .filter(order_item::Column::ProductId.eq(product_id))
            .count(&*self.db)
            .await?;
        if referencing_orders > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product \"{}\" is referenced by existing orders",
                existing.name
            )));
        }

        let active: product::ActiveModel = existing.into();
        active.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;

        info!(product_id, "Product deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_brands(&self) -> Result<Vec<brand::Model>, ServiceError> {
        BrandEntity::find()
            .order_by_asc(brand::Column::Name)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn create_brand(&self, name: &str) -> Result<brand::Model, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Brand name is required".to_string(),
            ));
        }

        let slug = slugify(name);
        let duplicate = BrandEntity::find()
            .filter(
                brand::Column::Name
                    .eq(name)
                    .or(brand::Column::Slug.eq(&slug)),
            )
            .one(&*self.db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Brand \"{}\" already exists",
                name
            )));
        }

        let created = brand::ActiveModel {
            name: Set(name.to_string()),
            slug: Set(slug),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::BrandCreated(created.id))
            .await;

        info!(brand_id = created.id, "Brand created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_brand(
        &self,
        brand_id: i32,
        name: &str,
    ) -> Result<brand::Model, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Brand name is required".to_string(),
            ));
        }

        let existing = BrandEntity::find_by_id(brand_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand {} not found", brand_id)))?;

        let slug = slugify(name);
        let duplicate = BrandEntity::find()
            .filter(brand::Column::Id.ne(brand_id))
            .filter(
                brand::Column::Name
                    .eq(name)
                    .or(brand::Column::Slug.eq(&slug)),
            )
            .one(&*self.db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Brand \"{}\" already exists",
                name
            )));
        }

        let mut active: brand::ActiveModel = existing.into();
        active.name = Set(name.to_string());
        active.slug = Set(slug);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::BrandUpdated(brand_id))
            .await;

        Ok(updated)
    }

    /// Deletes a brand unless products still reference it.
    #[instrument(skip(self))]
    pub async fn delete_brand(&self, brand_id: i32) -> Result<(), ServiceError> {
        let existing = BrandEntity::find_by_id(brand_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand {} not found", brand_id)))?;

        let referencing = ProductEntity::find()
            .filter(product::Column::BrandId.eq(brand_id))
            .count(&*self.db)
            .await?;
        if referencing > 0 {
            return Err(ServiceError::Conflict(format!(
                "Brand \"{}\" still has {} products",
                existing.name, referencing
            )));
        }

        let active: brand::ActiveModel = existing.into();
        active.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::BrandDeleted(brand_id))
            .await;

        info!(brand_id, "Brand deleted");
        Ok(())
    }

    /// Renders the whole catalog as CSV for the admin export download.
    #[instrument(skip(self))]
    pub async fn export_products_csv(&self) -> Result<String, ServiceError> {
        let rows = ProductEntity::find()
            .find_also_related(BrandEntity)
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?;

        let header = [
            "id", "name", "slug", "brand", "category", "price", "stock", "created_at",
        ];
        let mut lines = Vec::with_capacity(rows.len() + 1);
        lines.push(header.join(","));

        for (product, brand) in rows {
            let fields = [
                product.id.to_string(),
                product.name,
                product.slug,
                brand.map(|b| b.name).unwrap_or_default(),
                match product.category {
                    ProductCategory::Parfum => "parfum".to_string(),
                    ProductCategory::Cosmetic => "cosmetic".to_string(),
                },
                product.price.to_string(),
                product.stock.to_string(),
                product.created_at.to_rfc3339(),
            ];
            lines.push(
                fields
                    .iter()
                    .map(|f| escape_csv_field(f))
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }

        // BOM so spreadsheet tools detect UTF-8
        Ok(format!("\u{FEFF}{}", lines.join("\r\n")))
    }

    async fn ensure_unique_product_slug(
        &self,
        slug: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        let mut find = ProductEntity::find().filter(product::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            find = find.filter(product::Column::Id.ne(id));
        }

        if find.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "A product with slug \"{}\" already exists",
                slug
            )));
        }
        Ok(())
    }
}

fn escape_csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation_and_case() {
        assert_eq!(slugify("Rose Noir"), "rose-noir");
        assert_eq!(slugify("  L'Eau   d'Été!  "), "l-eau-d-t");
        assert_eq!(slugify("No.5"), "no-5");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn csv_fields_are_quoted_only_when_needed() {
        assert_eq!(escape_csv_field("plain"), "plain");
        assert_eq!(escape_csv_field("a,b"), "\"a,b\"");
        assert_eq!(escape_csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv_field("two\nlines"), "\"two\nlines\"");
    }
}
