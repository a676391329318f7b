mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use aromashop_api::{
    entities::{
        order::Entity as OrderEntity,
        order_item::{self, Entity as OrderItemEntity},
        product::Entity as ProductEntity,
        weekly_offer::Entity as WeeklyOfferEntity,
    },
    errors::ServiceError,
    services::catalog::UpdateProductInput,
    services::orders::{BundleInput, OrderItemInput, PlaceOrderRequest},
};

use common::TestApp;

fn checkout(items: Vec<OrderItemInput>, bundles: Vec<BundleInput>) -> PlaceOrderRequest {
    PlaceOrderRequest {
        customer_name: "Iva Ivanova".to_string(),
        customer_email: "iva@example.com".to_string(),
        phone: "+359888888888".to_string(),
        address: "1 Vitosha Blvd, Sofia".to_string(),
        items,
        bundles,
    }
}

fn bundle(offer_id: i32, quantity: i32) -> BundleInput {
    BundleInput {
        offer_id,
        quantity,
        title: String::new(),
        combo_price: dec!(0),
        products: Vec::new(),
    }
}

async fn table_counts(app: &TestApp) -> (u64, u64) {
    let orders = OrderEntity::find().count(&*app.db).await.unwrap();
    let items = OrderItemEntity::find().count(&*app.db).await.unwrap();
    (orders, items)
}

#[tokio::test]
async fn order_for_exact_stock_succeeds_and_zeroes_stock() {
    let app = TestApp::new().await;
    let brand = app.seed_brand("Lancome").await;
    let product = app
        .seed_product(brand.id, "La Vie Est Belle", dec!(10.00), 5)
        .await;

    let placed = app
        .services
        .orders
        .place_order(checkout(
            vec![OrderItemInput {
                product_id: product.id,
                quantity: 5,
            }],
            vec![],
        ))
        .await
        .expect("order should succeed");

    assert_eq!(placed.total_amount, dec!(50.00));

    let stored = ProductEntity::find_by_id(product.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.stock, 0);

    let order = OrderEntity::find_by_id(placed.order_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.total_amount, dec!(50.00));

    // One more unit is an oversell and must change nothing
    let result = app
        .services
        .orders
        .place_order(checkout(
            vec![OrderItemInput {
                product_id: product.id,
                quantity: 1,
            }],
            vec![],
        ))
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

    let stored = ProductEntity::find_by_id(product.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.stock, 0);
    assert_eq!(table_counts(&app).await.0, 1);
}

#[tokio::test]
async fn total_equals_sum_of_line_snapshots() {
    let app = TestApp::new().await;
    let brand = app.seed_brand("Dior").await;
    let a = app.seed_product(brand.id, "Sauvage", dec!(79.90), 10).await;
    let b = app.seed_product(brand.id, "Homme", dec!(45.50), 10).await;

    let placed = app
        .services
        .orders
        .place_order(checkout(
            vec![
                OrderItemInput {
                    product_id: a.id,
                    quantity: 2,
                },
                OrderItemInput {
                    product_id: b.id,
                    quantity: 3,
                },
            ],
            vec![],
        ))
        .await
        .unwrap();

    let items = OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(placed.order_id))
        .all(&*app.db)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);

    let recomputed: rust_decimal::Decimal = items
        .iter()
        .map(|i| i.unit_price * rust_decimal::Decimal::from(i.quantity))
        .sum();
    assert_eq!(placed.total_amount, recomputed);
    assert_eq!(placed.total_amount, dec!(296.30));
}

#[tokio::test]
async fn any_failing_line_rolls_back_the_whole_order() {
    let app = TestApp::new().await;
    let brand = app.seed_brand("Chanel").await;
    let a = app.seed_product(brand.id, "No 5", dec!(120.00), 5).await;
    let b = app.seed_product(brand.id, "Chance", dec!(90.00), 1).await;

    let result = app
        .services
        .orders
        .place_order(checkout(
            vec![
                OrderItemInput {
                    product_id: a.id,
                    quantity: 2,
                },
                OrderItemInput {
                    product_id: b.id,
                    quantity: 2,
                },
            ],
            vec![],
        ))
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientStock(msg)) if msg.contains("Chance"));

    assert_eq!(table_counts(&app).await, (0, 0));
    let a_after = ProductEntity::find_by_id(a.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    let b_after = ProductEntity::find_by_id(b.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a_after.stock, 5);
    assert_eq!(b_after.stock, 1);
}

#[tokio::test]
async fn unknown_product_fails_with_not_found_and_no_rows() {
    let app = TestApp::new().await;

    let result = app
        .services
        .orders
        .place_order(checkout(
            vec![OrderItemInput {
                product_id: 9999,
                quantity: 1,
            }],
            vec![],
        ))
        .await;

    assert_matches!(result, Err(ServiceError::NotFound(_)));
    assert_eq!(table_counts(&app).await, (0, 0));
}

#[tokio::test]
async fn empty_cart_is_a_validation_error_with_no_rows() {
    let app = TestApp::new().await;

    let result = app.services.orders.place_order(checkout(vec![], vec![])).await;

    assert_matches!(result, Err(ServiceError::ValidationError(_)));
    assert_eq!(table_counts(&app).await, (0, 0));
}

#[tokio::test]
async fn bundle_order_decrements_offer_and_every_constituent() {
    let app = TestApp::new().await;
    let brand = app.seed_brand("Bvlgari").await;
    let paid = app.seed_product(brand.id, "Omnia", dec!(15.00), 10).await;
    let gift = app.seed_product(brand.id, "Mini Omnia", dec!(5.00), 10).await;

    let offer = app
        .seed_offer(
            "Spring Set",
            dec!(30.00),
            2,
            vec![paid.id],
            gift.id,
            true,
        )
        .await;

    let placed = app
        .services
        .orders
        .place_order(checkout(vec![], vec![bundle(offer.offer.id, 2)]))
        .await
        .expect("bundle order should succeed");

    assert_eq!(placed.total_amount, dec!(60.00));

    let items = OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(placed.order_id))
        .all(&*app.db)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_name, "Bundle: Spring Set");
    assert_eq!(items[0].unit_price, dec!(30.00));
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].product_id, paid.id);

    let offer_after = WeeklyOfferEntity::find_by_id(offer.offer.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(offer_after.stock, 0);

    let paid_after = ProductEntity::find_by_id(paid.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    let gift_after = ProductEntity::find_by_id(gift.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(paid_after.stock, 8);
    assert_eq!(gift_after.stock, 8);
}

#[tokio::test]
async fn bundle_oversell_names_the_offer_and_mutates_nothing() {
    let app = TestApp::new().await;
    let brand = app.seed_brand("Versace").await;
    let paid = app.seed_product(brand.id, "Eros", dec!(60.00), 10).await;
    let gift = app.seed_product(brand.id, "Mini Eros", dec!(10.00), 1).await;

    let offer = app
        .seed_offer("Duo", dec!(65.00), 5, vec![paid.id], gift.id, true)
        .await;

    // Gift stock (1) cannot cover two bundles
    let result = app
        .services
        .orders
        .place_order(checkout(vec![], vec![bundle(offer.offer.id, 2)]))
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientStock(msg)) if msg.contains("Duo"));

    assert_eq!(table_counts(&app).await, (0, 0));
    let offer_after = WeeklyOfferEntity::find_by_id(offer.offer.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(offer_after.stock, 5);
}

#[tokio::test]
async fn unknown_offer_fails_with_not_found() {
    let app = TestApp::new().await;

    let result = app
        .services
        .orders
        .place_order(checkout(vec![], vec![bundle(4242, 1)]))
        .await;

    assert_matches!(result, Err(ServiceError::NotFound(msg)) if msg.contains("4242"));
    assert_eq!(table_counts(&app).await, (0, 0));
}

#[tokio::test]
async fn mixed_cart_accumulates_items_and_bundles() {
    let app = TestApp::new().await;
    let brand = app.seed_brand("Armani").await;
    let single = app.seed_product(brand.id, "Si", dec!(99.00), 3).await;
    let paid = app.seed_product(brand.id, "Code", dec!(80.00), 5).await;
    let gift = app.seed_product(brand.id, "Mini Code", dec!(15.00), 5).await;

    let offer = app
        .seed_offer("Code Set", dec!(85.00), 5, vec![paid.id], gift.id, true)
        .await;

    let placed = app
        .services
        .orders
        .place_order(checkout(
            vec![OrderItemInput {
                product_id: single.id,
                quantity: 1,
            }],
            vec![bundle(offer.offer.id, 1)],
        ))
        .await
        .unwrap();

    // 99.00 + 85.00
    assert_eq!(placed.total_amount, dec!(184.00));
    assert_eq!(table_counts(&app).await, (1, 2));
}

#[tokio::test]
async fn snapshots_survive_later_product_edits() {
    let app = TestApp::new().await;
    let brand = app.seed_brand("Hermes").await;
    let product = app
        .seed_product(brand.id, "Terre d'Hermes", dec!(110.00), 4)
        .await;

    let placed = app
        .services
        .orders
        .place_order(checkout(
            vec![OrderItemInput {
                product_id: product.id,
                quantity: 1,
            }],
            vec![],
        ))
        .await
        .unwrap();

    app.services
        .catalog
        .update_product(
            product.id,
            UpdateProductInput {
                name: Some("Renamed".to_string()),
                price: Some(dec!(999.99)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let items = OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(placed.order_id))
        .all(&*app.db)
        .await
        .unwrap();
    assert_eq!(items[0].product_name, "Terre d'Hermes");
    assert_eq!(items[0].unit_price, dec!(110.00));

    let order = OrderEntity::find_by_id(placed.order_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.total_amount, dec!(110.00));
}

#[tokio::test]
async fn order_listing_and_deletion_cascade() {
    let app = TestApp::new().await;
    let brand = app.seed_brand("Gucci").await;
    let product = app.seed_product(brand.id, "Bloom", dec!(70.00), 9).await;

    let placed = app
        .services
        .orders
        .place_order(checkout(
            vec![OrderItemInput {
                product_id: product.id,
                quantity: 2,
            }],
            vec![],
        ))
        .await
        .unwrap();

    let orders = app.services.orders.list_orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, placed.order_id);
    assert_eq!(orders[0].total_amount, dec!(140.00));

    let items = app
        .services
        .orders
        .get_order_items(placed.order_id)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);

    app.services
        .orders
        .delete_order(placed.order_id)
        .await
        .unwrap();
    assert_eq!(table_counts(&app).await, (0, 0));

    let result = app.services.orders.delete_order(placed.order_id).await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}
