mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;

use aromashop_api::{
    errors::ServiceError,
    services::catalog::{CreateProductInput, ProductListQuery},
    services::orders::{OrderItemInput, PlaceOrderRequest},
};

use common::TestApp;

#[tokio::test]
async fn brand_with_products_cannot_be_deleted() {
    let app = TestApp::new().await;
    let brand = app.seed_brand("Givenchy").await;
    let product = app
        .seed_product(brand.id, "L'Interdit", dec!(99.00), 3)
        .await;

    let result = app.services.catalog.delete_brand(brand.id).await;
    assert_matches!(result, Err(ServiceError::Conflict(_)));

    // Removing the product unblocks the brand
    app.services
        .catalog
        .delete_product(product.id)
        .await
        .unwrap();
    app.services.catalog.delete_brand(brand.id).await.unwrap();

    assert!(app.services.catalog.list_brands().await.unwrap().is_empty());
}

#[tokio::test]
async fn product_referenced_by_an_order_cannot_be_deleted() {
    let app = TestApp::new().await;
    let brand = app.seed_brand("Lacoste").await;
    let product = app
        .seed_product(brand.id, "Blanc", dec!(55.00), 5)
        .await;

    app.services
        .orders
        .place_order(PlaceOrderRequest {
            customer_name: "Iva".to_string(),
            customer_email: "iva@example.com".to_string(),
            phone: "+359888".to_string(),
            address: "1 Main St".to_string(),
            items: vec![OrderItemInput {
                product_id: product.id,
                quantity: 1,
            }],
            bundles: vec![],
        })
        .await
        .unwrap();

    let result = app.services.catalog.delete_product(product.id).await;
    assert_matches!(result, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_product_slug_is_a_conflict() {
    let app = TestApp::new().await;
    let brand = app.seed_brand("Nivea").await;
    app.seed_product(brand.id, "Soft Cream", dec!(5.00), 10).await;

    let result = app
        .services
        .catalog
        .create_product(CreateProductInput {
            name: "Soft  Cream".to_string(), // same slug after normalization
            brand_id: brand.id,
            description: None,
            price: dec!(6.00),
            stock: 5,
            image_url: None,
            category: None,
        })
        .await;

    assert_matches!(result, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
async fn listing_filters_by_brand_slug() {
    let app = TestApp::new().await;
    let dior = app.seed_brand("Dior").await;
    let chanel = app.seed_brand("Chanel").await;
    app.seed_product(dior.id, "Sauvage", dec!(79.00), 5).await;
    app.seed_product(chanel.id, "No 5", dec!(120.00), 5).await;

    let result = app
        .services
        .catalog
        .list_products(ProductListQuery {
            brand: Some("dior".to_string()),
            sort: None,
            page: None,
        })
        .await
        .unwrap();

    assert_eq!(result.total, 1);
    assert_eq!(result.products.len(), 1);
    assert_eq!(result.products[0].product.name, "Sauvage");
    assert_eq!(result.products[0].brand_name.as_deref(), Some("Dior"));

    // Unknown slug yields an empty page, not an error
    let empty = app
        .services
        .catalog
        .list_products(ProductListQuery {
            brand: Some("no-such-brand".to_string()),
            sort: None,
            page: None,
        })
        .await
        .unwrap();
    assert_eq!(empty.total, 0);
    assert!(empty.products.is_empty());
}

#[tokio::test]
async fn invalid_product_inputs_are_rejected() {
    let app = TestApp::new().await;
    let brand = app.seed_brand("Adidas").await;

    let negative_price = app
        .services
        .catalog
        .create_product(CreateProductInput {
            name: "Shower Gel".to_string(),
            brand_id: brand.id,
            description: None,
            price: dec!(-1.00),
            stock: 1,
            image_url: None,
            category: None,
        })
        .await;
    assert_matches!(negative_price, Err(ServiceError::ValidationError(_)));

    let unknown_brand = app
        .services
        .catalog
        .create_product(CreateProductInput {
            name: "Orphan".to_string(),
            brand_id: 999,
            description: None,
            price: dec!(5.00),
            stock: 1,
            image_url: None,
            category: None,
        })
        .await;
    assert_matches!(unknown_brand, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn csv_export_has_bom_header_and_quoting() {
    let app = TestApp::new().await;
    let brand = app.seed_brand("Acme, Inc").await;
    app.seed_product(brand.id, "Eau \"Fraiche\"", dec!(12.50), 7)
        .await;

    let csv = app.services.catalog.export_products_csv().await.unwrap();

    assert!(csv.starts_with('\u{FEFF}'));
    let mut lines = csv.trim_start_matches('\u{FEFF}').split("\r\n");
    assert_eq!(
        lines.next().unwrap(),
        "id,name,slug,brand,category,price,stock,created_at"
    );
    let row = lines.next().unwrap();
    assert!(row.contains("\"Eau \"\"Fraiche\"\"\""));
    assert!(row.contains("\"Acme, Inc\""));
    assert!(row.contains("12.5"));
}
