use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{entities, errors, handlers, services};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Aromashop API",
        description = "Storefront and back-office API: catalog, weekly bundle offers and transactional order placement"
    ),
    paths(
        handlers::orders::place_order,
        handlers::orders::list_orders,
        handlers::orders::get_order_items,
        handlers::orders::delete_order,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::get_product_by_slug,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::products::export_products,
        handlers::brands::list_brands,
        handlers::brands::create_brand,
        handlers::brands::update_brand,
        handlers::brands::delete_brand,
        handlers::offers::list_offers,
        handlers::offers::get_active_offer,
        handlers::offers::get_offer,
        handlers::offers::create_offer,
        handlers::offers::update_offer,
        handlers::offers::delete_offer,
        handlers::uploads::upload_image,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::health::health_check,
    ),
    components(schemas(
        errors::ErrorResponse,
        entities::brand::Model,
        entities::product::Model,
        entities::product::ProductCategory,
        entities::order::OrderStatus,
        entities::order_item::Model,
        entities::weekly_offer::Model,
        services::orders::PlaceOrderRequest,
        services::orders::OrderItemInput,
        services::orders::BundleInput,
        services::orders::BundleProductInput,
        services::orders::PlacedOrder,
        services::orders::OrderSummary,
        services::catalog::CreateProductInput,
        services::catalog::UpdateProductInput,
        services::catalog::ProductWithBrand,
        services::catalog::ProductListResult,
        services::offers::CreateOfferInput,
        services::offers::UpdateOfferInput,
        services::offers::OfferWithProducts,
        services::offers::OfferItem,
        handlers::brands::BrandPayload,
        handlers::auth::LoginRequest,
    )),
    tags(
        (name = "orders", description = "Order placement and admin order management"),
        (name = "products", description = "Catalog products"),
        (name = "brands", description = "Catalog brands"),
        (name = "offers", description = "Weekly bundle offers"),
        (name = "uploads", description = "Product image uploads"),
        (name = "auth", description = "Admin sessions"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at /swagger-ui, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
