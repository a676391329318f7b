use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::{
    auth::AdminSession,
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response},
    services::orders::PlaceOrderRequest,
    AppState,
};

/// Creates the router for order endpoints
pub fn order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(place_order).get(list_orders))
        .route("/:id/items", get(get_order_items))
        .route("/:id", axum::routing::delete(delete_order))
}

/// Place an order from the storefront checkout.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = crate::services::orders::PlacedOrder),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product or offer", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let placed = state.services.orders.place_order(payload).await?;
    Ok(created_response(placed))
}

/// List all orders, newest first (admin).
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses(
        (status = 200, description = "Order summaries", body = [crate::services::orders::OrderSummary]),
        (status = 401, description = "Admin session required", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.services.orders.list_orders().await?;
    Ok(success_response(orders))
}

/// Line items of one order (admin).
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/items",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order line items"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn get_order_items(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state.services.orders.get_order_items(id).await?;
    Ok(success_response(items))
}

/// Delete an order and its line items (admin).
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.orders.delete_order(id).await?;
    Ok(no_content_response())
}
