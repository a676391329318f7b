use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::{
    auth::AdminSession,
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response},
    services::catalog::{CreateProductInput, ProductListQuery, UpdateProductInput},
    AppState,
};

/// Creates the router for product endpoints
pub fn product_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/export", get(export_products))
        .route("/slug/:slug", get(get_product_by_slug))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// Storefront product listing: brand filter, sort, pagination.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(
        ("brand" = Option<String>, Query, description = "Brand slug filter"),
        ("sort" = Option<String>, Query, description = "Brand name sort: asc or desc"),
        ("page" = Option<u64>, Query, description = "1-based page"),
    ),
    responses(
        (status = 200, description = "Paginated products", body = crate::services::catalog::ProductListResult),
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.services.catalog.list_products(query).await?;
    Ok(success_response(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with brand name", body = crate::services::catalog::ProductWithBrand),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.catalog.get_product(id).await?;
    Ok(success_response(product))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/slug/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product with brand name", body = crate::services::catalog::ProductWithBrand),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn get_product_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.catalog.get_product_by_slug(&slug).await?;
    Ok(success_response(product))
}

/// Create a product (admin).
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate slug", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn create_product(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.catalog.create_product(payload).await?;
    Ok(created_response(product))
}

/// Update a product (admin). Stock is an absolute set here.
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = UpdateProductInput,
    responses(
        (status = 200, description = "Product updated"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn update_product(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.catalog.update_product(id, payload).await?;
    Ok(success_response(product))
}

/// Delete a product (admin); blocked while historical orders reference it.
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product referenced by orders", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn delete_product(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.catalog.delete_product(id).await?;
    Ok(no_content_response())
}

/// Download the catalog as CSV (admin).
#[utoipa::path(
    get,
    path = "/api/v1/products/export",
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv"),
        (status = 401, description = "Admin session required", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn export_products(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let csv = state.services.catalog.export_products_csv().await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"products.csv\"",
            ),
        ],
        csv,
    ))
}
