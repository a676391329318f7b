use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::AdminSession,
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response, validate_input},
    AppState,
};

/// Creates the router for brand endpoints
pub fn brand_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_brands).post(create_brand))
        .route(
            "/:id",
            axum::routing::put(update_brand).delete(delete_brand),
        )
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BrandPayload {
    #[validate(length(min = 1, message = "Brand name is required"))]
    pub name: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/brands",
    responses((status = 200, description = "All brands, alphabetical")),
    tag = "brands"
)]
pub async fn list_brands(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let brands = state.services.catalog.list_brands().await?;
    Ok(success_response(brands))
}

#[utoipa::path(
    post,
    path = "/api/v1/brands",
    request_body = BrandPayload,
    responses(
        (status = 201, description = "Brand created"),
        (status = 409, description = "Duplicate brand", body = crate::errors::ErrorResponse),
    ),
    tag = "brands"
)]
pub async fn create_brand(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BrandPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let brand = state.services.catalog.create_brand(&payload.name).await?;
    Ok(created_response(brand))
}

#[utoipa::path(
    put,
    path = "/api/v1/brands/{id}",
    params(("id" = i32, Path, description = "Brand id")),
    request_body = BrandPayload,
    responses(
        (status = 200, description = "Brand updated"),
        (status = 404, description = "Brand not found", body = crate::errors::ErrorResponse),
    ),
    tag = "brands"
)]
pub async fn update_brand(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<BrandPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let brand = state
        .services
        .catalog
        .update_brand(id, &payload.name)
        .await?;
    Ok(success_response(brand))
}

/// Delete a brand (admin); blocked while products reference it.
#[utoipa::path(
    delete,
    path = "/api/v1/brands/{id}",
    params(("id" = i32, Path, description = "Brand id")),
    responses(
        (status = 204, description = "Brand deleted"),
        (status = 404, description = "Brand not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Brand still has products", body = crate::errors::ErrorResponse),
    ),
    tag = "brands"
)]
pub async fn delete_brand(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.catalog.delete_brand(id).await?;
    Ok(no_content_response())
}
