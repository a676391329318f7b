use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::{
    auth::AdminSession,
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response},
    services::offers::{CreateOfferInput, UpdateOfferInput},
    AppState,
};

/// Creates the router for weekly offer endpoints
pub fn offer_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_offers).post(create_offer))
        .route("/active", get(get_active_offer))
        .route(
            "/:id",
            get(get_offer).put(update_offer).delete(delete_offer),
        )
}

/// All offers, newest first (admin).
#[utoipa::path(
    get,
    path = "/api/v1/offers",
    responses((status = 200, description = "All weekly offers")),
    tag = "offers"
)]
pub async fn list_offers(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let offers = state.services.offers.list_offers().await?;
    Ok(success_response(offers))
}

/// The single active offer with its products, for the storefront.
/// Returns null when no offer is active.
#[utoipa::path(
    get,
    path = "/api/v1/offers/active",
    responses((status = 200, description = "Active offer or null")),
    tag = "offers"
)]
pub async fn get_active_offer(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let offer = state.services.offers.active_offer().await?;
    Ok(success_response(offer))
}

#[utoipa::path(
    get,
    path = "/api/v1/offers/{id}",
    params(("id" = i32, Path, description = "Offer id")),
    responses(
        (status = 200, description = "Offer with products", body = crate::services::offers::OfferWithProducts),
        (status = 404, description = "Offer not found", body = crate::errors::ErrorResponse),
    ),
    tag = "offers"
)]
pub async fn get_offer(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let offer = state.services.offers.get_offer(id).await?;
    Ok(success_response(offer))
}

/// Create an offer (admin). Activating it deactivates all others.
#[utoipa::path(
    post,
    path = "/api/v1/offers",
    request_body = CreateOfferInput,
    responses(
        (status = 201, description = "Offer created", body = crate::services::offers::OfferWithProducts),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
    ),
    tag = "offers"
)]
pub async fn create_offer(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOfferInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let offer = state.services.offers.create_offer(payload).await?;
    Ok(created_response(offer))
}

#[utoipa::path(
    put,
    path = "/api/v1/offers/{id}",
    params(("id" = i32, Path, description = "Offer id")),
    request_body = UpdateOfferInput,
    responses(
        (status = 200, description = "Offer updated", body = crate::services::offers::OfferWithProducts),
        (status = 404, description = "Offer not found", body = crate::errors::ErrorResponse),
    ),
    tag = "offers"
)]
pub async fn update_offer(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateOfferInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let offer = state.services.offers.update_offer(id, payload).await?;
    Ok(success_response(offer))
}

#[utoipa::path(
    delete,
    path = "/api/v1/offers/{id}",
    params(("id" = i32, Path, description = "Offer id")),
    responses(
        (status = 204, description = "Offer deleted"),
        (status = 404, description = "Offer not found", body = crate::errors::ErrorResponse),
    ),
    tag = "offers"
)]
pub async fn delete_offer(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.offers.delete_offer(id).await?;
    Ok(no_content_response())
}
