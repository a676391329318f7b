//! Aromashop API Library
//!
//! This crate provides the storefront and back-office API: catalog and
//! brand management, weekly bundle offers, and transactional order
//! placement with inventory decrements.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod services;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: services::AppServices,
}

/// All /api/v1 routes, state applied by the caller.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/orders", handlers::orders::order_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/brands", handlers::brands::brand_routes())
        .nest("/offers", handlers::offers::offer_routes())
        .nest("/uploads", handlers::uploads::upload_routes())
}
