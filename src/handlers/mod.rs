pub mod auth;
pub mod brands;
pub mod common;
pub mod health;
pub mod offers;
pub mod orders;
pub mod products;
pub mod uploads;
