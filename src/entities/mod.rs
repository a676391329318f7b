pub mod admin_user;
pub mod brand;
pub mod order;
pub mod order_item;
pub mod product;
pub mod weekly_offer;
pub mod weekly_offer_product;
