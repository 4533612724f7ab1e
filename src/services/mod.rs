pub mod auth_service;
pub mod catalog;
pub mod merchant_service;
pub mod product_service;
pub mod promotion_service;
pub mod service_service;
pub mod tag_service;
