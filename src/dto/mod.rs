pub mod auth;
pub mod merchants;
pub mod products;
pub mod promotions;
pub mod tags;
