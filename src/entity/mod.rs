pub mod audit_logs;
pub mod categories;
pub mod hashtags;
pub mod keywords;
pub mod merchants;
pub mod products;
pub mod promotions;
pub mod services;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use hashtags::Entity as Hashtags;
pub use keywords::Entity as Keywords;
pub use merchants::Entity as Merchants;
pub use products::Entity as Products;
pub use promotions::Entity as Promotions;
pub use services::Entity as Services;
pub use users::Entity as Users;
