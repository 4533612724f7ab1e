use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Public view of an account. The password hash never leaves the service layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// E.164 form, empty when not provided.
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Merchant {
    pub id: Uuid,
    pub user: User,
    pub name: String,
    pub description: String,
    pub logo: Option<String>,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Hashtag {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Keyword {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Promotion {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, example = "10.00")]
    pub discount_percent: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub is_currently_active: bool,
    pub product_ids: Vec<Uuid>,
    pub service_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Promotion as embedded in a catalog item: only currently active ones are shown.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivePromotion {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = String, example = "10.00")]
    pub discount_percent: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, example = "100.00")]
    pub price: Decimal,
    pub image: Option<String>,
    pub categories: Vec<Category>,
    pub hashtags: Vec<Hashtag>,
    pub keywords: Vec<Keyword>,
    pub is_active: bool,
    pub promotions: Vec<ActivePromotion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Service {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, example = "250.00")]
    pub price: Decimal,
    pub categories: Vec<Category>,
    pub hashtags: Vec<Hashtag>,
    pub keywords: Vec<Keyword>,
    pub is_active: bool,
    pub promotions: Vec<ActivePromotion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
