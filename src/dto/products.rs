use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{Product, Service},
    validation::{MAX_NAME_LEN, MAX_URL_LEN, ValidationErrors, Validator},
};

/// Category, hashtag and keyword ids supplied with a catalog write.
/// Ids that do not match an existing row are dropped.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct ReferenceIds {
    pub category_ids: Option<Vec<Uuid>>,
    pub hashtag_ids: Option<Vec<Uuid>>,
    pub keyword_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = Option<String>, example = "100.00")]
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub references: ReferenceIds,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<Decimal, ValidationErrors> {
        let mut v = Validator::new();
        v.required_text("name", &self.name, MAX_NAME_LEN)
            .optional_text("image", self.image.as_deref(), MAX_URL_LEN);
        let price = required_price(&mut v, self.price);
        v.finish()?;
        Ok(price)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "100.00")]
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub references: ReferenceIds,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        optional_item_fields(&mut v, self.name.as_deref(), self.price);
        v.optional_text("image", self.image.as_deref(), MAX_URL_LEN)
            .finish()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateServiceRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = Option<String>, example = "250.00")]
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub references: ReferenceIds,
}

impl CreateServiceRequest {
    pub fn validate(&self) -> Result<Decimal, ValidationErrors> {
        let mut v = Validator::new();
        v.required_text("name", &self.name, MAX_NAME_LEN);
        let price = required_price(&mut v, self.price);
        v.finish()?;
        Ok(price)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "250.00")]
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub references: ReferenceIds,
}

impl UpdateServiceRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        optional_item_fields(&mut v, self.name.as_deref(), self.price);
        v.finish()
    }
}

fn required_price(v: &mut Validator, price: Option<Decimal>) -> Decimal {
    match price {
        Some(price) => {
            v.price("price", price);
            price
        }
        None => {
            v.add("price", "required");
            Decimal::ZERO
        }
    }
}

fn optional_item_fields(v: &mut Validator, name: Option<&str>, price: Option<Decimal>) {
    if let Some(name) = name {
        v.required_text("name", name, MAX_NAME_LEN);
    }
    if let Some(price) = price {
        v.price("price", price);
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ServiceList {
    #[schema(value_type = Vec<Service>)]
    pub items: Vec<Service>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn empty_product_reports_name_and_price() {
        let req: CreateProductRequest = serde_json::from_str("{}").unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.has("name", "required"));
        assert!(errors.has("price", "required"));
    }

    #[test]
    fn product_accepts_reference_ids() {
        let req: CreateProductRequest = serde_json::from_value(serde_json::json!({
            "name": "Test Product",
            "description": "Test Description",
            "price": "100.00",
            "category_ids": ["6f1c2a8e-3f5b-4c1d-9a7e-2b8d4e6f0a11"]
        }))
        .unwrap();
        assert_eq!(req.validate().unwrap(), Decimal::from_str("100.00").unwrap());
        assert_eq!(req.references.category_ids.as_ref().map(Vec::len), Some(1));
        assert!(req.references.hashtag_ids.is_none());
    }

    #[test]
    fn negative_service_price_is_rejected() {
        let req = CreateServiceRequest {
            name: "Haircut".into(),
            description: String::new(),
            price: Some(Decimal::from(-5)),
            is_active: None,
            references: ReferenceIds::default(),
        };
        assert!(req.validate().unwrap_err().has("price", "negative"));
    }

    #[test]
    fn update_with_blank_name_is_rejected() {
        let req = UpdateServiceRequest {
            name: Some(" ".into()),
            description: None,
            price: None,
            is_active: None,
            references: ReferenceIds::default(),
        };
        assert!(req.validate().unwrap_err().has("name", "required"));
    }
}
