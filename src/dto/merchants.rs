use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::Merchant,
    validation::{MAX_NAME_LEN, MAX_URL_LEN, ValidationErrors, Validator},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMerchantRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub logo: Option<String>,
    #[serde(default)]
    pub address: String,
}

impl CreateMerchantRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required_text("name", &self.name, MAX_NAME_LEN)
            .required_text("address", &self.address, usize::MAX)
            .optional_text("logo", self.logo.as_deref(), MAX_URL_LEN)
            .finish()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMerchantRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub address: Option<String>,
}

impl UpdateMerchantRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.required_text("name", name, MAX_NAME_LEN);
        }
        if let Some(address) = &self.address {
            v.required_text("address", address, usize::MAX);
        }
        v.optional_text("logo", self.logo.as_deref(), MAX_URL_LEN)
            .finish()
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct MerchantList {
    #[schema(value_type = Vec<Merchant>)]
    pub items: Vec<Merchant>,
}
