use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::{Category, Hashtag, Keyword},
    validation::{MAX_TAG_NAME_LEN, ValidationErrors, Validator},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CreateCategoryRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required_text("name", &self.name, MAX_TAG_NAME_LEN)
            .finish()
    }
}

/// Shared payload for hashtags and keywords.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTagRequest {
    #[serde(default)]
    pub name: String,
}

impl CreateTagRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required_text("name", &self.name, MAX_TAG_NAME_LEN)
            .finish()
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct HashtagList {
    #[schema(value_type = Vec<Hashtag>)]
    pub items: Vec<Hashtag>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct KeywordList {
    #[schema(value_type = Vec<Keyword>)]
    pub items: Vec<Keyword>,
}
