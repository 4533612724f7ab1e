use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::Promotion,
    validation::{MAX_NAME_LEN, ValidationErrors, Validator},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePromotionRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = Option<String>, example = "10.00")]
    pub discount_percent: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

/// Promotion fields that passed validation.
#[derive(Debug, Clone)]
pub struct PromotionInput {
    pub name: String,
    pub description: String,
    pub discount_percent: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

impl CreatePromotionRequest {
    pub fn validate(self) -> Result<PromotionInput, ValidationErrors> {
        let mut v = Validator::new();
        v.required_text("name", &self.name, MAX_NAME_LEN);
        match self.discount_percent {
            Some(percent) => {
                v.percent("discount_percent", percent);
            }
            None => {
                v.add("discount_percent", "required");
            }
        }
        if self.start_date.is_none() {
            v.add("start_date", "required");
        }
        if self.end_date.is_none() {
            v.add("end_date", "required");
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            v.date_window("end_date", start, end);
        }
        v.finish()?;

        match (self.discount_percent, self.start_date, self.end_date) {
            (Some(discount_percent), Some(start_date), Some(end_date)) => Ok(PromotionInput {
                name: self.name,
                description: self.description,
                discount_percent,
                start_date,
                end_date,
                is_active: self.is_active.unwrap_or(true),
            }),
            _ => Err(ValidationErrors::single("discount_percent", "required")),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePromotionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "15.00")]
    pub discount_percent: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

impl UpdatePromotionRequest {
    /// Applies the patch onto the stored values and validates the result, so
    /// that moving only one end of the window is still checked against the other.
    pub fn merge_into(self, current: PromotionInput) -> Result<PromotionInput, ValidationErrors> {
        let merged = PromotionInput {
            name: self.name.unwrap_or(current.name),
            description: self.description.unwrap_or(current.description),
            discount_percent: self.discount_percent.unwrap_or(current.discount_percent),
            start_date: self.start_date.unwrap_or(current.start_date),
            end_date: self.end_date.unwrap_or(current.end_date),
            is_active: self.is_active.unwrap_or(current.is_active),
        };
        Validator::new()
            .required_text("name", &merged.name, MAX_NAME_LEN)
            .percent("discount_percent", merged.discount_percent)
            .date_window("end_date", merged.start_date, merged.end_date)
            .finish()?;
        Ok(merged)
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct PromotionList {
    #[schema(value_type = Vec<Promotion>)]
    pub items: Vec<Promotion>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create(start: DateTime<Utc>, end: DateTime<Utc>) -> CreatePromotionRequest {
        CreatePromotionRequest {
            name: "Summer Sale".into(),
            description: String::new(),
            discount_percent: Some(Decimal::from(10)),
            start_date: Some(start),
            end_date: Some(end),
            is_active: None,
        }
    }

    #[test]
    fn start_before_end_is_accepted() {
        let now = Utc::now();
        let input = create(now, now + Duration::days(7)).validate().unwrap();
        assert!(input.start_date < input.end_date);
        assert!(input.is_active);
    }

    #[test]
    fn start_not_before_end_is_rejected() {
        let now = Utc::now();
        for end in [now, now - Duration::hours(1)] {
            let errors = create(now, end).validate().unwrap_err();
            assert!(errors.has("end_date", "end_before_start"));
        }
    }

    #[test]
    fn missing_window_is_required() {
        let errors = CreatePromotionRequest {
            name: "x".into(),
            description: String::new(),
            discount_percent: None,
            start_date: None,
            end_date: None,
            is_active: None,
        }
        .validate()
        .unwrap_err();
        assert!(errors.has("discount_percent", "required"));
        assert!(errors.has("start_date", "required"));
        assert!(errors.has("end_date", "required"));
    }

    #[test]
    fn patch_is_checked_against_stored_window() {
        let now = Utc::now();
        let current = create(now, now + Duration::days(7)).validate().unwrap();
        let patch = UpdatePromotionRequest {
            name: None,
            description: None,
            discount_percent: None,
            start_date: Some(now + Duration::days(8)),
            end_date: None,
            is_active: None,
        };
        let errors = patch.merge_into(current).unwrap_err();
        assert!(errors.has("end_date", "end_before_start"));
    }
}
