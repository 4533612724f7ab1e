//! Field-level validation.
//!
//! Each entity builds a [`Validator`], runs the checks it needs, and calls
//! [`Validator::finish`]. Every failed check is recorded as a
//! `(field, code)` pair so the client receives all problems at once.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::phone;

/// Entity names: product, service, merchant, promotion.
pub const MAX_NAME_LEN: usize = 255;

/// Category, hashtag and keyword names.
pub const MAX_TAG_NAME_LEN: usize = 100;

pub const MAX_USERNAME_LEN: usize = 150;

pub const MAX_EMAIL_LEN: usize = 254;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// Image and logo references.
pub const MAX_URL_LEN: usize = 2048;

/// `NUMERIC(10, 2)` leaves eight integer digits.
const MAX_PRICE_DIGITS: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field: &str, code: &str) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.to_string(),
                code: code.to_string(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn has(&self, field: &str, code: &str) -> bool {
        self.errors
            .iter()
            .any(|e| e.field == field && e.code == code)
    }

    /// Field-keyed view used in error responses.
    pub fn by_field(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for err in &self.errors {
            map.entry(err.field.clone())
                .or_default()
                .push(err.code.clone());
        }
        map
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.code))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, code: &str) -> &mut Self {
        self.errors.errors.push(FieldError {
            field: field.to_string(),
            code: code.to_string(),
        });
        self
    }

    pub fn required_text(&mut self, field: &str, value: &str, max_len: usize) -> &mut Self {
        if value.trim().is_empty() {
            return self.add(field, "required");
        }
        self.max_len(field, value, max_len)
    }

    pub fn max_len(&mut self, field: &str, value: &str, max_len: usize) -> &mut Self {
        if value.chars().count() > max_len {
            self.add(field, "too_long");
        }
        self
    }

    pub fn optional_text(&mut self, field: &str, value: Option<&str>, max_len: usize) -> &mut Self {
        if let Some(v) = value {
            self.max_len(field, v, max_len);
        }
        self
    }

    /// Non-negative, at most two decimal places, fits `NUMERIC(10, 2)`.
    pub fn price(&mut self, field: &str, value: Decimal) -> &mut Self {
        if value.is_sign_negative() && !value.is_zero() {
            return self.add(field, "negative");
        }
        if value.normalize().scale() > 2 {
            return self.add(field, "too_many_decimal_places");
        }
        if value.trunc() >= Decimal::from(10_u64.pow(MAX_PRICE_DIGITS)) {
            self.add(field, "too_large");
        }
        self
    }

    pub fn percent(&mut self, field: &str, value: Decimal) -> &mut Self {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return self.add(field, "out_of_range");
        }
        if value.normalize().scale() > 2 {
            self.add(field, "too_many_decimal_places");
        }
        self
    }

    /// Reports on `end_field` when the window is empty or inverted.
    pub fn date_window(
        &mut self,
        end_field: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> &mut Self {
        if start >= end {
            self.add(end_field, "end_before_start");
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            return self;
        }
        if value.chars().count() > MAX_EMAIL_LEN || !looks_like_email(value) {
            self.add(field, "invalid_email");
        }
        self
    }

    pub fn username(&mut self, field: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            return self.add(field, "required");
        }
        if value.chars().count() > MAX_USERNAME_LEN {
            return self.add(field, "too_long");
        }
        let allowed = value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
        if !allowed {
            self.add(field, "invalid_username");
        }
        self
    }

    pub fn password(&mut self, field: &str, value: &str) -> &mut Self {
        let len = value.chars().count();
        if len < MIN_PASSWORD_LEN {
            self.add(field, "too_short");
        } else if len > MAX_PASSWORD_LEN {
            self.add(field, "too_long");
        }
        self
    }

    /// Validates and normalizes a phone number, returning the E.164 form.
    /// Empty input is allowed and yields an empty string.
    pub fn phone(&mut self, field: &str, value: &str) -> String {
        if value.trim().is_empty() {
            return String::new();
        }
        match phone::normalize_vn(value) {
            Some(normalized) => normalized,
            None => {
                self.add(field, "invalid_phone");
                String::new()
            }
        }
    }

    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}

/// Optional URL-ish fields (logos, images): an empty string means "none".
pub fn blank_as_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn looks_like_email(value: &str) -> bool {
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}
