use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::validation::{ValidationErrors, Validator};

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Vietnamese number, e.g. `0987654321` or `+84987654321`.
    pub phone: Option<String>,
}

/// Register payload after validation, with the phone in E.164 form.
#[derive(Debug)]
pub struct ValidRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<ValidRegistration, ValidationErrors> {
        let mut v = Validator::new();
        let username = self.username.trim().to_string();
        let email = self.email.trim().to_string();
        v.username("username", &username)
            .email("email", &email)
            .password("password", &self.password);
        let phone = v.phone("phone", self.phone.as_deref().unwrap_or_default());
        v.finish()?;
        Ok(ValidRegistration {
            username,
            email,
            password: self.password,
            phone,
        })
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessToken {
    pub access: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub token_type: TokenType,
    pub iat: usize,
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(phone: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            username: "testuser".into(),
            email: "test@example.com".into(),
            password: "testpass123".into(),
            phone: phone.map(str::to_string),
        }
    }

    #[test]
    fn phone_is_normalized() {
        let valid = request(Some("0987654321")).validate().unwrap();
        assert_eq!(valid.phone, "+84987654321");
    }

    #[test]
    fn short_phone_is_rejected() {
        let errors = request(Some("12345")).validate().unwrap_err();
        assert!(errors.has("phone", "invalid_phone"));
    }

    #[test]
    fn phone_is_optional() {
        let valid = request(None).validate().unwrap();
        assert_eq!(valid.phone, "");
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let errors = RegisterRequest {
            username: String::new(),
            email: String::new(),
            password: "short".into(),
            phone: None,
        }
        .validate()
        .unwrap_err();
        assert!(errors.has("username", "required"));
        assert!(errors.has("password", "too_short"));
    }
}
