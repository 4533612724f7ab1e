use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    response::{ApiResponse, Meta},
    validation::ValidationErrors,
};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Already linked")]
    AlreadyLinked,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("You need to create a merchant before performing this action")]
    MerchantRequired,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// Body rejections become field-keyed validation errors: a type error names
/// the offending top-level field, anything else is reported under `body`.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let (field, code) = match &rejection {
            JsonRejection::JsonDataError(err) => (rejected_field(&err.body_text()), "invalid_value"),
            JsonRejection::JsonSyntaxError(_) => ("body".to_string(), "invalid_json"),
            JsonRejection::MissingJsonContentType(_) => ("body".to_string(), "expected_json"),
            _ => return AppError::BadRequest(rejection.body_text()),
        };
        tracing::debug!(error = %rejection.body_text(), "json body rejected");
        AppError::Validation(ValidationErrors::single(&field, code))
    }
}

/// Top-level field from a deserialization message such as
/// `...target type: category_ids[0]: UUID parsing failed ...`.
fn rejected_field(body_text: &str) -> String {
    let detail = body_text
        .split_once("target type: ")
        .map_or(body_text, |(_, rest)| rest);
    let field = detail
        .split_once(": ")
        .map(|(path, _)| path)
        .and_then(|path| path.split(['.', '[']).next())
        .unwrap_or_default();
    if !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        field.to_string()
    } else {
        "body".to_string()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::AlreadyLinked => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden | AppError::MerchantRequired => StatusCode::FORBIDDEN,
            AppError::DbError(err) if is_unique_violation_sqlx(err) => StatusCode::BAD_REQUEST,
            AppError::OrmError(err) if is_unique_violation_orm(err) => StatusCode::BAD_REQUEST,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            AppError::MerchantRequired => Some("merchant_required"),
            AppError::AlreadyLinked => Some("already_linked"),
            AppError::Validation(_) => Some("validation_failed"),
            AppError::DbError(err) if is_unique_violation_sqlx(err) => Some("duplicate"),
            AppError::OrmError(err) if is_unique_violation_orm(err) => Some("duplicate"),
            _ => None,
        }
    }

    fn fields(&self) -> Option<BTreeMap<String, Vec<String>>> {
        match self {
            AppError::Validation(errors) => Some(errors.by_field()),
            AppError::AlreadyLinked => Some(BTreeMap::from([(
                "promotion".to_string(),
                vec!["already_linked".to_string()],
            )])),
            _ => None,
        }
    }
}

fn is_unique_violation_sqlx(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

fn is_unique_violation_orm(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<BTreeMap<String, Vec<String>>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData {
                error: message,
                code: self.code(),
                fields: self.fields(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merchant_required_is_distinct_from_forbidden() {
        assert_eq!(AppError::MerchantRequired.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::MerchantRequired.code(), Some("merchant_required"));
        assert_eq!(AppError::Forbidden.code(), None);
        assert_ne!(
            AppError::MerchantRequired.to_string(),
            AppError::Forbidden.to_string()
        );
    }

    #[test]
    fn validation_errors_are_field_keyed() {
        let err = AppError::from(ValidationErrors::single("end_date", "end_before_start"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let fields = err.fields().unwrap();
        assert_eq!(fields["end_date"], vec!["end_before_start".to_string()]);
    }

    #[test]
    fn rejected_field_names_the_top_level_key() {
        let text = "Failed to deserialize the JSON body into the target type: \
                    category_ids[0]: UUID parsing failed: invalid length at line 1 column 30";
        assert_eq!(rejected_field(text), "category_ids");
        let text = "Failed to deserialize the JSON body into the target type: \
                    price: invalid type: boolean `true`, expected a Decimal at line 1 column 14";
        assert_eq!(rejected_field(text), "price");
        let text = "Failed to deserialize the JSON body into the target type: \
                    invalid type: sequence, expected struct at line 1 column 1";
        assert_eq!(rejected_field(text), "body");
    }

    #[test]
    fn statuses() {
        assert_eq!(AppError::NotFound("Product").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::NotFound("Product").to_string(), "Product not found");
        assert_eq!(AppError::AlreadyLinked.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Unauthorized("missing token".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
