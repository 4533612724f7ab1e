use axum::{
    extract::{FromRef, FromRequestParts},
    http::header,
};
use uuid::Uuid;

use crate::{
    dto::auth::TokenType, error::AppError, services::auth_service::decode_token, state::AppState,
};

/// The authenticated account, decoded from the bearer access token.
/// Handlers pass it down explicitly; nothing reads it from ambient state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Merchant ownership gate for catalog items.
///
/// `requester_merchant` is the requester's merchant id, `None` when the
/// account has no storefront yet.
pub fn ensure_merchant_owns(
    requester_merchant: Option<Uuid>,
    item_merchant: Uuid,
) -> Result<(), AppError> {
    match requester_merchant {
        None => Err(AppError::MerchantRequired),
        Some(id) if id == item_merchant => Ok(()),
        Some(_) => Err(AppError::Forbidden),
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let Some(token) = auth_str.strip_prefix("Bearer ") else {
            return Err(AppError::Unauthorized("Invalid Authorization scheme".into()));
        };

        let state = AppState::from_ref(state);
        let claims = decode_token(&state.jwt, token.trim(), TokenType::Access)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

        Ok(AuthUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_passes() {
        let merchant = Uuid::new_v4();
        assert!(ensure_merchant_owns(Some(merchant), merchant).is_ok());
    }

    #[test]
    fn other_merchant_is_forbidden() {
        let err = ensure_merchant_owns(Some(Uuid::new_v4()), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[test]
    fn no_merchant_is_distinct() {
        let err = ensure_merchant_owns(None, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::MerchantRequired));
    }
}
