use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit,
    config::JwtConfig,
    dto::auth::{
        AccessToken, Claims, LoginRequest, RefreshRequest, RegisterRequest, TokenPair, TokenType,
    },
    entity::users::{ActiveModel, Column, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
    validation::ValidationErrors,
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let registration = payload.validate()?;

    let exist = Users::find()
        .filter(Column::Username.eq(registration.username.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(ValidationErrors::single("username", "already_taken").into());
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(registration.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();

    let now = Utc::now();
    let user = ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(registration.username),
        email: Set(registration.email),
        password_hash: Set(password_hash),
        phone: Set(registration.phone),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(user_id = %user.id, "account registered");
    audit::record(
        state,
        user.id,
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        user_from_entity(user),
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<TokenPair>> {
    let LoginRequest { username, password } = payload;
    let user = Users::find()
        .filter(Column::Username.eq(username.trim()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let now = Utc::now();
    let pair = TokenPair {
        access: issue_token(&state.jwt, user.id, TokenType::Access, now)?,
        refresh: issue_token(&state.jwt, user.id, TokenType::Refresh, now)?,
    };

    audit::record(
        state,
        user.id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success("Logged in", pair, Some(Meta::empty())))
}

pub async fn refresh_token(
    state: &AppState,
    payload: RefreshRequest,
) -> AppResult<ApiResponse<AccessToken>> {
    let claims = decode_token(&state.jwt, payload.refresh.trim(), TokenType::Refresh)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

    // The account may have been deleted since the refresh token was issued.
    if Users::find_by_id(user_id).one(&state.orm).await?.is_none() {
        return Err(AppError::Unauthorized("Account no longer exists".into()));
    }

    let access = issue_token(&state.jwt, user_id, TokenType::Access, Utc::now())?;
    Ok(ApiResponse::success(
        "Token refreshed",
        AccessToken { access },
        Some(Meta::empty()),
    ))
}

pub async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Account"))?;
    Ok(ApiResponse::success("Account", user_from_entity(account), None))
}

pub fn issue_token(
    jwt: &JwtConfig,
    user_id: Uuid,
    token_type: TokenType,
    now: DateTime<Utc>,
) -> AppResult<String> {
    let ttl = match token_type {
        TokenType::Access => Duration::minutes(jwt.access_ttl_minutes),
        TokenType::Refresh => Duration::days(jwt.refresh_ttl_days),
    };
    let expiration = now
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        token_type,
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Decodes and checks a token, rejecting tokens of the wrong type.
pub fn decode_token(jwt: &JwtConfig, token: &str, expected: TokenType) -> AppResult<Claims> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    if decoded.claims.token_type != expected {
        return Err(AppError::Unauthorized("Wrong token type".into()));
    }
    Ok(decoded.claims)
}

pub(crate) fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        phone: model.phone,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            access_ttl_minutes: 60,
            refresh_ttl_days: 1,
        }
    }

    #[test]
    fn access_token_round_trip() {
        let jwt = config();
        let user_id = Uuid::new_v4();
        let token = issue_token(&jwt, user_id, TokenType::Access, Utc::now()).unwrap();
        let claims = decode_token(&jwt, &token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let jwt = config();
        let token = issue_token(&jwt, Uuid::new_v4(), TokenType::Refresh, Utc::now()).unwrap();
        let err = decode_token(&jwt, &token, TokenType::Access).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(decode_token(&jwt, &token, TokenType::Refresh).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = config();
        let issued = Utc::now() - Duration::days(3);
        let token = issue_token(&jwt, Uuid::new_v4(), TokenType::Access, issued).unwrap();
        assert!(decode_token(&jwt, &token, TokenType::Access).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&config(), Uuid::new_v4(), TokenType::Access, Utc::now()).unwrap();
        let other = JwtConfig {
            secret: "other".into(),
            ..config()
        };
        assert!(decode_token(&other, &token, TokenType::Access).is_err());
    }
}
