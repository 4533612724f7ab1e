use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::auth::{AccessToken, LoginRequest, RefreshRequest, RegisterRequest, TokenPair},
    error::AppResult,
    middleware::{auth::AuthUser, json::JsonBody},
    models::User,
    response::{ApiResponse, Created, created},
    services::auth_service::{current_user, login_user, refresh_token, register_user},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/token/refresh", post(refresh))
        .route("/me", get(me))
}

#[utoipa::path(
    post,
    path = "/api/accounts/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register account", body = ApiResponse<User>),
        (status = 400, description = "Validation failed")
    ),
    security(()),
    tag = "Accounts"
)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> AppResult<Created<User>> {
    let resp = register_user(&state, payload).await?;
    Ok(created(resp))
}

#[utoipa::path(
    post,
    path = "/api/accounts/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access and refresh tokens", body = ApiResponse<TokenPair>),
        (status = 401, description = "Invalid credentials")
    ),
    security(()),
    tag = "Accounts"
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let resp = login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/accounts/token/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = ApiResponse<AccessToken>),
        (status = 401, description = "Invalid or expired refresh token")
    ),
    security(()),
    tag = "Accounts"
)]
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> AppResult<Json<ApiResponse<AccessToken>>> {
    let resp = refresh_token(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/accounts/me",
    responses(
        (status = 200, description = "Authenticated account", body = ApiResponse<User>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = current_user(&state, &user).await?;
    Ok(Json(resp))
}
