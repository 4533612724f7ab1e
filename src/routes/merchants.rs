use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::merchants::{CreateMerchantRequest, MerchantList, UpdateMerchantRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::JsonBody},
    models::Merchant,
    response::{ApiResponse, Created, created},
    routes::params::Pagination,
    services::merchant_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_merchants))
        .route("/create", post(create_merchant))
        .route(
            "/{id}",
            get(get_merchant).put(update_merchant).delete(delete_merchant),
        )
}

#[utoipa::path(
    get,
    path = "/api/merchants",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "List merchants", body = ApiResponse<MerchantList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Merchants"
)]
pub async fn list_merchants(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<MerchantList>>> {
    let resp = merchant_service::list_merchants(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/merchants/create",
    request_body = CreateMerchantRequest,
    responses(
        (status = 201, description = "Create merchant", body = ApiResponse<Merchant>),
        (status = 400, description = "Validation failed or merchant already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchants"
)]
pub async fn create_merchant(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CreateMerchantRequest>,
) -> AppResult<Created<Merchant>> {
    let resp = merchant_service::create_merchant(&state, &user, payload).await?;
    Ok(created(resp))
}

#[utoipa::path(
    get,
    path = "/api/merchants/{id}",
    params(("id" = Uuid, Path, description = "Merchant ID")),
    responses(
        (status = 200, description = "Get merchant", body = ApiResponse<Merchant>),
        (status = 404, description = "Merchant not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchants"
)]
pub async fn get_merchant(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Merchant>>> {
    let resp = merchant_service::get_merchant(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/merchants/{id}",
    params(("id" = Uuid, Path, description = "Merchant ID")),
    request_body = UpdateMerchantRequest,
    responses(
        (status = 200, description = "Updated merchant", body = ApiResponse<Merchant>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Merchant not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchants"
)]
pub async fn update_merchant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateMerchantRequest>,
) -> AppResult<Json<ApiResponse<Merchant>>> {
    let resp = merchant_service::update_merchant(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/merchants/{id}",
    params(("id" = Uuid, Path, description = "Merchant ID")),
    responses(
        (status = 200, description = "Deleted merchant"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Merchant not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchants"
)]
pub async fn delete_merchant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = merchant_service::delete_merchant(&state, &user, id).await?;
    Ok(Json(resp))
}
