use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        products::{
            CreateProductRequest, CreateServiceRequest, ProductList, ServiceList,
            UpdateProductRequest, UpdateServiceRequest,
        },
        promotions::{CreatePromotionRequest, PromotionList, UpdatePromotionRequest},
        tags::{CategoryList, CreateCategoryRequest, CreateTagRequest, HashtagList, KeywordList},
    },
    error::AppResult,
    middleware::{auth::AuthUser, json::JsonBody},
    models::{Category, Hashtag, Keyword, Product, Promotion, Service},
    response::{ApiResponse, Created, created},
    routes::params::{ItemQuery, Pagination, PromotionQuery},
    services::{
        catalog::ItemKind, product_service, promotion_service, service_service, tag_service,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/hashtags", get(list_hashtags).post(create_hashtag))
        .route("/keywords", get(list_keywords).post(create_keyword))
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/services", get(list_services).post(create_service))
        .route(
            "/services/{id}",
            get(get_service).put(update_service).delete(delete_service),
        )
        .route("/promotions", get(list_promotions).post(create_promotion))
        .route(
            "/promotions/{id}",
            get(get_promotion)
                .put(update_promotion)
                .delete(delete_promotion),
        )
        .route(
            "/promotions/{promotion_id}/add-product/{product_id}",
            put(add_product_to_promotion),
        )
        .route(
            "/promotions/{promotion_id}/add-service/{service_id}",
            put(add_service_to_promotion),
        )
}

// Taxonomy

#[utoipa::path(
    get,
    path = "/api/products/categories",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses((status = 200, description = "List categories", body = ApiResponse<CategoryList>)),
    security(("bearer_auth" = [])),
    tag = "Taxonomy"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    Ok(Json(tag_service::list_categories(&state, pagination).await?))
}

#[utoipa::path(
    post,
    path = "/api/products/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Create category", body = ApiResponse<Category>),
        (status = 400, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Taxonomy"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CreateCategoryRequest>,
) -> AppResult<Created<Category>> {
    Ok(created(tag_service::create_category(&state, &user, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/hashtags",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses((status = 200, description = "List hashtags", body = ApiResponse<HashtagList>)),
    security(("bearer_auth" = [])),
    tag = "Taxonomy"
)]
pub async fn list_hashtags(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<HashtagList>>> {
    Ok(Json(tag_service::list_hashtags(&state, pagination).await?))
}

#[utoipa::path(
    post,
    path = "/api/products/hashtags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Create hashtag", body = ApiResponse<Hashtag>),
        (status = 400, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Taxonomy"
)]
pub async fn create_hashtag(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CreateTagRequest>,
) -> AppResult<Created<Hashtag>> {
    Ok(created(tag_service::create_hashtag(&state, &user, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/keywords",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses((status = 200, description = "List keywords", body = ApiResponse<KeywordList>)),
    security(("bearer_auth" = [])),
    tag = "Taxonomy"
)]
pub async fn list_keywords(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<KeywordList>>> {
    Ok(Json(tag_service::list_keywords(&state, pagination).await?))
}

#[utoipa::path(
    post,
    path = "/api/products/keywords",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Create keyword", body = ApiResponse<Keyword>),
        (status = 400, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Taxonomy"
)]
pub async fn create_keyword(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CreateTagRequest>,
) -> AppResult<Created<Keyword>> {
    Ok(created(tag_service::create_keyword(&state, &user, payload).await?))
}

// Products

#[utoipa::path(
    get,
    path = "/api/products/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search in name or description"),
        ("min_price" = Option<String>, Query, description = "Minimum price"),
        ("max_price" = Option<String>, Query, description = "Maximum price"),
        ("is_active" = Option<bool>, Query, description = "Filter by active flag"),
        ("sort_by" = Option<String>, Query, description = "created_at | price | name"),
        ("sort_order" = Option<String>, Query, description = "asc | desc"),
    ),
    responses(
        (status = 200, description = "Products of the requester's merchant", body = ApiResponse<ProductList>),
        (status = 403, description = "Merchant required")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ItemQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Create product", body = ApiResponse<Product>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Merchant required")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CreateProductRequest>,
) -> AppResult<Created<Product>> {
    let resp = product_service::create_product(&state, &user, payload).await?;
    Ok(created(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 403, description = "Owned by another merchant"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::get_product(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/products/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Owned by another merchant"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Deleted product"),
        (status = 403, description = "Owned by another merchant"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state, &user, id).await?;
    Ok(Json(resp))
}

// Services

#[utoipa::path(
    get,
    path = "/api/products/services",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search in name or description"),
        ("min_price" = Option<String>, Query, description = "Minimum price"),
        ("max_price" = Option<String>, Query, description = "Maximum price"),
        ("is_active" = Option<bool>, Query, description = "Filter by active flag"),
        ("sort_by" = Option<String>, Query, description = "created_at | price | name"),
        ("sort_order" = Option<String>, Query, description = "asc | desc"),
    ),
    responses(
        (status = 200, description = "Services of the requester's merchant", body = ApiResponse<ServiceList>),
        (status = 403, description = "Merchant required")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn list_services(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ItemQuery>,
) -> AppResult<Json<ApiResponse<ServiceList>>> {
    let resp = service_service::list_services(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Create service", body = ApiResponse<Service>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Merchant required")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn create_service(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CreateServiceRequest>,
) -> AppResult<Created<Service>> {
    let resp = service_service::create_service(&state, &user, payload).await?;
    Ok(created(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Get service", body = ApiResponse<Service>),
        (status = 403, description = "Owned by another merchant"),
        (status = 404, description = "Service not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn get_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Service>>> {
    let resp = service_service::get_service(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/products/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Updated service", body = ApiResponse<Service>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Owned by another merchant"),
        (status = 404, description = "Service not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn update_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateServiceRequest>,
) -> AppResult<Json<ApiResponse<Service>>> {
    let resp = service_service::update_service(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Deleted service"),
        (status = 403, description = "Owned by another merchant"),
        (status = 404, description = "Service not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn delete_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = service_service::delete_service(&state, &user, id).await?;
    Ok(Json(resp))
}

// Promotions

#[utoipa::path(
    get,
    path = "/api/products/promotions",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("sort_order" = Option<String>, Query, description = "Order by start date, asc | desc"),
    ),
    responses(
        (status = 200, description = "Promotions visible to the requester's merchant", body = ApiResponse<PromotionList>),
        (status = 403, description = "Merchant required")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn list_promotions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PromotionQuery>,
) -> AppResult<Json<ApiResponse<PromotionList>>> {
    let resp =
        promotion_service::list_promotions(&state, &user, query.pagination(), query.sort_order)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/promotions",
    request_body = CreatePromotionRequest,
    responses(
        (status = 201, description = "Create promotion", body = ApiResponse<Promotion>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Merchant required")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn create_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CreatePromotionRequest>,
) -> AppResult<Created<Promotion>> {
    let resp = promotion_service::create_promotion(&state, &user, payload).await?;
    Ok(created(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/promotions/{id}",
    params(("id" = Uuid, Path, description = "Promotion ID")),
    responses(
        (status = 200, description = "Get promotion", body = ApiResponse<Promotion>),
        (status = 404, description = "Promotion not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn get_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Promotion>>> {
    let resp = promotion_service::get_promotion(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/products/promotions/{id}",
    params(("id" = Uuid, Path, description = "Promotion ID")),
    request_body = UpdatePromotionRequest,
    responses(
        (status = 200, description = "Updated promotion", body = ApiResponse<Promotion>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Created by another merchant"),
        (status = 404, description = "Promotion not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn update_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdatePromotionRequest>,
) -> AppResult<Json<ApiResponse<Promotion>>> {
    let resp = promotion_service::update_promotion(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/promotions/{id}",
    params(("id" = Uuid, Path, description = "Promotion ID")),
    responses(
        (status = 200, description = "Deleted promotion"),
        (status = 403, description = "Created by another merchant"),
        (status = 404, description = "Promotion not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn delete_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = promotion_service::delete_promotion(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/products/promotions/{promotion_id}/add-product/{product_id}",
    params(
        ("promotion_id" = Uuid, Path, description = "Promotion ID"),
        ("product_id" = Uuid, Path, description = "Product ID"),
    ),
    responses(
        (status = 200, description = "Product added to promotion"),
        (status = 400, description = "Already linked"),
        (status = 403, description = "Product owned by another merchant, or merchant required"),
        (status = 404, description = "Promotion or product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn add_product_to_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path((promotion_id, product_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp =
        promotion_service::attach_item(&state, &user, promotion_id, ItemKind::Product, product_id)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/products/promotions/{promotion_id}/add-service/{service_id}",
    params(
        ("promotion_id" = Uuid, Path, description = "Promotion ID"),
        ("service_id" = Uuid, Path, description = "Service ID"),
    ),
    responses(
        (status = 200, description = "Service added to promotion"),
        (status = 400, description = "Already linked"),
        (status = 403, description = "Service owned by another merchant, or merchant required"),
        (status = 404, description = "Promotion or service not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn add_service_to_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path((promotion_id, service_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp =
        promotion_service::attach_item(&state, &user, promotion_id, ItemKind::Service, service_id)
            .await?;
    Ok(Json(resp))
}
