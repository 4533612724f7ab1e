use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use uuid::Uuid;

use crate::dto::products::{CreateProductRequest, ProductList, UpdateProductRequest};
use crate::{
    audit,
    entity::products::{ActiveModel, Entity as Products, Model as ProductModel},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::ItemQuery,
    services::catalog::{self, ItemExtras, ItemKind},
    services::merchant_service,
    state::AppState,
    validation::blank_as_none,
};

pub async fn list_products(
    state: &AppState,
    user: &AuthUser,
    query: ItemQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let page = catalog::list_items::<Products>(state, user, &query).await?;
    let items = page
        .rows
        .into_iter()
        .map(|(model, extras)| product_from_entity(model, extras))
        .collect();
    Ok(ApiResponse::success("Products", ProductList { items }, Some(page.meta)))
}

pub async fn get_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    let product = find_owned(state, user, id).await?;
    let data = with_extras(state, product).await?;
    Ok(ApiResponse::success("Product", data, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let merchant = merchant_service::require_for_user(&state.orm, user).await?;
    let price = payload.validate()?;

    let now = Utc::now();
    let txn = state.orm.begin().await?;
    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        merchant_id: Set(merchant.id),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        price: Set(price),
        image: Set(blank_as_none(payload.image)),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    catalog::replace_references(&txn, ItemKind::Product, product.id, &payload.references).await?;
    txn.commit().await?;

    tracing::info!(product_id = %product.id, merchant_id = %merchant.id, "product created");
    audit::record(
        state,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let data = with_extras(state, product).await?;
    Ok(ApiResponse::success("Product created", data, Some(Meta::empty())))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = find_owned(state, user, id).await?;
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(image) = payload.image {
        active.image = Set(blank_as_none(Some(image)));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&txn).await?;
    catalog::replace_references(&txn, ItemKind::Product, product.id, &payload.references).await?;
    txn.commit().await?;

    audit::record(
        state,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let data = with_extras(state, product).await?;
    Ok(ApiResponse::success("Updated", data, Some(Meta::empty())))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    catalog::delete_owned::<Products>(state, user, id).await?;
    audit::record(
        state,
        user.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}

async fn find_owned(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ProductModel> {
    catalog::find_owned::<Products>(state, user, id).await
}

async fn with_extras(state: &AppState, product: ProductModel) -> AppResult<Product> {
    let (product, extras) = catalog::with_extras(state, product).await?;
    Ok(product_from_entity(product, extras))
}

fn product_from_entity(model: ProductModel, extras: ItemExtras) -> Product {
    Product {
        id: model.id,
        merchant_id: model.merchant_id,
        name: model.name,
        description: model.description,
        price: model.price,
        image: model.image,
        categories: extras.categories,
        hashtags: extras.hashtags,
        keywords: extras.keywords,
        is_active: model.is_active,
        promotions: extras.promotions,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
