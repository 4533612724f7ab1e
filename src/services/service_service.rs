use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use uuid::Uuid;

use crate::dto::products::{CreateServiceRequest, ServiceList, UpdateServiceRequest};
use crate::{
    audit,
    entity::services::{ActiveModel, Entity as Services, Model as ServiceModel},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Service,
    response::{ApiResponse, Meta},
    routes::params::ItemQuery,
    services::catalog::{self, ItemExtras, ItemKind},
    services::merchant_service,
    state::AppState,
};

pub async fn list_services(
    state: &AppState,
    user: &AuthUser,
    query: ItemQuery,
) -> AppResult<ApiResponse<ServiceList>> {
    let page = catalog::list_items::<Services>(state, user, &query).await?;
    let items = page
        .rows
        .into_iter()
        .map(|(model, extras)| service_from_entity(model, extras))
        .collect();
    Ok(ApiResponse::success("Services", ServiceList { items }, Some(page.meta)))
}

pub async fn get_service(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Service>> {
    let service = find_owned(state, user, id).await?;
    let data = with_extras(state, service).await?;
    Ok(ApiResponse::success("Service", data, None))
}

pub async fn create_service(
    state: &AppState,
    user: &AuthUser,
    payload: CreateServiceRequest,
) -> AppResult<ApiResponse<Service>> {
    let merchant = merchant_service::require_for_user(&state.orm, user).await?;
    let price = payload.validate()?;

    let now = Utc::now();
    let txn = state.orm.begin().await?;
    let service = ActiveModel {
        id: Set(Uuid::new_v4()),
        merchant_id: Set(merchant.id),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        price: Set(price),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    catalog::replace_references(&txn, ItemKind::Service, service.id, &payload.references).await?;
    txn.commit().await?;

    tracing::info!(service_id = %service.id, merchant_id = %merchant.id, "service created");
    audit::record(
        state,
        user.user_id,
        "service_create",
        "services",
        serde_json::json!({ "service_id": service.id }),
    )
    .await;

    let data = with_extras(state, service).await?;
    Ok(ApiResponse::success("Service created", data, Some(Meta::empty())))
}

pub async fn update_service(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateServiceRequest,
) -> AppResult<ApiResponse<Service>> {
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
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let service = active.update(&txn).await?;
    catalog::replace_references(&txn, ItemKind::Service, service.id, &payload.references).await?;
    txn.commit().await?;

    audit::record(
        state,
        user.user_id,
        "service_update",
        "services",
        serde_json::json!({ "service_id": service.id }),
    )
    .await;

    let data = with_extras(state, service).await?;
    Ok(ApiResponse::success("Updated", data, Some(Meta::empty())))
}

pub async fn delete_service(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    catalog::delete_owned::<Services>(state, user, id).await?;
    audit::record(
        state,
        user.user_id,
        "service_delete",
        "services",
        serde_json::json!({ "service_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}

async fn find_owned(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ServiceModel> {
    catalog::find_owned::<Services>(state, user, id).await
}

async fn with_extras(state: &AppState, service: ServiceModel) -> AppResult<Service> {
    let (service, extras) = catalog::with_extras(state, service).await?;
    Ok(service_from_entity(service, extras))
}

fn service_from_entity(model: ServiceModel, extras: ItemExtras) -> Service {
    Service {
        id: model.id,
        merchant_id: model.merchant_id,
        name: model.name,
        description: model.description,
        price: model.price,
        categories: extras.categories,
        hashtags: extras.hashtags,
        keywords: extras.keywords,
        is_active: model.is_active,
        promotions: extras.promotions,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
