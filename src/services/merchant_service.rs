use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::merchants::{CreateMerchantRequest, MerchantList, UpdateMerchantRequest},
    entity::{
        merchants::{ActiveModel, Column, Entity as Merchants, Model as MerchantModel},
        users::{Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Merchant,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::auth_service::user_from_entity,
    state::AppState,
    validation::{ValidationErrors, blank_as_none},
};

/// The requester's storefront, if it has one.
pub async fn find_for_user<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
) -> AppResult<Option<MerchantModel>> {
    let merchant = Merchants::find()
        .filter(Column::UserId.eq(user.user_id))
        .one(conn)
        .await?;
    Ok(merchant)
}

/// Like [`find_for_user`] but fails with `MerchantRequired` when the
/// requester has not created a storefront yet.
pub async fn require_for_user<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
) -> AppResult<MerchantModel> {
    find_for_user(conn, user)
        .await?
        .ok_or(AppError::MerchantRequired)
}

pub async fn create_merchant(
    state: &AppState,
    user: &AuthUser,
    payload: CreateMerchantRequest,
) -> AppResult<ApiResponse<Merchant>> {
    payload.validate()?;
    if find_for_user(&state.orm, user).await?.is_some() {
        return Err(ValidationErrors::single("user", "merchant_exists").into());
    }

    let now = Utc::now();
    let merchant = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        logo: Set(blank_as_none(payload.logo)),
        address: Set(payload.address),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(merchant_id = %merchant.id, user_id = %user.user_id, "merchant created");
    audit::record(
        state,
        user.user_id,
        "merchant_create",
        "merchants",
        serde_json::json!({ "merchant_id": merchant.id }),
    )
    .await;

    let owner = load_owner(state, merchant.user_id).await?;
    Ok(ApiResponse::success(
        "Merchant created",
        merchant_from_entity(merchant, owner),
        Some(Meta::empty()),
    ))
}

pub async fn list_merchants(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<MerchantList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Merchants::find().order_by_desc(Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let rows = finder
        .find_also_related(Users)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for (merchant, owner) in rows {
        let owner = owner.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("merchant {} has no owner", merchant.id))
        })?;
        items.push(merchant_from_entity(merchant, owner));
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Merchants", MerchantList { items }, Some(meta)))
}

pub async fn get_merchant(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Merchant>> {
    let merchant = find_merchant(state, id).await?;
    let owner = load_owner(state, merchant.user_id).await?;
    Ok(ApiResponse::success(
        "Merchant",
        merchant_from_entity(merchant, owner),
        None,
    ))
}

pub async fn update_merchant(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateMerchantRequest,
) -> AppResult<ApiResponse<Merchant>> {
    let existing = find_merchant(state, id).await?;
    if existing.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    payload.validate()?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(logo) = payload.logo {
        active.logo = Set(blank_as_none(Some(logo)));
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    active.updated_at = Set(Utc::now().into());
    let merchant = active.update(&state.orm).await?;

    audit::record(
        state,
        user.user_id,
        "merchant_update",
        "merchants",
        serde_json::json!({ "merchant_id": merchant.id }),
    )
    .await;

    let owner = load_owner(state, merchant.user_id).await?;
    Ok(ApiResponse::success(
        "Updated",
        merchant_from_entity(merchant, owner),
        Some(Meta::empty()),
    ))
}

/// Deleting a merchant cascades to its products, services, promotions and links.
pub async fn delete_merchant(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_merchant(state, id).await?;
    if existing.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    Merchants::delete_by_id(id).exec(&state.orm).await?;

    tracing::info!(merchant_id = %id, "merchant deleted");
    audit::record(
        state,
        user.user_id,
        "merchant_delete",
        "merchants",
        serde_json::json!({ "merchant_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}

async fn find_merchant(state: &AppState, id: Uuid) -> AppResult<MerchantModel> {
    Merchants::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Merchant"))
}

async fn load_owner(state: &AppState, user_id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Account"))
}

fn merchant_from_entity(model: MerchantModel, owner: UserModel) -> Merchant {
    Merchant {
        id: model.id,
        user: user_from_entity(owner),
        name: model.name,
        description: model.description,
        logo: model.logo,
        address: model.address,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
