//! Categories, hashtags and keywords. Shared across merchants; any
//! authenticated account can list and create them.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::tags::{CategoryList, CreateCategoryRequest, CreateTagRequest, HashtagList, KeywordList},
    entity::{categories, hashtags, keywords},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Category, Hashtag, Keyword},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_categories(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<CategoryList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = categories::Entity::find().order_by_asc(categories::Column::Name);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|c| Category {
            id: c.id,
            name: c.name,
            description: c.description,
        })
        .collect();
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    payload.validate()?;
    let now = Utc::now();
    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        user.user_id,
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    let data = Category {
        id: category.id,
        name: category.name,
        description: category.description,
    };
    Ok(ApiResponse::success("Category created", data, Some(Meta::empty())))
}

pub async fn list_hashtags(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<HashtagList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = hashtags::Entity::find().order_by_asc(hashtags::Column::Name);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|h| Hashtag { id: h.id, name: h.name })
        .collect();
    Ok(ApiResponse::success(
        "Hashtags",
        HashtagList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_hashtag(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTagRequest,
) -> AppResult<ApiResponse<Hashtag>> {
    payload.validate()?;
    let now = Utc::now();
    let hashtag = hashtags::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        user.user_id,
        "hashtag_create",
        "hashtags",
        serde_json::json!({ "hashtag_id": hashtag.id }),
    )
    .await;

    let data = Hashtag {
        id: hashtag.id,
        name: hashtag.name,
    };
    Ok(ApiResponse::success("Hashtag created", data, Some(Meta::empty())))
}

pub async fn list_keywords(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<KeywordList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = keywords::Entity::find().order_by_asc(keywords::Column::Name);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|k| Keyword { id: k.id, name: k.name })
        .collect();
    Ok(ApiResponse::success(
        "Keywords",
        KeywordList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_keyword(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTagRequest,
) -> AppResult<ApiResponse<Keyword>> {
    payload.validate()?;
    let now = Utc::now();
    let keyword = keywords::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        user.user_id,
        "keyword_create",
        "keywords",
        serde_json::json!({ "keyword_id": keyword.id }),
    )
    .await;

    let data = Keyword {
        id: keyword.id,
        name: keyword.name,
    };
    Ok(ApiResponse::success("Keyword created", data, Some(Meta::empty())))
}
