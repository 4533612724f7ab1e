use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
    sea_query::{Alias, Expr, JoinType, Query, SelectStatement},
};
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::promotions::{
        CreatePromotionRequest, PromotionInput, PromotionList, UpdatePromotionRequest,
    },
    entity::promotions::{ActiveModel, Column, Entity as Promotions, Model as PromotionModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_merchant_owns},
    models::Promotion,
    response::{ApiResponse, Meta},
    routes::params::{Pagination, SortOrder},
    services::{catalog::ItemKind, merchant_service},
    state::AppState,
};

/// Active flag set and `now` inside `[start, end]`, both ends inclusive.
pub fn is_active_at(
    is_active: bool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    is_active && start <= now && now <= end
}

pub fn is_currently_active(promotion: &PromotionModel, now: DateTime<Utc>) -> bool {
    is_active_at(
        promotion.is_active,
        promotion.start_date.with_timezone(&Utc),
        promotion.end_date.with_timezone(&Utc),
        now,
    )
}

/// Facts gathered before linking a promotion to an item.
#[derive(Debug, Clone)]
pub struct AttachmentCheck {
    pub requester_merchant: Option<Uuid>,
    pub promotion_exists: bool,
    pub item_kind: ItemKind,
    /// Owning merchant of the item, `None` when the item does not exist.
    pub item_merchant: Option<Uuid>,
    pub already_linked: bool,
}

impl AttachmentCheck {
    /// Preconditions for `unlinked -> linked`, in order. The first failing one
    /// decides the error.
    pub fn evaluate(&self) -> AppResult<()> {
        let Some(requester) = self.requester_merchant else {
            return Err(AppError::MerchantRequired);
        };
        if !self.promotion_exists {
            return Err(AppError::NotFound("Promotion"));
        }
        let Some(owner) = self.item_merchant else {
            return Err(AppError::NotFound(self.item_kind.label()));
        };
        ensure_merchant_owns(Some(requester), owner)?;
        if self.already_linked {
            return Err(AppError::AlreadyLinked);
        }
        Ok(())
    }
}

pub async fn create_promotion(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePromotionRequest,
) -> AppResult<ApiResponse<Promotion>> {
    let merchant = merchant_service::require_for_user(&state.orm, user).await?;
    let input = payload.validate()?;

    let now = Utc::now();
    let promotion = ActiveModel {
        id: Set(Uuid::new_v4()),
        merchant_id: Set(merchant.id),
        name: Set(input.name.trim().to_string()),
        description: Set(input.description),
        discount_percent: Set(input.discount_percent),
        start_date: Set(input.start_date.into()),
        end_date: Set(input.end_date.into()),
        is_active: Set(input.is_active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(promotion_id = %promotion.id, merchant_id = %merchant.id, "promotion created");
    audit::record(
        state,
        user.user_id,
        "promotion_create",
        "promotions",
        serde_json::json!({ "promotion_id": promotion.id }),
    )
    .await;

    let data = with_links(state.pool(), vec![promotion], now)
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("promotion vanished after insert")))?;
    Ok(ApiResponse::success("Promotion created", data, Some(Meta::empty())))
}

pub async fn list_promotions(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    sort_order: Option<SortOrder>,
) -> AppResult<ApiResponse<PromotionList>> {
    let merchant = merchant_service::require_for_user(&state.orm, user).await?;
    let (page, limit, offset) = pagination.normalize();

    let mut finder = Promotions::find().filter(visible_to(merchant.id));
    finder = match sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(Column::StartDate),
        SortOrder::Desc => finder.order_by_desc(Column::StartDate),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let rows = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = with_links(state.pool(), rows, Utc::now()).await?;
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Promotions", PromotionList { items }, Some(meta)))
}

pub async fn get_promotion(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Promotion>> {
    let merchant = merchant_service::require_for_user(&state.orm, user).await?;
    let promotion = find_visible(state, merchant.id, id).await?;
    let data = single(state.pool(), promotion).await?;
    Ok(ApiResponse::success("Promotion", data, None))
}

pub async fn update_promotion(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePromotionRequest,
) -> AppResult<ApiResponse<Promotion>> {
    let merchant = merchant_service::require_for_user(&state.orm, user).await?;
    let existing = find_visible(state, merchant.id, id).await?;
    if existing.merchant_id != merchant.id {
        return Err(AppError::Forbidden);
    }

    let merged = payload.merge_into(input_from_entity(&existing))?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(merged.name.trim().to_string());
    active.description = Set(merged.description);
    active.discount_percent = Set(merged.discount_percent);
    active.start_date = Set(merged.start_date.into());
    active.end_date = Set(merged.end_date.into());
    active.is_active = Set(merged.is_active);
    active.updated_at = Set(Utc::now().into());
    let promotion = active.update(&state.orm).await?;

    audit::record(
        state,
        user.user_id,
        "promotion_update",
        "promotions",
        serde_json::json!({ "promotion_id": promotion.id }),
    )
    .await;

    let data = single(state.pool(), promotion).await?;
    Ok(ApiResponse::success("Updated", data, Some(Meta::empty())))
}

pub async fn delete_promotion(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let merchant = merchant_service::require_for_user(&state.orm, user).await?;
    let existing = find_visible(state, merchant.id, id).await?;
    if existing.merchant_id != merchant.id {
        return Err(AppError::Forbidden);
    }

    Promotions::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        state,
        user.user_id,
        "promotion_delete",
        "promotions",
        serde_json::json!({ "promotion_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}

/// Links a product or service to a promotion. Only the item's merchant may do
/// this; the promotion itself may belong to anyone.
pub async fn attach_item(
    state: &AppState,
    user: &AuthUser,
    promotion_id: Uuid,
    kind: ItemKind,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let pool = state.pool();
    let requester_merchant = merchant_service::find_for_user(&state.orm, user)
        .await?
        .map(|m| m.id);

    let check = AttachmentCheck {
        requester_merchant,
        promotion_exists: Promotions::find_by_id(promotion_id)
            .one(&state.orm)
            .await?
            .is_some(),
        item_kind: kind,
        item_merchant: item_owner(pool, kind, item_id).await?,
        already_linked: is_linked(pool, kind, promotion_id, item_id).await?,
    };
    check.evaluate()?;

    let merchant_id = requester_merchant.ok_or(AppError::MerchantRequired)?;

    // The merchant filter and the link table's primary key keep this insert
    // correct even if the checks above raced with another request.
    let sql = format!(
        "INSERT INTO {link} (promotion_id, {item_col})
         SELECT $1, i.id FROM {items} i WHERE i.id = $2 AND i.merchant_id = $3
         ON CONFLICT DO NOTHING",
        link = kind.promotion_link_table(),
        item_col = kind.id_column(),
        items = kind.table(),
    );
    let result = sqlx::query(&sql)
        .bind(promotion_id)
        .bind(item_id)
        .bind(merchant_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(if is_linked(pool, kind, promotion_id, item_id).await? {
            AppError::AlreadyLinked
        } else {
            AppError::NotFound(kind.label())
        });
    }

    tracing::info!(
        promotion_id = %promotion_id,
        item_id = %item_id,
        kind = kind.label(),
        "item attached to promotion"
    );
    audit::record(
        state,
        user.user_id,
        "promotion_attach",
        "promotions",
        serde_json::json!({
            "promotion_id": promotion_id,
            "item_id": item_id,
            "kind": kind.label(),
        }),
    )
    .await;

    Ok(ApiResponse::done(format!(
        "{} added to promotion successfully",
        kind.label()
    )))
}

/// Number of items of `kind` linked to a promotion.
pub async fn link_count(pool: &DbPool, kind: ItemKind, promotion_id: Uuid) -> AppResult<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM {link} WHERE promotion_id = $1",
        link = kind.promotion_link_table(),
    );
    let total: (i64,) = sqlx::query_as(&sql)
        .bind(promotion_id)
        .fetch_one(pool)
        .await?;
    Ok(total.0)
}

async fn item_owner(pool: &DbPool, kind: ItemKind, item_id: Uuid) -> AppResult<Option<Uuid>> {
    let sql = format!("SELECT merchant_id FROM {} WHERE id = $1", kind.table());
    let owner: Option<(Uuid,)> = sqlx::query_as(&sql)
        .bind(item_id)
        .fetch_optional(pool)
        .await?;
    Ok(owner.map(|row| row.0))
}

async fn is_linked(
    pool: &DbPool,
    kind: ItemKind,
    promotion_id: Uuid,
    item_id: Uuid,
) -> AppResult<bool> {
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {link} WHERE promotion_id = $1 AND {item_col} = $2)",
        link = kind.promotion_link_table(),
        item_col = kind.id_column(),
    );
    let linked: (bool,) = sqlx::query_as(&sql)
        .bind(promotion_id)
        .bind(item_id)
        .fetch_one(pool)
        .await?;
    Ok(linked.0)
}

/// Promotions a merchant created, plus those linked to any of its items.
fn visible_to(merchant_id: Uuid) -> Condition {
    Condition::any()
        .add(Column::MerchantId.eq(merchant_id))
        .add(Column::Id.in_subquery(linked_promotions(ItemKind::Product, merchant_id)))
        .add(Column::Id.in_subquery(linked_promotions(ItemKind::Service, merchant_id)))
}

fn linked_promotions(kind: ItemKind, merchant_id: Uuid) -> SelectStatement {
    let link = Alias::new("l");
    let item = Alias::new("i");
    Query::select()
        .column((link.clone(), Alias::new("promotion_id")))
        .from_as(Alias::new(kind.promotion_link_table()), link.clone())
        .join_as(
            JoinType::InnerJoin,
            Alias::new(kind.table()),
            item.clone(),
            Expr::col((item.clone(), Alias::new("id")))
                .equals((link, Alias::new(kind.id_column()))),
        )
        .and_where(Expr::col((item, Alias::new("merchant_id"))).eq(merchant_id))
        .to_owned()
}

async fn find_visible(
    state: &AppState,
    merchant_id: Uuid,
    id: Uuid,
) -> AppResult<PromotionModel> {
    Promotions::find_by_id(id)
        .filter(visible_to(merchant_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Promotion"))
}

async fn single(pool: &DbPool, promotion: PromotionModel) -> AppResult<Promotion> {
    with_links(pool, vec![promotion], Utc::now())
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("promotion conversion failed")))
}

async fn with_links(
    pool: &DbPool,
    rows: Vec<PromotionModel>,
    now: DateTime<Utc>,
) -> AppResult<Vec<Promotion>> {
    let ids: Vec<Uuid> = rows.iter().map(|p| p.id).collect();
    let products = linked_items(pool, ItemKind::Product, &ids).await?;
    let services = linked_items(pool, ItemKind::Service, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|model| {
            let product_ids = products.get(&model.id).cloned().unwrap_or_default();
            let service_ids = services.get(&model.id).cloned().unwrap_or_default();
            promotion_from_entity(model, product_ids, service_ids, now)
        })
        .collect())
}

async fn linked_items(
    pool: &DbPool,
    kind: ItemKind,
    promotion_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<Uuid>>> {
    let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    if promotion_ids.is_empty() {
        return Ok(map);
    }
    let sql = format!(
        "SELECT promotion_id, {item_col} FROM {link}
         WHERE promotion_id = ANY($1)
         ORDER BY created_at",
        item_col = kind.id_column(),
        link = kind.promotion_link_table(),
    );
    let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(&sql)
        .bind(promotion_ids)
        .fetch_all(pool)
        .await?;
    for (promotion_id, item_id) in rows {
        map.entry(promotion_id).or_default().push(item_id);
    }
    Ok(map)
}

fn input_from_entity(model: &PromotionModel) -> PromotionInput {
    PromotionInput {
        name: model.name.clone(),
        description: model.description.clone(),
        discount_percent: model.discount_percent,
        start_date: model.start_date.with_timezone(&Utc),
        end_date: model.end_date.with_timezone(&Utc),
        is_active: model.is_active,
    }
}

fn promotion_from_entity(
    model: PromotionModel,
    product_ids: Vec<Uuid>,
    service_ids: Vec<Uuid>,
    now: DateTime<Utc>,
) -> Promotion {
    let is_currently_active = is_currently_active(&model, now);
    Promotion {
        id: model.id,
        merchant_id: model.merchant_id,
        name: model.name,
        description: model.description,
        discount_percent: model.discount_percent,
        start_date: model.start_date.with_timezone(&Utc),
        end_date: model.end_date.with_timezone(&Utc),
        is_active: model.is_active,
        is_currently_active,
        product_ids,
        service_ids,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn promotion(is_active: bool, start: DateTime<Utc>, end: DateTime<Utc>) -> PromotionModel {
        PromotionModel {
            id: Uuid::new_v4(),
            merchant_id: Uuid::new_v4(),
            name: "Summer Sale".into(),
            description: String::new(),
            discount_percent: Decimal::from(10),
            start_date: start.into(),
            end_date: end.into(),
            is_active,
            created_at: start.into(),
            updated_at: start.into(),
        }
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let start = Utc::now();
        let end = start + Duration::days(7);
        let p = promotion(true, start, end);
        assert!(is_currently_active(&p, start));
        assert!(is_currently_active(&p, end));
        assert!(is_currently_active(&p, start + Duration::days(1)));
        assert!(!is_currently_active(&p, start - Duration::seconds(1)));
        assert!(!is_currently_active(&p, end + Duration::seconds(1)));
    }

    #[test]
    fn inactive_flag_hides_promotion() {
        let start = Utc::now() - Duration::days(1);
        let p = promotion(false, start, start + Duration::days(7));
        assert!(!is_currently_active(&p, Utc::now()));
    }

    fn check() -> AttachmentCheck {
        let merchant = Uuid::new_v4();
        AttachmentCheck {
            requester_merchant: Some(merchant),
            promotion_exists: true,
            item_kind: ItemKind::Product,
            item_merchant: Some(merchant),
            already_linked: false,
        }
    }

    #[test]
    fn owner_may_attach() {
        assert!(check().evaluate().is_ok());
    }

    #[test]
    fn other_merchant_is_forbidden() {
        let c = AttachmentCheck {
            item_merchant: Some(Uuid::new_v4()),
            ..check()
        };
        assert!(matches!(c.evaluate(), Err(AppError::Forbidden)));
    }

    #[test]
    fn second_attach_is_already_linked() {
        let c = AttachmentCheck {
            already_linked: true,
            ..check()
        };
        assert!(matches!(c.evaluate(), Err(AppError::AlreadyLinked)));
    }

    #[test]
    fn missing_entities_name_themselves() {
        let c = AttachmentCheck {
            promotion_exists: false,
            ..check()
        };
        assert!(matches!(c.evaluate(), Err(AppError::NotFound("Promotion"))));

        let c = AttachmentCheck {
            item_kind: ItemKind::Service,
            item_merchant: None,
            ..check()
        };
        assert!(matches!(c.evaluate(), Err(AppError::NotFound("Service"))));
    }

    #[test]
    fn requester_without_merchant_is_told_so() {
        let c = AttachmentCheck {
            requester_merchant: None,
            item_merchant: Some(Uuid::new_v4()),
            ..check()
        };
        assert!(matches!(c.evaluate(), Err(AppError::MerchantRequired)));
    }

    #[test]
    fn forbidden_wins_over_already_linked() {
        let c = AttachmentCheck {
            item_merchant: Some(Uuid::new_v4()),
            already_linked: true,
            ..check()
        };
        assert!(matches!(c.evaluate(), Err(AppError::Forbidden)));
    }
}
