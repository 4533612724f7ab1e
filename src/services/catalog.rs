//! Plumbing shared by products and services: reference sets and the
//! promotions surfaced on each item.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
    sea_query::{Alias, Expr, Query, extension::postgres::PgExpr},
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::products::ReferenceIds,
    entity::{
        categories::{self, Entity as Categories},
        hashtags::{self, Entity as Hashtags},
        keywords::{self, Entity as Keywords},
        products, services,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_merchant_owns},
    models::{ActivePromotion, Category, Hashtag, Keyword},
    response::Meta,
    routes::params::{ItemQuery, ItemSortBy, SortOrder},
    services::{merchant_service, promotion_service::is_active_at},
    state::AppState,
};

/// The two catalog variants a promotion can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Product,
    Service,
}

impl ItemKind {
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Product => "Product",
            ItemKind::Service => "Service",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            ItemKind::Product => "products",
            ItemKind::Service => "services",
        }
    }

    pub fn id_column(self) -> &'static str {
        match self {
            ItemKind::Product => "product_id",
            ItemKind::Service => "service_id",
        }
    }

    pub fn promotion_link_table(self) -> &'static str {
        match self {
            ItemKind::Product => "promotion_products",
            ItemKind::Service => "promotion_services",
        }
    }

    fn reference_table(self, set: ReferenceSet) -> &'static str {
        match (self, set) {
            (ItemKind::Product, ReferenceSet::Categories) => "product_categories",
            (ItemKind::Product, ReferenceSet::Hashtags) => "product_hashtags",
            (ItemKind::Product, ReferenceSet::Keywords) => "product_keywords",
            (ItemKind::Service, ReferenceSet::Categories) => "service_categories",
            (ItemKind::Service, ReferenceSet::Hashtags) => "service_hashtags",
            (ItemKind::Service, ReferenceSet::Keywords) => "service_keywords",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSet {
    Categories,
    Hashtags,
    Keywords,
}

impl ReferenceSet {
    fn table(self) -> &'static str {
        match self {
            ReferenceSet::Categories => "categories",
            ReferenceSet::Hashtags => "hashtags",
            ReferenceSet::Keywords => "keywords",
        }
    }

    fn id_column(self) -> &'static str {
        match self {
            ReferenceSet::Categories => "category_id",
            ReferenceSet::Hashtags => "hashtag_id",
            ReferenceSet::Keywords => "keyword_id",
        }
    }
}

/// Rows the shared catalog queries run against. Products and services use
/// the same column names, so filters and sorting are built by name.
pub trait CatalogRow {
    const KIND: ItemKind;
    fn id(&self) -> Uuid;
    fn merchant_id(&self) -> Uuid;
}

impl CatalogRow for products::Model {
    const KIND: ItemKind = ItemKind::Product;

    fn id(&self) -> Uuid {
        self.id
    }

    fn merchant_id(&self) -> Uuid {
        self.merchant_id
    }
}

impl CatalogRow for services::Model {
    const KIND: ItemKind = ItemKind::Service;

    fn id(&self) -> Uuid {
        self.id
    }

    fn merchant_id(&self) -> Uuid {
        self.merchant_id
    }
}

/// Everything an item response carries beyond its own row.
#[derive(Debug, Default, Clone)]
pub struct ItemExtras {
    pub categories: Vec<Category>,
    pub hashtags: Vec<Hashtag>,
    pub keywords: Vec<Keyword>,
    pub promotions: Vec<ActivePromotion>,
}

/// One page of a merchant's items, each paired with its extras.
#[derive(Debug)]
pub struct ItemPage<M> {
    pub rows: Vec<(M, ItemExtras)>,
    pub meta: Meta,
}

fn col(name: &'static str) -> Expr {
    Expr::col(Alias::new(name))
}

fn sort_column(sort_by: Option<ItemSortBy>) -> &'static str {
    match sort_by.unwrap_or(ItemSortBy::CreatedAt) {
        ItemSortBy::CreatedAt => "created_at",
        ItemSortBy::Price => "price",
        ItemSortBy::Name => "name",
    }
}

/// Listing filter: the merchant scope plus the optional search, price and
/// active filters from the query string.
pub fn list_condition(merchant_id: Uuid, query: &ItemQuery) -> Condition {
    let mut condition = Condition::all().add(col("merchant_id").eq(merchant_id));

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(col("name").ilike(pattern.clone()))
                .add(col("description").ilike(pattern)),
        );
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(col("price").gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(col("price").lte(max_price));
    }
    if let Some(is_active) = query.is_active {
        condition = condition.add(col("is_active").eq(is_active));
    }
    condition
}

/// Lists the requester's own items of one kind.
pub async fn list_items<E>(
    state: &AppState,
    user: &AuthUser,
    query: &ItemQuery,
) -> AppResult<ItemPage<E::Model>>
where
    E: EntityTrait,
    E::Model: CatalogRow + Sync,
{
    let merchant = merchant_service::require_for_user(&state.orm, user).await?;
    let (page, limit, offset) = query.pagination().normalize();
    let order = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    };
    let finder = E::find()
        .filter(list_condition(merchant.id, query))
        .order_by(col(sort_column(query.sort_by)), order);

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = models.iter().map(CatalogRow::id).collect();
    let kind = <E::Model as CatalogRow>::KIND;
    let mut extras = load_extras(state.pool(), kind, &ids, Utc::now()).await?;
    let rows = models
        .into_iter()
        .map(|model| {
            let extra = extras.remove(&model.id()).unwrap_or_default();
            (model, extra)
        })
        .collect();

    Ok(ItemPage {
        rows,
        meta: Meta::new(page, limit, total),
    })
}

/// Loads an item and runs the ownership gate against the requester.
pub async fn find_owned<E>(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<E::Model>
where
    E: EntityTrait,
    E::Model: CatalogRow,
{
    let requester = merchant_service::find_for_user(&state.orm, user)
        .await?
        .map(|m| m.id);
    let item = E::find()
        .filter(col("id").eq(id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound(<E::Model as CatalogRow>::KIND.label()))?;
    ensure_merchant_owns(requester, item.merchant_id())?;
    Ok(item)
}

/// Deletes an item the requester owns. Link rows go with it via cascades.
pub async fn delete_owned<E>(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()>
where
    E: EntityTrait,
    E::Model: CatalogRow,
{
    let kind = <E::Model as CatalogRow>::KIND;
    find_owned::<E>(state, user, id).await?;
    let result = E::delete_many()
        .filter(col("id").eq(id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(kind.label()));
    }
    tracing::info!(item_id = %id, kind = kind.table(), "catalog item deleted");
    Ok(())
}

pub async fn with_extras<M: CatalogRow>(state: &AppState, model: M) -> AppResult<(M, ItemExtras)> {
    let mut extras = load_extras(state.pool(), M::KIND, &[model.id()], Utc::now()).await?;
    let extra = extras.remove(&model.id()).unwrap_or_default();
    Ok((model, extra))
}

/// Replaces each reference set that was supplied. Sets left as `None` are
/// untouched. Unknown ids are dropped: the stored set is the intersection of
/// the requested ids and existing rows.
pub async fn replace_references<C: ConnectionTrait>(
    conn: &C,
    kind: ItemKind,
    item_id: Uuid,
    refs: &ReferenceIds,
) -> AppResult<()> {
    let sets = [
        (ReferenceSet::Categories, refs.category_ids.as_deref()),
        (ReferenceSet::Hashtags, refs.hashtag_ids.as_deref()),
        (ReferenceSet::Keywords, refs.keyword_ids.as_deref()),
    ];
    for (set, ids) in sets {
        let Some(ids) = ids else { continue };
        let existing = existing_ids(conn, set, ids).await?;
        if existing.len() < dedup_len(ids) {
            tracing::debug!(
                item_id = %item_id,
                set = set.table(),
                requested = ids.len(),
                kept = existing.len(),
                "dropping unknown reference ids"
            );
        }
        write_links(conn, kind, set, item_id, &existing).await?;
    }
    Ok(())
}

async fn existing_ids<C: ConnectionTrait>(
    conn: &C,
    set: ReferenceSet,
    ids: &[Uuid],
) -> AppResult<Vec<Uuid>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids = ids.to_vec();
    let found = match set {
        ReferenceSet::Categories => {
            Categories::find()
                .select_only()
                .column(categories::Column::Id)
                .filter(categories::Column::Id.is_in(ids))
                .into_tuple::<Uuid>()
                .all(conn)
                .await?
        }
        ReferenceSet::Hashtags => {
            Hashtags::find()
                .select_only()
                .column(hashtags::Column::Id)
                .filter(hashtags::Column::Id.is_in(ids))
                .into_tuple::<Uuid>()
                .all(conn)
                .await?
        }
        ReferenceSet::Keywords => {
            Keywords::find()
                .select_only()
                .column(keywords::Column::Id)
                .filter(keywords::Column::Id.is_in(ids))
                .into_tuple::<Uuid>()
                .all(conn)
                .await?
        }
    };
    Ok(found)
}

async fn write_links<C: ConnectionTrait>(
    conn: &C,
    kind: ItemKind,
    set: ReferenceSet,
    item_id: Uuid,
    ids: &[Uuid],
) -> AppResult<()> {
    let table = Alias::new(kind.reference_table(set));
    let item_col = Alias::new(kind.id_column());
    let ref_col = Alias::new(set.id_column());
    let backend = conn.get_database_backend();

    let delete = Query::delete()
        .from_table(table.clone())
        .and_where(Expr::col(item_col.clone()).eq(item_id))
        .to_owned();
    conn.execute(backend.build(&delete)).await?;

    if ids.is_empty() {
        return Ok(());
    }

    let mut insert = Query::insert();
    insert.into_table(table).columns([item_col, ref_col]);
    for id in ids {
        insert.values_panic([item_id.into(), (*id).into()]);
    }
    insert.on_conflict(
        sea_orm::sea_query::OnConflict::new()
            .do_nothing()
            .to_owned(),
    );
    conn.execute(backend.build(&insert)).await?;
    Ok(())
}

fn dedup_len(ids: &[Uuid]) -> usize {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}

/// Loads reference sets and currently active promotions for a batch of items.
pub async fn load_extras(
    pool: &DbPool,
    kind: ItemKind,
    item_ids: &[Uuid],
    now: DateTime<Utc>,
) -> AppResult<HashMap<Uuid, ItemExtras>> {
    let mut extras: HashMap<Uuid, ItemExtras> = item_ids
        .iter()
        .map(|id| (*id, ItemExtras::default()))
        .collect();
    if item_ids.is_empty() {
        return Ok(extras);
    }

    let sql = format!(
        "SELECT l.{item_col}, c.id, c.name, c.description
         FROM categories c
         JOIN {link} l ON l.category_id = c.id
         WHERE l.{item_col} = ANY($1)
         ORDER BY c.name",
        item_col = kind.id_column(),
        link = kind.reference_table(ReferenceSet::Categories),
    );
    let rows: Vec<(Uuid, Uuid, String, String)> = sqlx::query_as(&sql)
        .bind(item_ids)
        .fetch_all(pool)
        .await?;
    for (item_id, id, name, description) in rows {
        if let Some(entry) = extras.get_mut(&item_id) {
            entry.categories.push(Category {
                id,
                name,
                description,
            });
        }
    }

    for (item_id, id, name) in load_named(pool, kind, ReferenceSet::Hashtags, item_ids).await? {
        if let Some(entry) = extras.get_mut(&item_id) {
            entry.hashtags.push(Hashtag { id, name });
        }
    }
    for (item_id, id, name) in load_named(pool, kind, ReferenceSet::Keywords, item_ids).await? {
        if let Some(entry) = extras.get_mut(&item_id) {
            entry.keywords.push(Keyword { id, name });
        }
    }

    let sql = format!(
        "SELECT l.{item_col}, p.id, p.name, p.discount_percent, p.start_date, p.end_date, p.is_active
         FROM promotions p
         JOIN {link} l ON l.promotion_id = p.id
         WHERE l.{item_col} = ANY($1)
         ORDER BY p.start_date",
        item_col = kind.id_column(),
        link = kind.promotion_link_table(),
    );
    let rows: Vec<(Uuid, Uuid, String, Decimal, DateTime<Utc>, DateTime<Utc>, bool)> =
        sqlx::query_as(&sql).bind(item_ids).fetch_all(pool).await?;
    for (item_id, id, name, discount_percent, start_date, end_date, is_active) in rows {
        if !is_active_at(is_active, start_date, end_date, now) {
            continue;
        }
        if let Some(entry) = extras.get_mut(&item_id) {
            entry.promotions.push(ActivePromotion {
                id,
                name,
                discount_percent,
                start_date,
                end_date,
            });
        }
    }

    Ok(extras)
}

async fn load_named(
    pool: &DbPool,
    kind: ItemKind,
    set: ReferenceSet,
    item_ids: &[Uuid],
) -> AppResult<Vec<(Uuid, Uuid, String)>> {
    let sql = format!(
        "SELECT l.{item_col}, t.id, t.name
         FROM {table} t
         JOIN {link} l ON l.{ref_col} = t.id
         WHERE l.{item_col} = ANY($1)
         ORDER BY t.name",
        item_col = kind.id_column(),
        table = set.table(),
        link = kind.reference_table(set),
        ref_col = set.id_column(),
    );
    let rows = sqlx::query_as(&sql).bind(item_ids).fetch_all(pool).await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_tables_follow_item_kind() {
        assert_eq!(
            ItemKind::Product.reference_table(ReferenceSet::Hashtags),
            "product_hashtags"
        );
        assert_eq!(
            ItemKind::Service.reference_table(ReferenceSet::Categories),
            "service_categories"
        );
        assert_eq!(ItemKind::Service.promotion_link_table(), "promotion_services");
        assert_eq!(ItemKind::Product.id_column(), "product_id");
    }

    #[test]
    fn sorting_defaults_to_creation_time() {
        assert_eq!(sort_column(None), "created_at");
        assert_eq!(sort_column(Some(ItemSortBy::Price)), "price");
    }

    #[test]
    fn duplicate_ids_count_once() {
        let id = Uuid::new_v4();
        assert_eq!(dedup_len(&[id, id, Uuid::new_v4()]), 2);
    }
}
