use chrono::{Duration, Utc};
use marketplace_api::{
    config::JwtConfig,
    db::{create_orm_conn, run_migrations},
    dto::{
        auth::RegisterRequest,
        merchants::CreateMerchantRequest,
        products::{
            CreateProductRequest, CreateServiceRequest, ReferenceIds, UpdateProductRequest,
            UpdateServiceRequest,
        },
        promotions::{CreatePromotionRequest, UpdatePromotionRequest},
        tags::{CreateCategoryRequest, CreateTagRequest},
    },
    entity::{AuditLogs, audit_logs},
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::ItemQuery,
    services::{
        auth_service, catalog::ItemKind, merchant_service, product_service, promotion_service,
        service_service, tag_service,
    },
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

// Integration flow: two merchants, a catalog, and promotion attachment rules.
#[tokio::test]
async fn merchants_catalog_and_promotion_attachment_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let owner = register(&state, "owner").await?;
    let rival = register(&state, "rival").await?;
    let shopper = register(&state, "shopper").await?;

    // An account without a storefront is told to create one first.
    let err = product_service::create_product(&state, &shopper, product_request("Orphan", None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MerchantRequired));

    create_merchant(&state, &owner, "Owner Store").await?;
    create_merchant(&state, &rival, "Rival Store").await?;

    // One storefront per account.
    let err = merchant_service::create_merchant(&state, &owner, merchant_request("Second Store"))
        .await
        .unwrap_err();
    match err {
        AppError::Validation(errors) => assert!(errors.has("user", "merchant_exists")),
        other => panic!("expected validation error, got {other:?}"),
    }

    // Unknown category ids are dropped, known ones are linked.
    let category = tag_service::create_category(
        &state,
        &owner,
        CreateCategoryRequest {
            name: "Electronics".into(),
            description: "Phones and laptops".into(),
        },
    )
    .await?
    .data
    .expect("category");
    let product = product_service::create_product(
        &state,
        &owner,
        product_request("Phone", Some(vec![category.id, Uuid::new_v4()])),
    )
    .await?
    .data
    .expect("product");
    assert_eq!(product.categories.len(), 1);
    assert_eq!(product.categories[0].id, category.id);
    assert!(product.is_active);

    let service = service_service::create_service(
        &state,
        &owner,
        CreateServiceRequest {
            name: "Screen repair".into(),
            description: String::new(),
            price: Some(Decimal::new(25000, 2)),
            is_active: None,
            references: ReferenceIds::default(),
        },
    )
    .await?
    .data
    .expect("service");

    // Items are private to their merchant.
    let err = product_service::get_product(&state, &rival, product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    let err = product_service::get_product(&state, &owner, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Product")));

    // The promotion window must be well ordered.
    let now = Utc::now();
    let err = promotion_service::create_promotion(
        &state,
        &owner,
        promotion_request("Backwards", now, now),
    )
    .await
    .unwrap_err();
    match err {
        AppError::Validation(errors) => assert!(errors.has("end_date", "end_before_start")),
        other => panic!("expected validation error, got {other:?}"),
    }

    let promotion = promotion_service::create_promotion(
        &state,
        &owner,
        promotion_request("Launch week", now - Duration::days(1), now + Duration::days(7)),
    )
    .await?
    .data
    .expect("promotion");
    assert!(promotion.is_currently_active);
    assert!(promotion.product_ids.is_empty());

    // Another merchant cannot attach the owner's product.
    let err = promotion_service::attach_item(
        &state,
        &rival,
        promotion.id,
        ItemKind::Product,
        product.id,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    assert_eq!(
        promotion_service::link_count(state.pool(), ItemKind::Product, promotion.id).await?,
        0
    );

    // The owner can, exactly once.
    let resp =
        promotion_service::attach_item(&state, &owner, promotion.id, ItemKind::Product, product.id)
            .await?;
    assert_eq!(resp.message, "Product added to promotion successfully");
    let err =
        promotion_service::attach_item(&state, &owner, promotion.id, ItemKind::Product, product.id)
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::AlreadyLinked));
    assert_eq!(
        promotion_service::link_count(state.pool(), ItemKind::Product, promotion.id).await?,
        1
    );

    promotion_service::attach_item(&state, &owner, promotion.id, ItemKind::Service, service.id)
        .await?;

    let err = promotion_service::attach_item(
        &state,
        &owner,
        Uuid::new_v4(),
        ItemKind::Service,
        service.id,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Promotion")));

    // Reads surface the active promotion on the item.
    let reloaded = product_service::get_product(&state, &owner, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(reloaded.promotions.len(), 1);
    assert_eq!(reloaded.promotions[0].id, promotion.id);

    let detail = promotion_service::get_promotion(&state, &owner, promotion.id)
        .await?
        .data
        .expect("promotion");
    assert_eq!(detail.product_ids, vec![product.id]);
    assert_eq!(detail.service_ids, vec![service.id]);

    // Invisible to a merchant that neither created it nor has linked items.
    let err = promotion_service::get_promotion(&state, &rival, promotion.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Promotion")));

    // Once the rival links its own service, it can see the promotion but not edit it.
    let rival_service = service_service::create_service(
        &state,
        &rival,
        CreateServiceRequest {
            name: "Rival repair".into(),
            description: String::new(),
            price: Some(Decimal::new(20000, 2)),
            is_active: Some(true),
            references: ReferenceIds::default(),
        },
    )
    .await?
    .data
    .expect("service");
    promotion_service::attach_item(
        &state,
        &rival,
        promotion.id,
        ItemKind::Service,
        rival_service.id,
    )
    .await?;
    assert!(promotion_service::get_promotion(&state, &rival, promotion.id).await.is_ok());
    let err = promotion_service::update_promotion(
        &state,
        &rival,
        promotion.id,
        UpdatePromotionRequest {
            name: Some("Hijacked".into()),
            description: None,
            discount_percent: None,
            start_date: None,
            end_date: None,
            is_active: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Moving only the start past the stored end is still rejected.
    let err = promotion_service::update_promotion(
        &state,
        &owner,
        promotion.id,
        UpdatePromotionRequest {
            name: None,
            description: None,
            discount_percent: None,
            start_date: Some(now + Duration::days(30)),
            end_date: None,
            is_active: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Deactivated promotions drop off item reads.
    promotion_service::update_promotion(
        &state,
        &owner,
        promotion.id,
        UpdatePromotionRequest {
            name: None,
            description: None,
            discount_percent: None,
            start_date: None,
            end_date: None,
            is_active: Some(false),
        },
    )
    .await?;
    let reloaded = product_service::get_product(&state, &owner, product.id)
        .await?
        .data
        .expect("product");
    assert!(reloaded.promotions.is_empty());

    // Listing is scoped to the requester's merchant and filterable.
    let listed = product_service::list_products(
        &state,
        &owner,
        ItemQuery {
            q: Some("pho".into()),
            ..ItemQuery::default()
        },
    )
    .await?
    .data
    .expect("products");
    assert_eq!(listed.items.len(), 1);
    let listed = product_service::list_products(&state, &rival, ItemQuery::default())
        .await?
        .data
        .expect("products");
    assert!(listed.items.is_empty());

    // Supplied reference lists replace the stored set; omitted ones are kept.
    let accessories = tag_service::create_category(
        &state,
        &owner,
        CreateCategoryRequest {
            name: "Accessories".into(),
            description: String::new(),
        },
    )
    .await?
    .data
    .expect("category");
    let hashtag = tag_service::create_hashtag(
        &state,
        &owner,
        CreateTagRequest {
            name: "newarrival".into(),
        },
    )
    .await?
    .data
    .expect("hashtag");
    let updated = product_service::update_product(
        &state,
        &owner,
        product.id,
        UpdateProductRequest {
            references: ReferenceIds {
                category_ids: Some(vec![accessories.id, Uuid::new_v4()]),
                hashtag_ids: Some(vec![hashtag.id]),
                keyword_ids: None,
            },
            ..product_update()
        },
    )
    .await?
    .data
    .expect("product");
    let category_ids: Vec<Uuid> = updated.categories.iter().map(|c| c.id).collect();
    assert_eq!(category_ids, vec![accessories.id]);
    assert_eq!(updated.hashtags.len(), 1);
    assert_eq!(updated.hashtags[0].id, hashtag.id);

    let renamed = product_service::update_product(
        &state,
        &owner,
        product.id,
        UpdateProductRequest {
            name: Some("Phone X".into()),
            ..product_update()
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(renamed.name, "Phone X");
    let category_ids: Vec<Uuid> = renamed.categories.iter().map(|c| c.id).collect();
    assert_eq!(category_ids, vec![accessories.id]);
    assert_eq!(renamed.hashtags.len(), 1);

    let updated = service_service::update_service(
        &state,
        &owner,
        service.id,
        UpdateServiceRequest {
            references: ReferenceIds {
                category_ids: Some(vec![category.id, Uuid::new_v4()]),
                hashtag_ids: None,
                keyword_ids: None,
            },
            ..service_update()
        },
    )
    .await?
    .data
    .expect("service");
    let category_ids: Vec<Uuid> = updated.categories.iter().map(|c| c.id).collect();
    assert_eq!(category_ids, vec![category.id]);

    let updated = service_service::update_service(
        &state,
        &owner,
        service.id,
        UpdateServiceRequest {
            price: Some(Decimal::new(30000, 2)),
            ..service_update()
        },
    )
    .await?
    .data
    .expect("service");
    assert_eq!(updated.price, Decimal::new(30000, 2));
    assert_eq!(updated.categories.len(), 1);

    let cleared = service_service::update_service(
        &state,
        &owner,
        service.id,
        UpdateServiceRequest {
            references: ReferenceIds {
                category_ids: Some(Vec::new()),
                hashtag_ids: None,
                keyword_ids: None,
            },
            ..service_update()
        },
    )
    .await?
    .data
    .expect("service");
    assert!(cleared.categories.is_empty());

    let listed = service_service::list_services(
        &state,
        &owner,
        ItemQuery {
            min_price: Some(Decimal::new(29000, 2)),
            ..ItemQuery::default()
        },
    )
    .await?
    .data
    .expect("services");
    let listed_ids: Vec<Uuid> = listed.items.iter().map(|s| s.id).collect();
    assert_eq!(listed_ids, vec![service.id]);

    // Deleting removes the item and its links.
    product_service::delete_product(&state, &owner, product.id).await?;
    let err = product_service::get_product(&state, &owner, product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Product")));
    assert_eq!(
        promotion_service::link_count(state.pool(), ItemKind::Product, promotion.id).await?,
        0
    );

    // Every mutation above left an audit row for its account.
    let audited = AuditLogs::find()
        .filter(audit_logs::Column::UserId.eq(owner.user_id))
        .count(&state.orm)
        .await?;
    assert!(audited >= 8, "expected audit rows, found {audited}");

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(
        orm,
        JwtConfig {
            secret: "integration-secret".into(),
            access_ttl_minutes: 60,
            refresh_ttl_days: 1,
        },
    ))
}

// Usernames carry a random suffix so reruns against the same database do not collide.
async fn register(state: &AppState, prefix: &str) -> anyhow::Result<AuthUser> {
    let suffix = Uuid::new_v4().simple().to_string();
    let user = auth_service::register_user(
        state,
        RegisterRequest {
            username: format!("{prefix}_{}", &suffix[..12]),
            email: format!("{prefix}@example.com"),
            password: "correct-horse".into(),
            phone: Some("0987654321".into()),
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(user.phone, "+84987654321");
    Ok(AuthUser { user_id: user.id })
}

async fn create_merchant(state: &AppState, user: &AuthUser, name: &str) -> anyhow::Result<()> {
    let merchant = merchant_service::create_merchant(state, user, merchant_request(name))
        .await?
        .data
        .expect("merchant");
    // An empty logo is stored as no logo.
    assert_eq!(merchant.logo, None);
    Ok(())
}

fn merchant_request(name: &str) -> CreateMerchantRequest {
    CreateMerchantRequest {
        name: name.into(),
        description: String::new(),
        logo: Some(String::new()),
        address: "12 Le Loi, Ha Noi".into(),
    }
}

fn product_request(name: &str, category_ids: Option<Vec<Uuid>>) -> CreateProductRequest {
    CreateProductRequest {
        name: name.into(),
        description: "Test Description".into(),
        price: Some(Decimal::new(10000, 2)),
        image: None,
        is_active: None,
        references: ReferenceIds {
            category_ids,
            hashtag_ids: None,
            keyword_ids: None,
        },
    }
}

fn product_update() -> UpdateProductRequest {
    UpdateProductRequest {
        name: None,
        description: None,
        price: None,
        image: None,
        is_active: None,
        references: ReferenceIds::default(),
    }
}

fn service_update() -> UpdateServiceRequest {
    UpdateServiceRequest {
        name: None,
        description: None,
        price: None,
        is_active: None,
        references: ReferenceIds::default(),
    }
}

fn promotion_request(
    name: &str,
    start: chrono::DateTime<Utc>,
    end: chrono::DateTime<Utc>,
) -> CreatePromotionRequest {
    CreatePromotionRequest {
        name: name.into(),
        description: String::new(),
        discount_percent: Some(Decimal::new(1500, 2)),
        start_date: Some(start),
        end_date: Some(end),
        is_active: None,
    }
}
