use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{auth, merchants as merchant_dto, products as item_dto, promotions as promotion_dto, tags},
    models::{ActivePromotion, Category, Hashtag, Keyword, Merchant, Product, Promotion, Service, User},
    response::{ApiResponse, Meta},
    routes::{accounts, health, merchants, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        accounts::register,
        accounts::login,
        accounts::refresh,
        accounts::me,
        merchants::list_merchants,
        merchants::create_merchant,
        merchants::get_merchant,
        merchants::update_merchant,
        merchants::delete_merchant,
        products::list_categories,
        products::create_category,
        products::list_hashtags,
        products::create_hashtag,
        products::list_keywords,
        products::create_keyword,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        products::list_services,
        products::create_service,
        products::get_service,
        products::update_service,
        products::delete_service,
        products::list_promotions,
        products::create_promotion,
        products::get_promotion,
        products::update_promotion,
        products::delete_promotion,
        products::add_product_to_promotion,
        products::add_service_to_promotion
    ),
    components(
        schemas(
            User,
            Merchant,
            Category,
            Hashtag,
            Keyword,
            Product,
            Service,
            Promotion,
            ActivePromotion,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::RefreshRequest,
            auth::TokenPair,
            auth::AccessToken,
            merchant_dto::CreateMerchantRequest,
            merchant_dto::UpdateMerchantRequest,
            merchant_dto::MerchantList,
            item_dto::ReferenceIds,
            item_dto::CreateProductRequest,
            item_dto::UpdateProductRequest,
            item_dto::CreateServiceRequest,
            item_dto::UpdateServiceRequest,
            item_dto::ProductList,
            item_dto::ServiceList,
            promotion_dto::CreatePromotionRequest,
            promotion_dto::UpdatePromotionRequest,
            promotion_dto::PromotionList,
            tags::CreateCategoryRequest,
            tags::CreateTagRequest,
            tags::CategoryList,
            tags::HashtagList,
            tags::KeywordList,
            params::Pagination,
            params::ItemQuery,
            params::PromotionQuery,
            params::ItemSortBy,
            params::SortOrder,
            Meta,
            ApiResponse<User>,
            ApiResponse<Merchant>,
            ApiResponse<Product>,
            ApiResponse<Service>,
            ApiResponse<Promotion>,
            ApiResponse<item_dto::ProductList>,
            ApiResponse<item_dto::ServiceList>,
            ApiResponse<promotion_dto::PromotionList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Accounts", description = "Registration, login and tokens"),
        (name = "Merchants", description = "Merchant storefronts"),
        (name = "Taxonomy", description = "Categories, hashtags and keywords"),
        (name = "Products", description = "Merchant products"),
        (name = "Services", description = "Merchant services"),
        (name = "Promotions", description = "Discount campaigns and attachment"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
