use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::Utc;
use marketplace_api::{
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{categories, hashtags, keywords, merchants, users},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

const DEMO_USERNAME: &str = "demo";
const DEMO_PASSWORD: &str = "demo-password";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let user_id = ensure_user(&orm, DEMO_USERNAME, DEMO_PASSWORD).await?;
    let merchant_id = ensure_merchant(&orm, user_id, "Demo Store").await?;
    seed_taxonomy(&orm).await?;

    println!("Seed completed. User ID: {user_id}, Merchant ID: {merchant_id}");
    Ok(())
}

async fn ensure_user(orm: &OrmConn, username: &str, password: &str) -> anyhow::Result<Uuid> {
    if let Some(existing) = users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(orm)
        .await?
    {
        println!("User {username} already exists");
        return Ok(existing.id);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let now = Utc::now();
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set("demo@example.com".to_string()),
        password_hash: Set(password_hash),
        phone: Set("+84987654321".to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(orm)
    .await?;

    println!("Created user {username}");
    Ok(user.id)
}

async fn ensure_merchant(orm: &OrmConn, user_id: Uuid, name: &str) -> anyhow::Result<Uuid> {
    if let Some(existing) = merchants::Entity::find()
        .filter(merchants::Column::UserId.eq(user_id))
        .one(orm)
        .await?
    {
        return Ok(existing.id);
    }

    let now = Utc::now();
    let merchant = merchants::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set(name.to_string()),
        description: Set("Demo storefront".to_string()),
        logo: Set(None),
        address: Set("1 Nguyen Hue, District 1, Ho Chi Minh City".to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(orm)
    .await?;

    println!("Created merchant {name}");
    Ok(merchant.id)
}

async fn seed_taxonomy(orm: &OrmConn) -> anyhow::Result<()> {
    let now = Utc::now();

    for (name, description) in [
        ("Electronics", "Phones, laptops and accessories"),
        ("Beauty", "Cosmetics and personal care"),
        ("Home Services", "Cleaning, repairs and installation"),
    ] {
        let exists = categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm)
        .await?;
    }

    for name in ["sale", "new", "bestseller"] {
        let exists = hashtags::Entity::find()
            .filter(hashtags::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if !exists {
            hashtags::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(orm)
            .await?;
        }
    }

    for name in ["smartphone", "haircut", "delivery"] {
        let exists = keywords::Entity::find()
            .filter(keywords::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if !exists {
            keywords::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(orm)
            .await?;
        }
    }

    println!("Seeded categories, hashtags and keywords");
    Ok(())
}
