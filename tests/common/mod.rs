#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use serde_json::json;
use storex::config::AppConfig;
use storex::database::models::{NewUser, User};
use storex::database::{Database, UserRepo};
use storex::services::asset_service::BrandRef;
use storex::services::{AssetService, CreateAssetRequest, CreateModelRequest, UserService};
use storex::auth::{EmailPolicy, TokenIssuer};
use storex::types::{Actor, OwnedBy, Role, UserType};
use uuid::Uuid;

pub const DOMAIN: &str = "storex.test";

/// Config for tests: development defaults, fixed email domain
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::from_env();
    config.security.email_domain = DOMAIN.to_string();
    config.security.jwt_secret = "integration-test-secret".to_string();
    config.database.max_connections = 5;
    config
}

/// Connects to DATABASE_URL and applies migrations. Returns `None` when no
/// database is configured so DB-backed tests skip instead of failing.
pub async fn test_db() -> Result<Option<Database>> {
    let _ = dotenvy::dotenv();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping database test");
        return Ok(None);
    }
    let db = Database::connect(&test_config().database).await?;
    db.migrate().await?;
    Ok(Some(db))
}

pub fn tokens() -> TokenIssuer {
    TokenIssuer::from_config(&test_config().security).expect("token issuer")
}

pub fn asset_service(db: &Database) -> AssetService {
    AssetService::new(db.clone())
}

pub fn user_service(db: &Database) -> UserService {
    let emails = EmailPolicy::new(DOMAIN).expect("email policy");
    UserService::new(db.clone(), tokens(), emails)
}

/// Lowercase letters only, so the address passes the email policy
pub fn unique_local_part() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(12)
        .map(|c| (b'a' + (c.to_digit(16).unwrap_or(0) as u8)) as char)
        .collect()
}

pub fn unique_email() -> String {
    format!("{}.test@{}", unique_local_part(), DOMAIN)
}

pub fn unique_serial() -> String {
    format!("SN-{}", Uuid::new_v4().simple())
}

pub async fn seed_user(db: &Database, role: Role) -> Result<User> {
    let mut tx = db.pool().begin().await?;
    let user = UserRepo::create(
        &mut tx,
        &NewUser {
            name: format!("Test {}", role),
            email: unique_email(),
            phone: None,
            user_type: UserType::FullTime,
            role,
        },
    )
    .await?;
    tx.commit().await?;
    Ok(user)
}

pub async fn seed_actor(db: &Database, role: Role) -> Result<Actor> {
    let user = seed_user(db, role).await?;
    Ok(Actor::new(user.id, role))
}

pub fn laptop_request(brand: &str, model: &str, serial_no: &str) -> CreateAssetRequest {
    CreateAssetRequest {
        model: CreateModelRequest {
            name: model.to_string(),
            asset_type: "laptop".to_string(),
            brand: BrandRef { name: brand.to_string() },
        },
        serial_no: serial_no.to_string(),
        owned_by: OwnedBy::RemoteState,
        purchased_date: NaiveDate::from_ymd_opt(2024, 1, 15),
        warranty_start_date: NaiveDate::from_ymd_opt(2024, 1, 15),
        warranty_exp_date: NaiveDate::from_ymd_opt(2027, 1, 15),
        specs: json!({
            "processor": "i7-1365U",
            "ram_gb": 16,
            "storage_gb": 512,
            "storage_type": "SSD",
            "screen_size_inch": 14.0,
            "has_charger": true
        }),
        status: None,
    }
}

/// Laptop under a brand unique to the calling test
pub async fn create_laptop(assets: &AssetService, actor: &Actor) -> Result<Uuid> {
    let brand = format!("Brand {}", unique_local_part());
    Ok(assets
        .create(actor, laptop_request(&brand, "Latitude 7440", &unique_serial()))
        .await?)
}
