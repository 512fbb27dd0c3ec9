mod common;

use anyhow::Result;
use common::{create_laptop, laptop_request};
use serde_json::json;
use storex::database::models::{AssetListFilter, AssetPatch};
use storex::database::{CatalogRepo, Database};
use storex::filter::Page;
use storex::services::{AssetService, AssignAssetRequest, ServiceError, UpdateAssetRequest};
use storex::specs::{AssetSpecs, LaptopSpecs};
use storex::types::{Actor, AssetStatusKind, AssetType, OwnedBy, Role};
use uuid::Uuid;

#[tokio::test]
async fn brand_and_model_are_reused_case_insensitively() -> Result<()> {
    let Some(db) = common::test_db().await? else { return Ok(()) };
    let assets = common::asset_service(&db);
    let actor = common::seed_actor(&db, Role::AssetManager).await?;

    let brand = format!("Dell{}", common::unique_local_part());
    let first = assets
        .create(&actor, laptop_request(&brand, "Latitude", &common::unique_serial()))
        .await?;
    let second = assets
        .create(&actor, laptop_request(&brand.to_lowercase(), "LATITUDE", &common::unique_serial()))
        .await?;

    let first = assets.find(first).await?;
    let second = assets.find(second).await?;
    assert_eq!(first.brand_id, second.brand_id);
    assert_eq!(first.model_id, second.model_id);
    assert_eq!(first.brand_name, brand);
    Ok(())
}

#[tokio::test]
async fn created_asset_reads_back_with_specs_and_available_status() -> Result<()> {
    let Some(db) = common::test_db().await? else { return Ok(()) };
    let assets = common::asset_service(&db);
    let actor = common::seed_actor(&db, Role::AssetManager).await?;

    let asset_id = create_laptop(&assets, &actor).await?;
    let detail = assets.detail(asset_id).await?;

    assert_eq!(detail.asset.asset_type, AssetType::Laptop);
    assert_eq!(detail.asset.status, AssetStatusKind::Available);
    assert_eq!(detail.asset.assigned_to, None);
    let AssetSpecs::Laptop(laptop) = &detail.specs else {
        panic!("expected laptop specs, got {:?}", detail.specs);
    };
    let expected = LaptopSpecs {
        processor: "i7-1365U".to_string(),
        ram_gb: 16,
        storage_gb: 512,
        storage_type: "SSD".to_string(),
        screen_size_inch: 14.0,
        has_charger: true,
    };
    assert_eq!(laptop, &expected);
    assert!(assets.is_available(asset_id).await?);
    Ok(())
}

#[tokio::test]
async fn invalid_payloads_leave_nothing_behind() -> Result<()> {
    let Some(db) = common::test_db().await? else { return Ok(()) };
    let assets = common::asset_service(&db);
    let actor = common::seed_actor(&db, Role::AssetManager).await?;

    let serial = common::unique_serial();
    let mut req = laptop_request("Lenovo", "T14", &serial);
    req.specs = json!({ "processor": "i5" });
    let err = assets.create(&actor, req).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "got {:?}", err);

    let mut req = laptop_request("Lenovo", "T14", &serial);
    req.model.asset_type = "toaster".to_string();
    let err = assets.create(&actor, req).await.unwrap_err();
    assert!(matches!(err, ServiceError::UnsupportedType(_)), "got {:?}", err);

    let filter = AssetListFilter {
        search: Some(serial),
        ..Default::default()
    };
    assert!(assets.list(&filter, Page::new(None, None, 10, 100)).await?.is_empty());
    Ok(())
}

async fn brand_rows(db: &Database, name: &str) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM asset_brands WHERE lower(name) = lower($1)")
        .bind(name)
        .fetch_one(db.pool())
        .await?;
    Ok(count)
}

#[tokio::test]
async fn failed_create_rolls_back_new_brand_and_model() -> Result<()> {
    let Some(db) = common::test_db().await? else { return Ok(()) };
    let assets = common::asset_service(&db);
    let actor = common::seed_actor(&db, Role::AssetManager).await?;

    let brand = format!("Fresh{}", common::unique_local_part());
    let mut req = laptop_request(&brand, "Ghost", &common::unique_serial());
    req.specs = json!({ "processor": "i5" });
    let err = assets.create(&actor, req).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "got {:?}", err);
    assert_eq!(brand_rows(&db, &brand).await?, 0);

    let taken = common::unique_serial();
    create_laptop_with_serial(&assets, &actor, &taken).await?;
    let other_brand = format!("Fresh{}", common::unique_local_part());
    let err = assets
        .create(&actor, laptop_request(&other_brand, "Ghost", &taken))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)), "got {:?}", err);
    assert_eq!(brand_rows(&db, &other_brand).await?, 0);

    let models: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM asset_models m JOIN asset_brands b ON b.id = m.brand_id
         WHERE lower(b.name) IN (lower($1), lower($2))",
    )
    .bind(&brand)
    .bind(&other_brand)
    .fetch_one(db.pool())
    .await?;
    assert_eq!(models, 0);
    Ok(())
}

async fn create_laptop_with_serial(assets: &AssetService, actor: &Actor, serial_no: &str) -> Result<Uuid> {
    let brand = format!("Brand {}", common::unique_local_part());
    Ok(assets.create(actor, laptop_request(&brand, "Latitude", serial_no)).await?)
}

#[tokio::test]
async fn catalog_lookups_return_the_stored_rows() -> Result<()> {
    let Some(db) = common::test_db().await? else { return Ok(()) };
    let name = format!("Dell{}", common::unique_local_part());

    let mut tx = db.pool().begin().await?;
    let first = CatalogRepo::get_or_create_brand(&mut tx, &name).await?;
    let again = CatalogRepo::get_or_create_brand(&mut tx, &name.to_lowercase()).await?;
    assert_eq!(first.id, again.id);
    assert_eq!(again.name, name);

    let model = CatalogRepo::get_or_create_model(&mut tx, first.id, "XPS 13", AssetType::Laptop).await?;
    let same = CatalogRepo::get_or_create_model(&mut tx, first.id, "xps 13", AssetType::Laptop).await?;
    let mouse = CatalogRepo::get_or_create_model(&mut tx, first.id, "XPS 13", AssetType::Mouse).await?;
    assert_eq!(model.id, same.id);
    assert_eq!(model.brand_id, first.id);
    assert_eq!(model.asset_type, AssetType::Laptop);
    assert_ne!(model.id, mouse.id);
    tx.rollback().await?;
    Ok(())
}

#[tokio::test]
async fn padded_serial_on_update_still_conflicts() -> Result<()> {
    let Some(db) = common::test_db().await? else { return Ok(()) };
    let assets = common::asset_service(&db);
    let actor = common::seed_actor(&db, Role::AssetManager).await?;

    let taken = common::unique_serial();
    create_laptop_with_serial(&assets, &actor, &taken).await?;
    let other = create_laptop(&assets, &actor).await?;

    let padded = UpdateAssetRequest {
        fields: AssetPatch {
            serial_no: Some(format!("  {} ", taken)),
            ..Default::default()
        },
        specs: None,
    };
    let err = assets.update(&actor, other, padded).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)), "got {:?}", err);

    let fresh = common::unique_serial();
    let renamed = UpdateAssetRequest {
        fields: AssetPatch {
            serial_no: Some(format!(" {}\t", fresh)),
            ..Default::default()
        },
        specs: None,
    };
    assets.update(&actor, other, renamed).await?;
    assert_eq!(assets.find(other).await?.serial_no, fresh);
    Ok(())
}

#[tokio::test]
async fn duplicate_serial_number_is_a_conflict() -> Result<()> {
    let Some(db) = common::test_db().await? else { return Ok(()) };
    let assets = common::asset_service(&db);
    let actor = common::seed_actor(&db, Role::AssetManager).await?;

    let serial = common::unique_serial();
    assets.create(&actor, laptop_request("HP", "EliteBook", &serial)).await?;
    let err = assets
        .create(&actor, laptop_request("HP", "EliteBook", &serial))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)), "got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn partial_update_touches_only_supplied_fields() -> Result<()> {
    let Some(db) = common::test_db().await? else { return Ok(()) };
    let assets = common::asset_service(&db);
    let actor = common::seed_actor(&db, Role::AssetManager).await?;

    let asset_id = create_laptop(&assets, &actor).await?;
    let before = assets.find(asset_id).await?;

    let req = UpdateAssetRequest {
        fields: AssetPatch {
            owned_by: Some(OwnedBy::Client),
            ..Default::default()
        },
        specs: Some(json!({ "ram_gb": 32, "processor": null })),
    };
    assets.update(&actor, asset_id, req).await?;

    let after = assets.detail(asset_id).await?;
    assert_eq!(after.asset.owned_by, OwnedBy::Client);
    assert_eq!(after.asset.serial_no, before.serial_no);
    assert_eq!(after.asset.purchased_date, before.purchased_date);
    let AssetSpecs::Laptop(laptop) = &after.specs else {
        panic!("expected laptop specs");
    };
    assert_eq!(laptop.ram_gb, 32);
    assert_eq!(laptop.processor, "i7-1365U");
    assert_eq!(laptop.storage_gb, 512);
    Ok(())
}

#[tokio::test]
async fn assign_and_retrieve_cycle() -> Result<()> {
    let Some(db) = common::test_db().await? else { return Ok(()) };
    let assets = common::asset_service(&db);
    let actor = common::seed_actor(&db, Role::AssetManager).await?;
    let holder = common::seed_user(&db, Role::Employee).await?;
    let other = common::seed_user(&db, Role::Employee).await?;

    let asset_id = create_laptop(&assets, &actor).await?;
    let assign = |user_id| AssignAssetRequest { asset_id, user_id };

    let entry = assets.assign(&actor, assign(holder.id)).await?;
    assert_eq!(entry.status, AssetStatusKind::Assigned);
    assert_eq!(entry.assigned_to_user, Some(holder.id));
    assert!(!assets.is_available(asset_id).await?);

    let err = assets.assign(&actor, assign(other.id)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)), "got {:?}", err);

    let current = assets.find(asset_id).await?;
    assert_eq!(current.status, AssetStatusKind::Assigned);
    assert_eq!(current.assigned_to, Some(holder.id));

    let err = assets.archive(&actor, asset_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)), "got {:?}", err);

    assets.retrieve(&actor, asset_id).await?;
    assert!(assets.is_available(asset_id).await?);
    let err = assets.retrieve(&actor, asset_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)), "got {:?}", err);

    assets.assign(&actor, assign(other.id)).await?;
    assets.retrieve(&actor, asset_id).await?;

    let timeline = assets.timeline(asset_id).await?;
    let assignments: Vec<_> = timeline
        .iter()
        .filter(|e| e.status == AssetStatusKind::Assigned)
        .collect();
    assert_eq!(assignments.len(), 2);
    assert_eq!(assignments[0].assigned_to_user, Some(holder.id));
    assert_eq!(assignments[1].assigned_to_user, Some(other.id));
    assert!(assignments.iter().all(|e| e.archived_at.is_some()));

    let history = assets.user_timeline(holder.id).await?;
    assert!(history.iter().any(|e| e.asset_id == asset_id && e.returned_at.is_some()));
    Ok(())
}

#[tokio::test]
async fn concurrent_assignments_leave_one_live_row() -> Result<()> {
    let Some(db) = common::test_db().await? else { return Ok(()) };
    let assets = common::asset_service(&db);
    let actor = common::seed_actor(&db, Role::AssetManager).await?;
    let first = common::seed_user(&db, Role::Employee).await?;
    let second = common::seed_user(&db, Role::Employee).await?;
    let asset_id = create_laptop(&assets, &actor).await?;

    let (a, b) = tokio::join!(
        assets.assign(&actor, AssignAssetRequest { asset_id, user_id: first.id }),
        assets.assign(&actor, AssignAssetRequest { asset_id, user_id: second.id }),
    );
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);

    let live: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM asset_status WHERE asset_id = $1 AND status = 'assigned' AND archived_at IS NULL",
    )
    .bind(asset_id)
    .fetch_one(db.pool())
    .await?;
    assert_eq!(live, 1);
    Ok(())
}

#[tokio::test]
async fn assigning_to_unknown_user_or_asset_is_not_found() -> Result<()> {
    let Some(db) = common::test_db().await? else { return Ok(()) };
    let assets = common::asset_service(&db);
    let actor = common::seed_actor(&db, Role::AssetManager).await?;
    let asset_id = create_laptop(&assets, &actor).await?;

    let err = assets
        .assign(&actor, AssignAssetRequest { asset_id, user_id: Uuid::new_v4() })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {:?}", err);

    let err = assets
        .assign(&actor, AssignAssetRequest { asset_id: Uuid::new_v4(), user_id: actor.user_id })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn archived_assets_leave_listings_but_keep_history() -> Result<()> {
    let Some(db) = common::test_db().await? else { return Ok(()) };
    let assets = common::asset_service(&db);
    let actor = common::seed_actor(&db, Role::AssetManager).await?;
    let asset_id = create_laptop(&assets, &actor).await?;
    let serial = assets.find(asset_id).await?.serial_no;

    assets.archive(&actor, asset_id).await?;

    let err = assets.find(asset_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {:?}", err);
    let filter = AssetListFilter {
        search: Some(serial),
        ..Default::default()
    };
    assert!(assets.list(&filter, Page::new(None, None, 10, 100)).await?.is_empty());
    assert!(!assets.timeline(asset_id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn list_filters_by_search_and_status() -> Result<()> {
    let Some(db) = common::test_db().await? else { return Ok(()) };
    let assets = common::asset_service(&db);
    let actor = common::seed_actor(&db, Role::AssetManager).await?;
    let holder = common::seed_user(&db, Role::Employee).await?;

    let brand = format!("Acme{}", common::unique_local_part());
    let idle = assets
        .create(&actor, laptop_request(&brand, "Alpha", &common::unique_serial()))
        .await?;
    let busy = assets
        .create(&actor, laptop_request(&brand, "Beta", &common::unique_serial()))
        .await?;
    assets.assign(&actor, AssignAssetRequest { asset_id: busy, user_id: holder.id }).await?;

    let by_brand = AssetListFilter {
        search: Some(brand.to_uppercase()),
        ..Default::default()
    };
    let rows = assets.list(&by_brand, Page::new(None, None, 10, 100)).await?;
    assert_eq!(rows.len(), 2);
    // newest first
    assert_eq!(rows[0].id, busy);

    let assigned_only = AssetListFilter {
        status: Some(AssetStatusKind::Assigned),
        ..by_brand.clone()
    };
    let rows = assets.list(&assigned_only, Page::new(None, None, 10, 100)).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, busy);
    assert_eq!(rows[0].assigned_to_name.as_deref(), Some(holder.name.as_str()));

    let page_two = assets.list(&by_brand, Page::new(Some(2), Some(1), 10, 100)).await?;
    assert_eq!(page_two.len(), 1);
    assert_eq!(page_two[0].id, idle);

    let literal_percent = AssetListFilter {
        search: Some("%".to_string()),
        asset_type: Some(AssetType::Sim),
        ..Default::default()
    };
    let rows = assets.list(&literal_percent, Page::new(None, None, 10, 100)).await?;
    assert!(rows.is_empty());
    Ok(())
}
