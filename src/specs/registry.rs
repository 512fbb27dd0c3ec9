//! Variant records for each asset type and the dispatch between them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{PgConnection, PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use super::patch::FieldPatch;
use super::SpecsError;
use crate::database::DatabaseError;
use crate::types::AssetType;

/// Generate one record struct and one patch struct per asset type, plus the
/// `AssetSpecs` / `SpecsPatch` sum types dispatching over them.
///
/// Each variant lists `field: Type as "column"`. Every field is required on
/// create; on update every field is a [`FieldPatch`] and only `Set` values
/// are written.
macro_rules! specs_registry {
    (
        $(
            $variant:ident => $record:ident, $patch:ident, $table:literal {
                $($field:ident: $ty:ty as $col:literal),+ $(,)?
            }
        )+
    ) => {
        $(
            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
            pub struct $record {
                $(
                    #[serde(rename = $col)]
                    #[sqlx(rename = $col)]
                    pub $field: $ty,
                )+
            }

            impl $record {
                pub const TABLE: &'static str = $table;
                pub const COLUMNS: &'static [&'static str] = &[$($col),+];

                async fn insert(&self, conn: &mut PgConnection) -> Result<Uuid, DatabaseError> {
                    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
                    qb.push(Self::TABLE).push(" (");
                    let mut columns = qb.separated(", ");
                    for column in Self::COLUMNS {
                        columns.push(*column);
                    }
                    qb.push(") VALUES (");
                    let mut values = qb.separated(", ");
                    $( values.push_bind(self.$field.clone()); )+
                    qb.push(") RETURNING id");

                    let id = qb.build_query_scalar::<Uuid>().fetch_one(&mut *conn).await?;
                    Ok(id)
                }

                async fn fetch<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, DatabaseError>
                where
                    E: PgExecutor<'e>,
                {
                    let query = format!(
                        "SELECT {} FROM {} WHERE id = $1",
                        Self::COLUMNS.join(", "),
                        Self::TABLE
                    );
                    let row = sqlx::query_as::<_, Self>(&query)
                        .bind(id)
                        .fetch_optional(executor)
                        .await?;
                    Ok(row)
                }
            }

            #[derive(Debug, Clone, Default, PartialEq, Deserialize)]
            pub struct $patch {
                $(
                    #[serde(rename = $col, default)]
                    pub $field: FieldPatch<$ty>,
                )+
            }

            impl $patch {
                /// Columns this patch will write
                pub fn changed_columns(&self) -> Vec<&'static str> {
                    let mut columns = Vec::new();
                    $(
                        match &self.$field {
                            FieldPatch::Set(_) => columns.push($col),
                            FieldPatch::Null => {
                                tracing::debug!(table = $table, column = $col, "ignoring explicit null in specs update");
                            }
                            FieldPatch::Absent => {}
                        }
                    )+
                    columns
                }

                async fn apply(&self, conn: &mut PgConnection, id: Uuid) -> Result<bool, DatabaseError> {
                    if self.changed_columns().is_empty() {
                        return Ok(false);
                    }

                    let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
                    qb.push($table).push(" SET ");
                    let mut sets = qb.separated(", ");
                    $(
                        if let FieldPatch::Set(value) = &self.$field {
                            sets.push(concat!($col, " = "));
                            sets.push_bind_unseparated(value.clone());
                        }
                    )+
                    qb.push(" WHERE id = ");
                    qb.push_bind(id);

                    let result = qb.build().execute(&mut *conn).await?;
                    if result.rows_affected() == 0 {
                        return Err(DatabaseError::NotFound(format!("{} row {}", $table, id)));
                    }
                    Ok(true)
                }
            }
        )+

        /// Type-specific attributes of one asset
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum AssetSpecs {
            $($variant($record)),+
        }

        /// Partial update of one asset's specs row
        #[derive(Debug, Clone, PartialEq)]
        pub enum SpecsPatch {
            $($variant($patch)),+
        }

        impl AssetSpecs {
            /// Coerce a loosely-typed payload into the variant for `asset_type`
            pub fn from_payload(asset_type: AssetType, payload: &Value) -> Result<Self, SpecsError> {
                match asset_type {
                    $(
                        AssetType::$variant => serde_json::from_value::<$record>(payload.clone())
                            .map(AssetSpecs::$variant)
                            .map_err(|e| SpecsError::validation(asset_type, e)),
                    )+
                }
            }

            pub fn asset_type(&self) -> AssetType {
                match self {
                    $(AssetSpecs::$variant(_) => AssetType::$variant),+
                }
            }

            pub fn table(&self) -> &'static str {
                match self {
                    $(AssetSpecs::$variant(_) => $record::TABLE),+
                }
            }

            pub(super) async fn insert(&self, conn: &mut PgConnection) -> Result<Uuid, DatabaseError> {
                match self {
                    $(AssetSpecs::$variant(record) => record.insert(conn).await),+
                }
            }

            pub(super) async fn fetch<'e, E>(
                executor: E,
                asset_type: AssetType,
                id: Uuid,
            ) -> Result<Option<Self>, DatabaseError>
            where
                E: PgExecutor<'e>,
            {
                match asset_type {
                    $(
                        AssetType::$variant => Ok($record::fetch(executor, id).await?.map(AssetSpecs::$variant)),
                    )+
                }
            }
        }

        impl SpecsPatch {
            pub fn from_payload(asset_type: AssetType, payload: &Value) -> Result<Self, SpecsError> {
                match asset_type {
                    $(
                        AssetType::$variant => serde_json::from_value::<$patch>(payload.clone())
                            .map(SpecsPatch::$variant)
                            .map_err(|e| SpecsError::validation(asset_type, e)),
                    )+
                }
            }

            pub fn changed_columns(&self) -> Vec<&'static str> {
                match self {
                    $(SpecsPatch::$variant(patch) => patch.changed_columns()),+
                }
            }

            pub fn is_empty(&self) -> bool {
                self.changed_columns().is_empty()
            }

            pub(super) async fn apply(&self, conn: &mut PgConnection, id: Uuid) -> Result<bool, DatabaseError> {
                match self {
                    $(SpecsPatch::$variant(patch) => patch.apply(conn, id).await),+
                }
            }
        }
    };
}

specs_registry! {
    Laptop => LaptopSpecs, LaptopSpecsPatch, "laptop_specs" {
        processor: String as "processor",
        ram_gb: i32 as "ram_gb",
        storage_gb: i32 as "storage_gb",
        storage_type: String as "storage_type",
        screen_size_inch: f64 as "screen_size_inch",
        has_charger: bool as "has_charger",
    }
    Mouse => MouseSpecs, MouseSpecsPatch, "mouse_specs" {
        kind: String as "type",
        dpi: i32 as "dpi",
        number_of_buttons: i32 as "number_of_buttons",
    }
    Monitor => MonitorSpecs, MonitorSpecsPatch, "monitor_specs" {
        screen_size_inch: f64 as "screen_size_inch",
        resolution: String as "resolution",
        refresh_rate: i32 as "refresh_rate",
        panel_type: String as "panel_type",
    }
    Mobile => MobileSpecs, MobileSpecsPatch, "mobile_specs" {
        os: String as "os",
        ram_gb: i32 as "ram_gb",
        storage_gb: i32 as "storage_gb",
        has_dual_sim: bool as "has_dual_sim",
    }
    Sim => SimSpecs, SimSpecsPatch, "sim_specs" {
        carrier: String as "carrier",
        phone_number: String as "phone_number",
        data_limit_gb: i32 as "data_limit_gb",
    }
    HardDisk => HardDiskSpecs, HardDiskSpecsPatch, "hard_disk_specs" {
        capacity_gb: i32 as "capacity_gb",
        kind: String as "type",
    }
    PenDrive => PenDriveSpecs, PenDriveSpecsPatch, "pen_drive_specs" {
        capacity_gb: i32 as "capacity_gb",
        usb_version: String as "usb_version",
    }
    Accessories => AccessorySpecs, AccessorySpecsPatch, "accessory_specs" {
        name: String as "name",
        description: String as "description",
        compatible_with: String as "compatible_with",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn laptop_payload() -> Value {
        json!({
            "processor": "i7",
            "ram_gb": 16,
            "storage_gb": 512,
            "storage_type": "SSD",
            "screen_size_inch": 14.0,
            "has_charger": true
        })
    }

    #[test]
    fn every_asset_type_has_a_variant() {
        for asset_type in AssetType::ALL {
            let err = AssetSpecs::from_payload(*asset_type, &json!({})).unwrap_err();
            assert!(matches!(err, SpecsError::Validation { .. }), "{asset_type}: {err}");
        }
    }

    #[test]
    fn coerces_laptop_payload() {
        let specs = AssetSpecs::from_payload(AssetType::Laptop, &laptop_payload()).unwrap();
        assert_eq!(specs.asset_type(), AssetType::Laptop);
        assert_eq!(specs.table(), "laptop_specs");
        let AssetSpecs::Laptop(laptop) = &specs else {
            panic!("expected laptop specs");
        };
        assert_eq!(laptop.ram_gb, 16);
        assert!(laptop.has_charger);
        assert_eq!(serde_json::to_value(&specs).unwrap(), laptop_payload());
    }

    #[test]
    fn missing_required_field_fails_validation() {
        let mut payload = laptop_payload();
        payload.as_object_mut().unwrap().remove("processor");
        let err = AssetSpecs::from_payload(AssetType::Laptop, &payload).unwrap_err();
        assert!(err.to_string().contains("processor"));
    }

    #[test]
    fn wrong_field_type_fails_validation() {
        let payload = json!({"capacity_gb": "lots", "usb_version": "3.0"});
        let err = AssetSpecs::from_payload(AssetType::PenDrive, &payload).unwrap_err();
        assert!(matches!(err, SpecsError::Validation { asset_type: AssetType::PenDrive, .. }));
    }

    #[test]
    fn type_column_maps_to_kind_field() {
        let specs = AssetSpecs::from_payload(
            AssetType::Mouse,
            &json!({"type": "wireless", "dpi": 1600, "number_of_buttons": 5}),
        )
        .unwrap();
        let AssetSpecs::Mouse(mouse) = specs else {
            panic!("expected mouse specs");
        };
        assert_eq!(mouse.kind, "wireless");
    }

    #[test]
    fn patch_only_writes_supplied_fields() {
        let patch = SpecsPatch::from_payload(AssetType::Laptop, &json!({"ram_gb": 32})).unwrap();
        assert_eq!(patch.changed_columns(), vec!["ram_gb"]);
        assert!(!patch.is_empty());
    }

    #[test]
    fn explicit_null_is_not_written() {
        let patch = SpecsPatch::from_payload(
            AssetType::Sim,
            &json!({"carrier": null, "data_limit_gb": 10}),
        )
        .unwrap();
        assert_eq!(patch.changed_columns(), vec!["data_limit_gb"]);
        let SpecsPatch::Sim(sim) = &patch else {
            panic!("expected sim patch");
        };
        assert_eq!(sim.carrier, FieldPatch::Null);
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let patch = SpecsPatch::from_payload(AssetType::Monitor, &json!({})).unwrap();
        assert!(patch.is_empty());
    }
}
