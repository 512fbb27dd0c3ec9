/// Shared domain types used across the codebase

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when a string does not name a known variant of a closed enumeration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $pg:literal, $kind:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        #[serde(rename_all = "snake_case")]
        #[sqlx(type_name = $pg, rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl sqlx::postgres::PgHasArrayType for $name {
            fn array_type_info() -> sqlx::postgres::PgTypeInfo {
                sqlx::postgres::PgTypeInfo::with_name(concat!("_", $pg))
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant { kind: $kind, value: other.to_string() }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// Discriminator selecting the specs table an asset's attributes live in
    AssetType as "asset_type", "asset type" {
        Laptop => "laptop",
        Mouse => "mouse",
        Monitor => "monitor",
        Mobile => "mobile",
        Sim => "sim",
        HardDisk => "hard_disk",
        PenDrive => "pen_drive",
        Accessories => "accessories",
    }
}

string_enum! {
    /// Status recorded on an assignment ledger row
    AssetStatusKind as "asset_status_kind", "asset status" {
        Available => "available",
        Assigned => "assigned",
        InService => "in_service",
    }
}

string_enum! {
    OwnedBy as "owned_by", "owner" {
        RemoteState => "remote_state",
        Client => "client",
    }
}

string_enum! {
    Role as "user_role", "role" {
        Admin => "admin",
        EmployeeManager => "employee_manager",
        AssetManager => "asset_manager",
        Employee => "employee",
    }
}

string_enum! {
    UserType as "user_type", "user type" {
        FullTime => "full_time",
        Intern => "intern",
        Freelancer => "freelancer",
    }
}

impl Role {
    /// Lower is more privileged; used to pick a default role at login
    pub fn rank(&self) -> u8 {
        match self {
            Role::Admin => 0,
            Role::EmployeeManager => 1,
            Role::AssetManager => 2,
            Role::Employee => 3,
        }
    }

    /// Whether a user acting with this role may create a user holding `target`
    pub fn can_create(&self, target: Role) -> Result<(), &'static str> {
        match (self, target) {
            (Role::Admin, Role::Admin) => Err("admins cannot create another admin"),
            (Role::Admin, _) => Ok(()),
            (Role::EmployeeManager, Role::Employee) => Ok(()),
            (Role::EmployeeManager, _) => Err("employee managers can only create employees"),
            (Role::AssetManager, _) => Err("asset managers are not allowed to create users"),
            (Role::Employee, _) => Err("employees are not allowed to create users"),
        }
    }
}

/// Authenticated caller of a core operation, as established by the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_type_round_trips_through_text() {
        for asset_type in AssetType::ALL {
            assert_eq!(asset_type.as_str().parse::<AssetType>().unwrap(), *asset_type);
        }
        assert_eq!(AssetType::ALL.len(), 8);
    }

    #[test]
    fn unknown_asset_type_is_rejected() {
        let err = "toaster".parse::<AssetType>().unwrap_err();
        assert_eq!(err.kind, "asset type");
        assert_eq!(err.value, "toaster");
    }

    #[test]
    fn serde_uses_snake_case_tags() {
        let json = serde_json::to_string(&AssetType::HardDisk).unwrap();
        assert_eq!(json, "\"hard_disk\"");
        let role: Role = serde_json::from_str("\"employee_manager\"").unwrap();
        assert_eq!(role, Role::EmployeeManager);
    }

    #[test]
    fn creator_role_policy() {
        assert!(Role::Admin.can_create(Role::Admin).is_err());
        assert!(Role::Admin.can_create(Role::AssetManager).is_ok());
        assert!(Role::EmployeeManager.can_create(Role::Employee).is_ok());
        assert!(Role::EmployeeManager.can_create(Role::AssetManager).is_err());
        assert!(Role::AssetManager.can_create(Role::Employee).is_err());
    }

    #[test]
    fn admin_outranks_everyone() {
        let mut roles = vec![Role::Employee, Role::Admin, Role::AssetManager];
        roles.sort_by_key(Role::rank);
        assert_eq!(roles[0], Role::Admin);
    }
}
