pub mod asset_service;
pub mod user_service;

use thiserror::Error;

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::specs::SpecsError;

pub use asset_service::{AssetService, AssignAssetRequest, CreateAssetRequest, CreateModelRequest, UpdateAssetRequest};
pub use user_service::{CreateUserRequest, LoginRequest, LoginResponse, RefreshRequest, UserService};

/// Outcome kinds of a core operation. The transport maps each kind to one status code.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("unsupported asset type: {0}")]
    UnsupportedType(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Persistence(DatabaseError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        ServiceError::InvalidState(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(what) => ServiceError::NotFound(format!("{} not found", what)),
            DatabaseError::Conflict { constraint } => ServiceError::Conflict(conflict_message(constraint.as_deref())),
            DatabaseError::ForeignKey { constraint } => ServiceError::NotFound(format!(
                "referenced record does not exist ({})",
                constraint.as_deref().unwrap_or("unknown")
            )),
            other => ServiceError::Persistence(other),
        }
    }
}

fn conflict_message(constraint: Option<&str>) -> String {
    match constraint {
        Some("assets_serial_no_key") => "an asset with this serial number already exists".to_string(),
        Some("users_active_email_key") => "a user with this email already exists".to_string(),
        Some("asset_status_one_active_assignment") => "asset is not available for assignment".to_string(),
        Some(other) => format!("duplicate value violates {}", other),
        None => "duplicate value".to_string(),
    }
}

impl From<SpecsError> for ServiceError {
    fn from(err: SpecsError) -> Self {
        match err {
            SpecsError::UnsupportedType(tag) => ServiceError::UnsupportedType(tag),
            SpecsError::Validation { .. } => ServiceError::Validation(err.to_string()),
            SpecsError::Database(db) => db.into(),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail(_) => ServiceError::Validation(err.to_string()),
            AuthError::Expired | AuthError::InvalidToken(_) => ServiceError::Unauthorized(err.to_string()),
            AuthError::TokenGeneration(_) | AuthError::InvalidSecret | AuthError::InvalidTtl(_) => {
                ServiceError::Internal(err.to_string())
            }
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetType;

    #[test]
    fn unique_violations_become_conflicts() {
        let err: ServiceError = DatabaseError::Conflict {
            constraint: Some("assets_serial_no_key".into()),
        }
        .into();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m.contains("serial number")));
    }

    #[test]
    fn missing_foreign_row_is_not_found() {
        let err: ServiceError = DatabaseError::ForeignKey { constraint: None }.into();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn specs_errors_keep_their_kind() {
        let unsupported: ServiceError = SpecsError::UnsupportedType("toaster".into()).into();
        assert!(matches!(unsupported, ServiceError::UnsupportedType(_)));

        let invalid: ServiceError = SpecsError::Validation {
            asset_type: AssetType::Sim,
            message: "missing field `carrier`".into(),
        }
        .into();
        assert!(matches!(invalid, ServiceError::Validation(ref m) if m.contains("carrier")));
    }

    #[test]
    fn token_failures_are_unauthorized() {
        let err: ServiceError = AuthError::Expired.into();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }
}
