//! User directory operations and password-less login.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::ServiceError;
use crate::auth::{display_name, EmailPolicy, TokenIssuer};
use crate::database::models::{NewUser, User, UserDetails, UserListFilter, UserPatch, UserSummary, UserTimelineEntry};
use crate::database::{Database, DatabaseError, LedgerRepo, UserRepo};
use crate::filter::Page;
use crate::types::{Actor, Role, UserType};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
    /// The caller's last access token; it may already be expired
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(default = "default_user_type")]
    pub user_type: UserType,
    pub role: Role,
}

fn default_user_type() -> UserType {
    UserType::FullTime
}

#[derive(Clone, Debug)]
pub struct UserService {
    db: Database,
    tokens: TokenIssuer,
    emails: EmailPolicy,
}

impl UserService {
    pub fn new(db: Database, tokens: TokenIssuer, emails: EmailPolicy) -> Self {
        Self { db, tokens, emails }
    }

    /// Log in by email. Unknown addresses at the allowed domain are
    /// provisioned as employees.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, ServiceError> {
        let email = self.emails.validate(&req.email)?;

        let user = match UserRepo::find_active_by_email(self.db.pool(), &email).await? {
            Some(user) => user,
            None => self.self_provision(&email).await?,
        };

        let roles = UserRepo::roles(self.db.pool(), user.id).await?;
        let role = pick_role(&roles, req.role)?;

        let access_token = self.tokens.issue_access(user.id, role)?;
        let refresh_token = self.tokens.issue_refresh(user.id)?;

        info!(user_id = %user.id, %role, "User logged in");
        Ok(LoginResponse {
            access_token,
            refresh_token: Some(refresh_token),
            role,
            user: Some(user),
        })
    }

    /// Exchange a refresh token plus the matching (possibly expired) access
    /// token for a fresh access token carrying the same role
    pub async fn refresh(&self, req: RefreshRequest) -> Result<LoginResponse, ServiceError> {
        let refresh = self.tokens.verify_refresh(&req.refresh_token)?;
        let access = self.tokens.decode_expired_access(&req.access_token)?;
        if refresh.user_id != access.user_id {
            return Err(ServiceError::Unauthorized("token pair does not belong to one user".to_string()));
        }

        if UserRepo::find_active(self.db.pool(), refresh.user_id).await?.is_none() {
            return Err(ServiceError::Unauthorized("user no longer exists".to_string()));
        }
        let roles = UserRepo::roles(self.db.pool(), refresh.user_id).await?;
        if !roles.contains(&access.role) {
            return Err(ServiceError::forbidden(format!("user no longer holds role {}", access.role)));
        }

        let access_token = self.tokens.issue_access(refresh.user_id, access.role)?;
        Ok(LoginResponse {
            access_token,
            refresh_token: None,
            role: access.role,
            user: None,
        })
    }

    /// Register a user on behalf of an admin or employee manager
    pub async fn create(&self, actor: &Actor, req: CreateUserRequest) -> Result<User, ServiceError> {
        actor.role.can_create(req.role).map_err(ServiceError::forbidden)?;

        let name = req.name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("name is required"));
        }
        let email = self.emails.validate(&req.email)?;
        let phone = normalize_phone(req.phone.as_deref())?;

        let mut tx = self.db.pool().begin().await?;
        if UserRepo::find_active_by_email(&mut *tx, &email).await?.is_some() {
            return Err(ServiceError::conflict("a user with this email already exists"));
        }
        let user = UserRepo::create(
            &mut tx,
            &NewUser {
                name: name.to_string(),
                email,
                phone,
                user_type: req.user_type,
                role: req.role,
            },
        )
        .await?;
        tx.commit().await?;

        info!(user_id = %user.id, role = %req.role, created_by = %actor.user_id, "User created");
        Ok(user)
    }

    pub async fn update(&self, actor: &Actor, user_id: Uuid, mut patch: UserPatch) -> Result<User, ServiceError> {
        if let Some(name) = patch.name.as_mut() {
            *name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::validation("name cannot be empty"));
            }
        }
        if let Some(email) = patch.email.take() {
            patch.email = Some(self.emails.validate(&email)?);
        }
        if patch.phone.is_some() {
            patch.phone = normalize_phone(patch.phone.as_deref())?;
        }

        let mut tx = self.db.pool().begin().await?;
        let user = UserRepo::update(&mut tx, user_id, &patch, actor.user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("user {} not found", user_id)))?;
        tx.commit().await?;

        info!(%user_id, updated_by = %actor.user_id, "User updated");
        Ok(user)
    }

    /// Soft-delete a user who holds no assets
    pub async fn delete(&self, actor: &Actor, user_id: Uuid) -> Result<(), ServiceError> {
        if user_id == actor.user_id {
            return Err(ServiceError::forbidden("users cannot delete themselves"));
        }

        let mut tx = self.db.pool().begin().await?;

        if !UserRepo::lock_active(&mut tx, user_id, true).await? {
            return Err(ServiceError::not_found(format!("user {} not found", user_id)));
        }
        let active = LedgerRepo::count_active_assignments(&mut *tx, user_id).await?;
        if active > 0 {
            return Err(ServiceError::invalid_state(format!(
                "user still has {} assigned asset(s); retrieve them first",
                active
            )));
        }
        UserRepo::soft_delete(&mut tx, user_id, actor.user_id).await?;

        tx.commit().await?;

        info!(%user_id, deleted_by = %actor.user_id, "User deleted");
        Ok(())
    }

    pub async fn list(&self, filter: &UserListFilter, page: Page) -> Result<Vec<UserSummary>, ServiceError> {
        Ok(UserRepo::list(self.db.pool(), filter, page).await?)
    }

    pub async fn details(&self, user_id: Uuid) -> Result<UserDetails, ServiceError> {
        let user = UserRepo::summary(self.db.pool(), user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("user {} not found", user_id)))?;
        let assigned_assets = UserRepo::assigned_assets(self.db.pool(), user_id).await?;
        Ok(UserDetails { user, assigned_assets })
    }

    pub async fn timeline(&self, user_id: Uuid) -> Result<Vec<UserTimelineEntry>, ServiceError> {
        Ok(LedgerRepo::user_timeline(self.db.pool(), user_id).await?)
    }

    pub async fn active_assignment_count(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        Ok(LedgerRepo::count_active_assignments(self.db.pool(), user_id).await?)
    }

    async fn self_provision(&self, email: &str) -> Result<User, ServiceError> {
        let mut tx = self.db.pool().begin().await?;
        let created = UserRepo::create(
            &mut tx,
            &NewUser {
                name: display_name(email),
                email: email.to_string(),
                phone: None,
                user_type: UserType::FullTime,
                role: Role::Employee,
            },
        )
        .await;

        let user = match created {
            Ok(user) => {
                tx.commit().await?;
                user
            }
            // A concurrent first login for the same address won the insert
            Err(DatabaseError::Conflict { .. }) => {
                drop(tx);
                return UserRepo::find_active_by_email(self.db.pool(), email)
                    .await?
                    .ok_or_else(|| ServiceError::conflict("a user with this email already exists"));
            }
            Err(err) => return Err(err.into()),
        };

        info!(user_id = %user.id, "Provisioned user on first login");
        Ok(user)
    }
}

/// The requested role if held, otherwise the most privileged role held
fn pick_role(held: &[Role], requested: Option<Role>) -> Result<Role, ServiceError> {
    match requested {
        Some(role) if held.contains(&role) => Ok(role),
        Some(role) => Err(ServiceError::forbidden(format!("user does not hold role {}", role))),
        None => held
            .iter()
            .copied()
            .min_by_key(Role::rank)
            .ok_or_else(|| ServiceError::forbidden("user has no roles")),
    }
}

/// Phone numbers are exactly ten digits; blank means none
fn normalize_phone(phone: Option<&str>) -> Result<Option<String>, ServiceError> {
    match phone.map(str::trim) {
        None | Some("") => Ok(None),
        Some(p) if p.len() == 10 && p.bytes().all(|b| b.is_ascii_digit()) => Ok(Some(p.to_string())),
        Some(p) => Err(ServiceError::validation(format!("phone must be exactly 10 digits: {}", p))),
    }
}
