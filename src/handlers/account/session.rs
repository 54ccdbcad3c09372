use axum::Extension;
use serde::{Deserialize, Serialize};

use crate::auth::{Account, Permission, PermissionSet};
use crate::database::models::{Organization, Role, User};
use crate::middleware::{ApiResponse, ApiResult, DbPool, Json};
use crate::services::account_service::{ProfileUpdate, Session};
use crate::services::{AccountService, OrganizationService, RoleService};

#[derive(Debug, Serialize)]
pub struct Whoami {
    pub user: User,
    pub organization: Option<Organization>,
    pub role: Option<Role>,
    pub is_owner: bool,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// GET /api/auth/whoami - the caller's account, organization, role and effective permissions
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "user": { "id": "...", "email": "ann@example.com", ... },
///     "organization": { "id": "...", "name": "Acme" },
///     "role": { "id": "...", "name": "Administrator", "is_admin": true, ... },
///     "is_owner": true,
///     "permissions": ["manage_employees", "manage_departments", ...]
///   }
/// }
/// ```
pub async fn whoami(Extension(Account(user)): Extension<Account>, Extension(DbPool(pool)): Extension<DbPool>) -> ApiResult<Whoami> {
    let organization = match user.organization_id {
        Some(id) => OrganizationService::new(pool.clone()).find(id).await?,
        None => None,
    };
    let role = match (&organization, user.role_id) {
        (Some(_), Some(role_id)) => RoleService::new(pool).find(role_id).await?,
        _ => None,
    };

    let is_owner = organization.as_ref().map(|o| o.owner_id == user.id).unwrap_or(false);
    let permissions = if organization.is_some() {
        PermissionSet::resolve(is_owner, role.as_ref()).list()
    } else {
        Vec::new()
    };

    Ok(ApiResponse::success(Whoami {
        user,
        organization,
        role,
        is_owner,
        permissions,
    }))
}

/// POST /api/auth/refresh - issue a fresh token for the caller
pub async fn refresh(Extension(Account(user)): Extension<Account>) -> ApiResult<Session> {
    tracing::debug!("Refreshing token for {}", user.id);
    Ok(ApiResponse::success(AccountService::issue_session(user, None)?))
}

/// PUT /api/auth/password - change the caller's password
pub async fn change_password(
    Extension(Account(user)): Extension<Account>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Json(input): Json<PasswordChange>,
) -> ApiResult<()> {
    AccountService::new(pool)
        .change_password(&user, &input.current_password, &input.new_password)
        .await?;
    Ok(ApiResponse::no_content())
}

/// PATCH /api/auth/profile - update the caller's name and phone
pub async fn update_profile(
    Extension(Account(user)): Extension<Account>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Json(input): Json<ProfileUpdate>,
) -> ApiResult<User> {
    let updated = AccountService::new(pool).update_profile(user.id, input).await?;
    Ok(ApiResponse::success(updated))
}
