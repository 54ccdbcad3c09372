use axum::Extension;
use uuid::Uuid;

use crate::auth::{Member, Permission};
use crate::database::models::Role;
use crate::middleware::{ApiResponse, ApiResult, DbPool, Json, Path};
use crate::services::role_service::{NewRole, RoleSummary, RoleUpdate};
use crate::services::RoleService;

/// GET /api/roles
pub async fn role_list(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
) -> ApiResult<Vec<RoleSummary>> {
    let roles = RoleService::new(pool).list(member.organization_id()).await?;
    Ok(ApiResponse::success(roles))
}

/// POST /api/roles
///
/// Expected Input:
/// ```json
/// { "name": "Team lead", "can_manage_tasks": true, "can_manage_attendance": true }
/// ```
/// Flags that are left out default to `false`.
pub async fn role_create(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Json(input): Json<NewRole>,
) -> ApiResult<Role> {
    member.require(Permission::ManageRoles)?;
    let role = RoleService::new(pool).create(&member, input).await?;
    Ok(ApiResponse::created(role))
}

/// GET /api/roles/:id
pub async fn role_get(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<RoleSummary> {
    let role = RoleService::new(pool).get(member.organization_id(), role_id).await?;
    Ok(ApiResponse::success(role))
}

/// PATCH /api/roles/:id
pub async fn role_update(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(role_id): Path<Uuid>,
    Json(input): Json<RoleUpdate>,
) -> ApiResult<Role> {
    member.require(Permission::ManageRoles)?;
    let role = RoleService::new(pool).update(&member, role_id, input).await?;
    Ok(ApiResponse::success(role))
}

/// DELETE /api/roles/:id - refused while anybody holds the role
pub async fn role_delete(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<()> {
    member.require(Permission::ManageRoles)?;
    RoleService::new(pool).delete(member.organization_id(), role_id).await?;
    Ok(ApiResponse::no_content())
}
