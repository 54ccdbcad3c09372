use axum::Extension;
use serde::Serialize;

use crate::auth::Member;
use crate::database::models::Organization;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, DbPool, Json};
use crate::services::organization_service::{OrganizationOverview, OrganizationUpdate};
use crate::services::OrganizationService;

#[derive(Debug, Serialize)]
pub struct OrganizationRemoval {
    pub organization_id: uuid::Uuid,
    pub members_detached: u64,
}

/// GET /api/organization - the caller's organization with owner and counts
pub async fn organization_get(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
) -> ApiResult<OrganizationOverview> {
    let overview = OrganizationService::new(pool).overview(member.organization).await?;
    Ok(ApiResponse::success(overview))
}

/// PATCH /api/organization - rename or re-describe; owner or administrators only
pub async fn organization_update(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Json(input): Json<OrganizationUpdate>,
) -> ApiResult<Organization> {
    if !member.is_admin() {
        return Err(ApiError::forbidden("Only the owner or an administrator can edit the organization"));
    }
    let organization = OrganizationService::new(pool).update(member.organization_id(), input).await?;
    Ok(ApiResponse::success(organization))
}

/// DELETE /api/organization - remove the organization and everything in it; owner only
pub async fn organization_delete(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
) -> ApiResult<OrganizationRemoval> {
    if !member.is_owner() {
        return Err(ApiError::forbidden("Only the owner can delete the organization"));
    }
    let members_detached = OrganizationService::new(pool).delete(member.organization_id()).await?;
    Ok(ApiResponse::success(OrganizationRemoval {
        organization_id: member.organization_id(),
        members_detached,
    }))
}
