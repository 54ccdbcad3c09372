use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::DbPool;
use crate::auth::{Account, Member};
use crate::error::ApiError;
use crate::services::{OrganizationService, RoleService};

/// Middleware that requires the authenticated account to belong to an
/// organization. Loads the organization and role and injects `Member`.
pub async fn validate_member_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let Account(user) = request
        .extensions()
        .get::<Account>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before membership validation"))?;

    let DbPool(pool) = request
        .extensions()
        .get::<DbPool>()
        .cloned()
        .ok_or_else(|| ApiError::internal_server_error("Database pool required before membership validation"))?;

    let organization_id = user
        .organization_id
        .ok_or_else(|| ApiError::forbidden("You are not a member of any organization"))?;

    let organization = OrganizationService::new(pool.clone())
        .find(organization_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("User {} points at missing organization {}", user.id, organization_id);
            ApiError::forbidden("Organization no longer exists")
        })?;

    let role = match user.role_id {
        Some(role_id) => RoleService::new(pool).find(role_id).await?,
        None => None,
    };

    let member = Member::new(user, organization, role);
    tracing::debug!(
        "Member {} validated in organization {} (owner: {})",
        member.id(),
        member.organization_id(),
        member.is_owner()
    );

    request.extensions_mut().insert(member);
    Ok(next.run(request).await)
}
