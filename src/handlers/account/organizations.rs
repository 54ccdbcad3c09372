use axum::Extension;
use serde::Deserialize;

use crate::middleware::{ApiResponse, ApiResult, DbPool, Query};
use crate::services::organization_service::OrganizationSummary;
use crate::services::OrganizationService;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// GET /api/organizations?search= - companies an account can ask to join
pub async fn organization_search(
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<OrganizationSummary>> {
    let organizations = OrganizationService::new(pool).search(query.search.as_deref()).await?;
    Ok(ApiResponse::success(organizations))
}
