use axum::Extension;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::auth::{Member, Permission};
use crate::middleware::{ApiResponse, ApiResult, DbPool, Query};
use crate::services::statistics_service::OrganizationStatistics;
use crate::services::StatisticsService;
use crate::types::DateRange;

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// GET /api/statistics?from=&to= - organization dashboard; attendance defaults to the last 30 days
pub async fn statistics_get(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<OrganizationStatistics> {
    member.require(Permission::ViewStatistics)?;
    let range = DateRange::resolve(query.from, query.to, Utc::now().date_naive());
    let statistics = StatisticsService::new(pool).overview(member.organization_id(), range).await?;
    Ok(ApiResponse::success(statistics))
}
