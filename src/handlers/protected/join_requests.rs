use axum::Extension;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{Member, Permission};
use crate::database::models::{JoinRequest, JoinRequestStatus};
use crate::middleware::{ApiResponse, ApiResult, DbPool, Json, Path, Query};
use crate::services::join_request_service::{Approval, ApprovalOutcome, JoinRequestView};
use crate::services::JoinRequestService;

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<JoinRequestStatus>,
}

/// GET /api/join-requests?status= - requests sent to the caller's organization
pub async fn join_request_list(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Vec<JoinRequestView>> {
    member.require(Permission::ReviewJoinRequests)?;
    let requests = JoinRequestService::new(pool)
        .list_for_organization(member.organization_id(), query.status)
        .await?;
    Ok(ApiResponse::success(requests))
}

/// POST /api/join-requests/:id/approve - hire the applicant
///
/// Expected Input (all optional):
/// ```json
/// { "department_id": "uuid", "role_id": "uuid", "position": "Designer" }
/// ```
pub async fn join_request_approve(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(request_id): Path<Uuid>,
    body: Option<Json<Approval>>,
) -> ApiResult<ApprovalOutcome> {
    member.require(Permission::ReviewJoinRequests)?;
    let approval = body.map(|Json(approval)| approval).unwrap_or_default();
    let outcome = JoinRequestService::new(pool)
        .approve(&member, request_id, approval)
        .await?;
    Ok(ApiResponse::success(outcome))
}

/// POST /api/join-requests/:id/reject
pub async fn join_request_reject(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(request_id): Path<Uuid>,
) -> ApiResult<JoinRequest> {
    member.require(Permission::ReviewJoinRequests)?;
    let request = JoinRequestService::new(pool)
        .reject(member.organization_id(), member.id(), request_id)
        .await?;
    Ok(ApiResponse::success(request))
}
