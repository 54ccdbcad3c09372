use axum::Extension;
use uuid::Uuid;

use crate::auth::Account;
use crate::database::models::JoinRequest;
use crate::middleware::{ApiResponse, ApiResult, DbPool, Json, Path};
use crate::services::join_request_service::{JoinRequestView, NewJoinRequest};
use crate::services::JoinRequestService;

/// POST /api/join-requests - ask to join an organization
pub async fn join_request_create(
    Extension(Account(user)): Extension<Account>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Json(input): Json<NewJoinRequest>,
) -> ApiResult<JoinRequest> {
    let request = JoinRequestService::new(pool).create(&user, input).await?;
    Ok(ApiResponse::created(request))
}

/// GET /api/join-requests/mine - the caller's own requests, newest first
pub async fn join_request_mine(
    Extension(Account(user)): Extension<Account>,
    Extension(DbPool(pool)): Extension<DbPool>,
) -> ApiResult<Vec<JoinRequestView>> {
    let requests = JoinRequestService::new(pool).list_for_applicant(user.id).await?;
    Ok(ApiResponse::success(requests))
}

/// DELETE /api/join-requests/:id - withdraw a pending request
pub async fn join_request_cancel(
    Extension(Account(user)): Extension<Account>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(request_id): Path<Uuid>,
) -> ApiResult<()> {
    JoinRequestService::new(pool).cancel(user.id, request_id).await?;
    Ok(ApiResponse::no_content())
}
