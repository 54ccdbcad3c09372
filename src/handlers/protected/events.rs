use axum::Extension;
use uuid::Uuid;

use crate::auth::{Member, Permission};
use crate::database::models::Event;
use crate::middleware::{ApiResponse, ApiResult, DbPool, Json, Path, Query};
use crate::services::event_service::{EventFilter, EventUpdate, NewEvent};
use crate::services::EventService;

/// GET /api/events?from=&to=&upcoming=
pub async fn event_list(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(filter): Query<EventFilter>,
) -> ApiResult<Vec<Event>> {
    let events = EventService::new(pool).list(member.organization_id(), &filter).await?;
    Ok(ApiResponse::success(events))
}

/// POST /api/events
pub async fn event_create(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Json(input): Json<NewEvent>,
) -> ApiResult<Event> {
    member.require(Permission::ManageEvents)?;
    let event = EventService::new(pool)
        .create(member.organization_id(), member.id(), input)
        .await?;
    Ok(ApiResponse::created(event))
}

/// GET /api/events/:id
pub async fn event_get(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Event> {
    let event = EventService::new(pool).get(member.organization_id(), event_id).await?;
    Ok(ApiResponse::success(event))
}

/// PATCH /api/events/:id
pub async fn event_update(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(event_id): Path<Uuid>,
    Json(input): Json<EventUpdate>,
) -> ApiResult<Event> {
    member.require(Permission::ManageEvents)?;
    let event = EventService::new(pool)
        .update(member.organization_id(), event_id, input)
        .await?;
    Ok(ApiResponse::success(event))
}

/// DELETE /api/events/:id
pub async fn event_delete(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<()> {
    member.require(Permission::ManageEvents)?;
    EventService::new(pool).delete(member.organization_id(), event_id).await?;
    Ok(ApiResponse::no_content())
}
