use axum::Extension;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{Member, Permission};
use crate::database::models::{Assignment, TaskStatus};
use crate::middleware::{ApiResponse, ApiResult, DbPool, Json, Path, Query};
use crate::services::task_service::{NewTask, Relocation, TaskFilter, TaskUpdate};
use crate::services::TaskService;
use crate::types::Pagination;

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: TaskStatus,
}

/// GET /api/tasks?assignee_id=&department_id=&status=&mine=&overdue=&page=&per_page=
pub async fn task_list(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(filter): Query<TaskFilter>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Vec<Assignment>> {
    let tasks = TaskService::new(pool).list(&member, &filter, pagination).await?;
    Ok(ApiResponse::success(tasks))
}

/// POST /api/tasks
///
/// Expected Input:
/// ```json
/// { "title": "Prepare Q3 report", "priority": "high", "assignee_id": "uuid", "due_date": "2025-07-01" }
/// ```
/// Without `department_id` the task lands in the assignee's department.
pub async fn task_create(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Json(input): Json<NewTask>,
) -> ApiResult<Assignment> {
    member.require(Permission::ManageTasks)?;
    let task = TaskService::new(pool).create(&member, input).await?;
    Ok(ApiResponse::created(task))
}

/// GET /api/tasks/:id
pub async fn task_get(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Assignment> {
    let task = TaskService::new(pool).get(member.organization_id(), task_id).await?;
    Ok(ApiResponse::success(task))
}

/// PATCH /api/tasks/:id
pub async fn task_update(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(task_id): Path<Uuid>,
    Json(input): Json<TaskUpdate>,
) -> ApiResult<Assignment> {
    member.require(Permission::ManageTasks)?;
    let task = TaskService::new(pool).update(member.organization_id(), task_id, input).await?;
    Ok(ApiResponse::success(task))
}

/// DELETE /api/tasks/:id
pub async fn task_delete(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<()> {
    member.require(Permission::ManageTasks)?;
    TaskService::new(pool).delete(member.organization_id(), task_id).await?;
    Ok(ApiResponse::no_content())
}

/// PUT /api/tasks/:id/status - assignee or task manager
pub async fn task_set_status(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(task_id): Path<Uuid>,
    Json(input): Json<StatusChange>,
) -> ApiResult<Assignment> {
    let task = TaskService::new(pool).set_status(&member, task_id, input.status).await?;
    Ok(ApiResponse::success(task))
}

/// POST /api/tasks/:id/relocate - hand the task to another employee and/or department
pub async fn task_relocate(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(task_id): Path<Uuid>,
    Json(input): Json<Relocation>,
) -> ApiResult<Assignment> {
    member.require(Permission::ManageTasks)?;
    let task = TaskService::new(pool)
        .relocate(member.organization_id(), task_id, input)
        .await?;
    Ok(ApiResponse::success(task))
}
