use axum::Extension;
use uuid::Uuid;

use crate::auth::{Member, Permission};
use crate::middleware::{ApiResponse, ApiResult, DbPool, Json, Path, Query};
use crate::services::employee_service::{DetachReport, Employee, EmployeeFilter, EmployeeUpdate};
use crate::services::EmployeeService;
use crate::types::Pagination;

/// GET /api/employees?department_id=&role_id=&search=&page=&per_page=
pub async fn employee_list(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(filter): Query<EmployeeFilter>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Vec<Employee>> {
    let employees = EmployeeService::new(pool)
        .list(member.organization_id(), &filter, pagination)
        .await?;
    Ok(ApiResponse::success(employees))
}

/// GET /api/employees/:id
pub async fn employee_get(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Employee> {
    let employee = EmployeeService::new(pool).get(member.organization_id(), user_id).await?;
    Ok(ApiResponse::success(employee))
}

/// PATCH /api/employees/:id - move between departments, change role or position
///
/// Expected Input (every field optional, `null` clears it):
/// ```json
/// { "department_id": "uuid", "role_id": null, "position": "Backend developer" }
/// ```
pub async fn employee_update(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<EmployeeUpdate>,
) -> ApiResult<Employee> {
    member.require(Permission::ManageEmployees)?;
    let employee = EmployeeService::new(pool)
        .update(&member, user_id, input)
        .await?;
    Ok(ApiResponse::success(employee))
}

/// DELETE /api/employees/:id - dismiss an employee
pub async fn employee_dismiss(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<DetachReport> {
    member.require(Permission::ManageEmployees)?;
    let report = EmployeeService::new(pool).dismiss(&member, user_id).await?;
    Ok(ApiResponse::success(report))
}

/// POST /api/employees/leave - the caller leaves the organization
pub async fn employee_leave(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
) -> ApiResult<DetachReport> {
    let report = EmployeeService::new(pool).leave(&member).await?;
    Ok(ApiResponse::success(report))
}
