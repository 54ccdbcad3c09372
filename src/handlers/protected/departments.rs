use axum::Extension;
use uuid::Uuid;

use crate::auth::{Member, Permission};
use crate::database::models::Department;
use crate::middleware::{ApiResponse, ApiResult, DbPool, Json, Path, Query};
use crate::services::department_service::{DepartmentRemoval, DepartmentSummary, DepartmentUpdate, NewDepartment};
use crate::services::employee_service::{Employee, EmployeeFilter};
use crate::services::{DepartmentService, EmployeeService};
use crate::types::Pagination;

/// GET /api/departments
pub async fn department_list(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
) -> ApiResult<Vec<DepartmentSummary>> {
    let departments = DepartmentService::new(pool).list(member.organization_id()).await?;
    Ok(ApiResponse::success(departments))
}

/// POST /api/departments
pub async fn department_create(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Json(input): Json<NewDepartment>,
) -> ApiResult<Department> {
    member.require(Permission::ManageDepartments)?;
    let department = DepartmentService::new(pool).create(member.organization_id(), input).await?;
    Ok(ApiResponse::created(department))
}

/// GET /api/departments/:id
pub async fn department_get(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(department_id): Path<Uuid>,
) -> ApiResult<DepartmentSummary> {
    let department = DepartmentService::new(pool).get(member.organization_id(), department_id).await?;
    Ok(ApiResponse::success(department))
}

/// PATCH /api/departments/:id
pub async fn department_update(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(department_id): Path<Uuid>,
    Json(input): Json<DepartmentUpdate>,
) -> ApiResult<Department> {
    member.require(Permission::ManageDepartments)?;
    let department = DepartmentService::new(pool)
        .update(member.organization_id(), department_id, input)
        .await?;
    Ok(ApiResponse::success(department))
}

/// DELETE /api/departments/:id - employees and tasks move to "no department"
pub async fn department_delete(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(department_id): Path<Uuid>,
) -> ApiResult<DepartmentRemoval> {
    member.require(Permission::ManageDepartments)?;
    let removal = DepartmentService::new(pool).delete(member.organization_id(), department_id).await?;
    Ok(ApiResponse::success(removal))
}

/// GET /api/departments/:id/employees
pub async fn department_employees(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(department_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Vec<Employee>> {
    // 404 for departments of other organizations
    DepartmentService::new(pool.clone())
        .get(member.organization_id(), department_id)
        .await?;

    let filter = EmployeeFilter {
        department_id: Some(department_id),
        ..Default::default()
    };
    let employees = EmployeeService::new(pool)
        .list(member.organization_id(), &filter, pagination)
        .await?;
    Ok(ApiResponse::success(employees))
}
