use axum::Extension;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{Member, Permission};
use crate::database::models::AttendanceRecord;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, DbPool, Json, Path, Query};
use crate::services::attendance_service::{AttendanceFilter, ManualAttendance};
use crate::services::AttendanceService;

/// POST /api/attendance/check-in - open today's row for the caller
pub async fn attendance_check_in(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
) -> ApiResult<AttendanceRecord> {
    let record = AttendanceService::new(pool)
        .check_in(member.organization_id(), member.id(), Utc::now())
        .await?;
    Ok(ApiResponse::created(record))
}

/// POST /api/attendance/check-out - close today's row for the caller
pub async fn attendance_check_out(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
) -> ApiResult<AttendanceRecord> {
    let record = AttendanceService::new(pool)
        .check_out(member.organization_id(), member.id(), Utc::now())
        .await?;
    Ok(ApiResponse::success(record))
}

/// GET /api/attendance?user_id=&from=&to=&status=
///
/// Without the attendance permission only the caller's own rows are visible.
pub async fn attendance_list(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(mut filter): Query<AttendanceFilter>,
) -> ApiResult<Vec<AttendanceRecord>> {
    if !member.can(Permission::ManageAttendance) {
        match filter.user_id {
            Some(user_id) if user_id != member.id() => {
                return Err(ApiError::forbidden("You can only view your own attendance"));
            }
            _ => filter.user_id = Some(member.id()),
        }
    }

    let records = AttendanceService::new(pool).list(member.organization_id(), &filter).await?;
    Ok(ApiResponse::success(records))
}

/// POST /api/attendance - record or override one employee's day
///
/// Expected Input:
/// ```json
/// { "user_id": "uuid", "work_date": "2025-04-02", "status": "leave", "note": "Annual leave" }
/// ```
pub async fn attendance_record(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Json(input): Json<ManualAttendance>,
) -> ApiResult<AttendanceRecord> {
    member.require(Permission::ManageAttendance)?;
    let record = AttendanceService::new(pool).record(member.organization_id(), input).await?;
    Ok(ApiResponse::success(record))
}

/// DELETE /api/attendance/:id
pub async fn attendance_delete(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(record_id): Path<Uuid>,
) -> ApiResult<()> {
    member.require(Permission::ManageAttendance)?;
    AttendanceService::new(pool).delete(member.organization_id(), record_id).await?;
    Ok(ApiResponse::no_content())
}
