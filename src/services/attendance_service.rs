use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::employee_service::member_department;
use super::{validation, ServiceError, ServiceResult};
use crate::config::{self, AttendanceConfig};
use crate::database::models::{AttendanceRecord, AttendanceStatus};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceFilter {
    pub user_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

/// A day recorded or corrected by a manager
#[derive(Debug, Clone, Deserialize)]
pub struct ManualAttendance {
    pub user_id: Uuid,
    pub work_date: NaiveDate,
    pub status: AttendanceStatus,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

pub struct AttendanceService {
    pool: PgPool,
}

const ATTENDANCE_COLUMNS: &str =
    "id, organization_id, user_id, work_date, check_in, check_out, status, note, created_at";

/// Local working day of a check-in and whether it counts as late
pub fn classify_check_in(at: DateTime<Utc>, settings: &AttendanceConfig) -> (NaiveDate, AttendanceStatus) {
    let offset = FixedOffset::east_opt(settings.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix());
    let local = at.with_timezone(&offset);
    let deadline = settings.workday_start + Duration::minutes(settings.late_grace_minutes);

    let status = if local.time() > deadline {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    };
    (local.date_naive(), status)
}

/// Local calendar date of an instant
pub fn local_date(at: DateTime<Utc>, settings: &AttendanceConfig) -> NaiveDate {
    classify_check_in(at, settings).0
}

impl AttendanceService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn check_in(&self, organization_id: Uuid, user_id: Uuid, at: DateTime<Utc>) -> ServiceResult<AttendanceRecord> {
        let (work_date, status) = classify_check_in(at, &config::config().attendance);

        let sql = format!(
            r#"
            INSERT INTO attendance (id, organization_id, user_id, work_date, check_in, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, work_date) DO NOTHING
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(organization_id)
            .bind(user_id)
            .bind(work_date)
            .bind(at)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::conflict("Attendance for today is already recorded"))?;

        info!("User {} checked in for {} ({:?})", user_id, work_date, record.status);
        Ok(record)
    }

    pub async fn check_out(&self, organization_id: Uuid, user_id: Uuid, at: DateTime<Utc>) -> ServiceResult<AttendanceRecord> {
        let work_date = local_date(at, &config::config().attendance);

        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE organization_id = $1 AND user_id = $2 AND work_date = $3"
        );
        let today = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(organization_id)
            .bind(user_id)
            .bind(work_date)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Check-in for today"))?;

        if today.check_in.is_none() {
            return Err(ServiceError::conflict("Today's attendance was recorded without a check-in"));
        }
        if today.check_out.is_some() {
            return Err(ServiceError::conflict("Already checked out today"));
        }

        let sql = format!(
            "UPDATE attendance SET check_out = $2 WHERE id = $1 AND check_out IS NULL RETURNING {ATTENDANCE_COLUMNS}"
        );
        let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(today.id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::conflict("Already checked out today"))?;

        info!("User {} checked out for {}", user_id, work_date);
        Ok(record)
    }

    pub async fn list(&self, organization_id: Uuid, filter: &AttendanceFilter) -> ServiceResult<Vec<AttendanceRecord>> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE organization_id = "
        ));
        query.push_bind(organization_id);

        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(from) = filter.from {
            query.push(" AND work_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND work_date <= ").push_bind(to);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        query.push(" ORDER BY work_date DESC, check_in DESC NULLS LAST");

        let records = query.build_query_as::<AttendanceRecord>().fetch_all(&self.pool).await?;
        Ok(records)
    }

    /// Insert or overwrite one employee's day
    pub async fn record(&self, organization_id: Uuid, input: ManualAttendance) -> ServiceResult<AttendanceRecord> {
        if let (Some(check_in), Some(check_out)) = (input.check_in, input.check_out) {
            if check_out < check_in {
                return Err(ServiceError::validation("check_out", "Check-out cannot precede check-in"));
            }
        }
        let note = validation::optional_text("note", input.note.as_deref(), 500)?.unwrap_or_default();

        let mut conn = self.pool.acquire().await?;
        member_department(&mut *conn, organization_id, input.user_id, "user_id").await?;

        let sql = format!(
            r#"
            INSERT INTO attendance (id, organization_id, user_id, work_date, check_in, check_out, status, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, work_date) DO UPDATE
            SET check_in = EXCLUDED.check_in,
                check_out = EXCLUDED.check_out,
                status = EXCLUDED.status,
                note = EXCLUDED.note
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(organization_id)
            .bind(input.user_id)
            .bind(input.work_date)
            .bind(input.check_in)
            .bind(input.check_out)
            .bind(input.status)
            .bind(note)
            .fetch_one(&mut *conn)
            .await?;

        info!(
            "Recorded attendance {:?} for user {} on {}",
            record.status, record.user_id, record.work_date
        );
        Ok(record)
    }

    pub async fn delete(&self, organization_id: Uuid, record_id: Uuid) -> ServiceResult<()> {
        let deleted = sqlx::query("DELETE FROM attendance WHERE organization_id = $1 AND id = $2")
            .bind(organization_id)
            .bind(record_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(ServiceError::not_found("Attendance record"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};

    fn settings(offset_minutes: i32) -> AttendanceConfig {
        AttendanceConfig {
            workday_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            late_grace_minutes: 10,
            utc_offset_minutes: offset_minutes,
        }
    }

    #[test]
    fn within_grace_is_present() {
        let at = Utc.with_ymd_and_hms(2025, 4, 2, 9, 10, 0).unwrap();
        let (date, status) = classify_check_in(at, &settings(0));
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 4, 2).unwrap());
        assert_eq!(status, AttendanceStatus::Present);
    }

    #[test]
    fn after_grace_is_late() {
        let at = Utc.with_ymd_and_hms(2025, 4, 2, 9, 11, 0).unwrap();
        assert_eq!(classify_check_in(at, &settings(0)).1, AttendanceStatus::Late);
    }

    #[test]
    fn offset_moves_both_time_and_date() {
        // 23:30 UTC is 08:30 the next day at UTC+9
        let at = Utc.with_ymd_and_hms(2025, 4, 2, 23, 30, 0).unwrap();
        let (date, status) = classify_check_in(at, &settings(9 * 60));
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 4, 3).unwrap());
        assert_eq!(status, AttendanceStatus::Present);
    }

    #[test]
    fn negative_offset_can_make_a_check_in_late() {
        // 14:00 UTC is 09:30 at UTC-4:30
        let at = Utc.with_ymd_and_hms(2025, 4, 2, 14, 0, 0).unwrap();
        assert_eq!(classify_check_in(at, &settings(-270)).1, AttendanceStatus::Late);
    }

    #[test]
    fn late_evening_shift_is_present_within_grace() {
        let late_shift = AttendanceConfig {
            workday_start: NaiveTime::from_hms_opt(23, 55, 0).unwrap(),
            late_grace_minutes: 4,
            utc_offset_minutes: 0,
        };
        let at = Utc.with_ymd_and_hms(2025, 4, 2, 23, 57, 0).unwrap();
        assert_eq!(classify_check_in(at, &late_shift).1, AttendanceStatus::Present);
        let at = Utc.with_ymd_and_hms(2025, 4, 2, 23, 59, 30).unwrap();
        assert_eq!(classify_check_in(at, &late_shift).1, AttendanceStatus::Late);
    }
}
