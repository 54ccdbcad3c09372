use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::ServiceResult;
use crate::database::models::{AttendanceStatus, TaskStatus};
use crate::types::DateRange;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DepartmentHeadcount {
    pub department_id: Option<Uuid>,
    pub department_name: Option<String>,
    pub employees: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TaskStatusCount {
    pub status: TaskStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AttendanceStatusCount {
    pub status: AttendanceStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskStatistics {
    pub total: i64,
    pub by_status: Vec<TaskStatusCount>,
    pub overdue: i64,
    /// Share of tasks that are done, 0.0 when there are no tasks
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceStatistics {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub by_status: Vec<AttendanceStatusCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationStatistics {
    pub employee_count: i64,
    pub departments: Vec<DepartmentHeadcount>,
    pub tasks: TaskStatistics,
    pub attendance: AttendanceStatistics,
    pub pending_join_requests: i64,
    pub upcoming_events: i64,
    pub news_posts: i64,
}

pub struct StatisticsService {
    pool: PgPool,
}

pub fn completion_rate(by_status: &[TaskStatusCount]) -> f64 {
    let total: i64 = by_status.iter().map(|c| c.count).sum();
    if total == 0 {
        return 0.0;
    }
    let done: i64 = by_status
        .iter()
        .filter(|c| c.status == TaskStatus::Done)
        .map(|c| c.count)
        .sum();
    done as f64 / total as f64
}

impl StatisticsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn overview(&self, organization_id: Uuid, range: DateRange) -> ServiceResult<OrganizationStatistics> {
        let (employee_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_one(&self.pool)
            .await?;

        // Employees without a department are reported under a null department
        let departments = sqlx::query_as::<_, DepartmentHeadcount>(
            r#"
            SELECT d.id AS department_id, d.name AS department_name, COUNT(u.id) AS employees
            FROM departments d
            LEFT JOIN users u ON u.department_id = d.id
            WHERE d.organization_id = $1
            GROUP BY d.id, d.name
            UNION ALL
            SELECT NULL, NULL, COUNT(*)
            FROM users
            WHERE organization_id = $1 AND department_id IS NULL
            ORDER BY department_name NULLS LAST
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        let by_status = sqlx::query_as::<_, TaskStatusCount>(
            "SELECT status, COUNT(*) AS count FROM assignments WHERE organization_id = $1 GROUP BY status ORDER BY status",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        let today = Utc::now().date_naive();
        let (overdue,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM assignments WHERE organization_id = $1 AND status <> 'done' AND due_date < $2",
        )
        .bind(organization_id)
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        let attendance = sqlx::query_as::<_, AttendanceStatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM attendance
            WHERE organization_id = $1 AND work_date BETWEEN $2 AND $3
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(organization_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;

        let (pending_join_requests,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM join_requests WHERE organization_id = $1 AND status = 'pending'",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        let (upcoming_events,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM events WHERE organization_id = $1 AND COALESCE(ends_at, starts_at) >= now()",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        let (news_posts,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM news WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_one(&self.pool)
            .await?;

        let total = by_status.iter().map(|c| c.count).sum();
        Ok(OrganizationStatistics {
            employee_count,
            departments,
            tasks: TaskStatistics {
                total,
                completion_rate: completion_rate(&by_status),
                by_status,
                overdue,
            },
            attendance: AttendanceStatistics {
                from: range.from,
                to: range.to,
                by_status: attendance,
            },
            pending_join_requests,
            upcoming_events,
            news_posts,
        })
    }
}
