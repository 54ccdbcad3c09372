use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::organization_service::escape_like;
use super::{validation, ServiceError, ServiceResult};
use crate::auth::Member;
use crate::database::models::user::USER_COLUMNS;
use crate::database::models::User;
use crate::types::Pagination;

/// An employee with the display names of their department and role
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Employee {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: User,
    pub department_name: Option<String>,
    pub role_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeFilter {
    pub department_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeUpdate {
    #[serde(default, deserialize_with = "crate::types::nullable")]
    pub department_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::types::nullable")]
    pub role_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::types::nullable")]
    pub position: Option<Option<String>>,
}

/// What was cleaned up when a member left the organization
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DetachReport {
    pub user_id: Uuid,
    pub attendance_removed: u64,
    pub join_requests_removed: u64,
    pub tasks_unassigned: u64,
    pub tasks_orphaned: u64,
    pub news_orphaned: u64,
    pub events_orphaned: u64,
}

pub struct EmployeeService {
    pool: PgPool,
}

const EMPLOYEE_SELECT: &str = r#"
    SELECT u.id, u.email, u.password_hash, u.first_name, u.last_name, u.phone, u.position,
           u.organization_id, u.department_id, u.role_id, u.hired_at, u.created_at, u.updated_at,
           d.name AS department_name, r.name AS role_name
    FROM users u
    LEFT JOIN departments d ON d.id = u.department_id
    LEFT JOIN roles r ON r.id = u.role_id
"#;

impl EmployeeService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        organization_id: Uuid,
        filter: &EmployeeFilter,
        pagination: Pagination,
    ) -> ServiceResult<Vec<Employee>> {
        let (limit, offset) = pagination.limit_offset();

        let mut query = QueryBuilder::<Postgres>::new(EMPLOYEE_SELECT);
        query.push(" WHERE u.organization_id = ").push_bind(organization_id);

        if let Some(department_id) = filter.department_id {
            query.push(" AND u.department_id = ").push_bind(department_id);
        }
        if let Some(role_id) = filter.role_id {
            query.push(" AND u.role_id = ").push_bind(role_id);
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            query
                .push(" AND (u.first_name || ' ' || u.last_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        query
            .push(" ORDER BY u.last_name, u.first_name LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let employees = query.build_query_as::<Employee>().fetch_all(&self.pool).await?;
        Ok(employees)
    }

    pub async fn get(&self, organization_id: Uuid, user_id: Uuid) -> ServiceResult<Employee> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE u.organization_id = $1 AND u.id = $2");
        sqlx::query_as::<_, Employee>(&sql)
            .bind(organization_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Employee"))
    }

    /// Change placement of an employee. Only administrators may change their
    /// own role or hand out an administrator role.
    pub async fn update(&self, actor: &Member, user_id: Uuid, update: EmployeeUpdate) -> ServiceResult<Employee> {
        let organization_id = actor.organization_id();
        if update.role_id.is_some() && user_id == actor.id() && !actor.is_admin() {
            return Err(ServiceError::forbidden("You cannot change your own role"));
        }

        let mut conn = self.pool.acquire().await?;

        if let Some(Some(department_id)) = update.department_id {
            ensure_department(&mut *conn, organization_id, department_id).await?;
        }
        if let Some(Some(role_id)) = update.role_id {
            let grants_admin = ensure_role(&mut *conn, organization_id, role_id).await?;
            if grants_admin && !actor.is_admin() {
                return Err(ServiceError::forbidden("Only administrators can grant an administrator role"));
            }
        }
        let position = match &update.position {
            Some(value) => Some(validation::optional_text("position", value.as_deref(), 120)?),
            None => None,
        };

        let sql = format!(
            r#"
            UPDATE users
            SET department_id = CASE WHEN $3 THEN $4 ELSE department_id END,
                role_id = CASE WHEN $5 THEN $6 ELSE role_id END,
                position = CASE WHEN $7 THEN $8 ELSE position END,
                updated_at = now()
            WHERE organization_id = $1 AND id = $2
            RETURNING {USER_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, User>(&sql)
            .bind(organization_id)
            .bind(user_id)
            .bind(update.department_id.is_some())
            .bind(update.department_id.flatten())
            .bind(update.role_id.is_some())
            .bind(update.role_id.flatten())
            .bind(position.is_some())
            .bind(position.flatten())
            .fetch_optional(&mut *conn)
            .await?;

        if updated.is_none() {
            return Err(ServiceError::not_found("Employee"));
        }
        drop(conn);

        self.get(organization_id, user_id).await
    }

    /// Dismiss an employee: every trace of their membership is cleaned up in one transaction
    pub async fn dismiss(&self, actor: &Member, user_id: Uuid) -> ServiceResult<DetachReport> {
        if actor.id() == user_id {
            return Err(ServiceError::forbidden("You cannot dismiss yourself"));
        }
        if actor.organization.owner_id == user_id {
            return Err(ServiceError::forbidden("The organization owner cannot be dismissed"));
        }

        let report = self.detach(actor.organization_id(), user_id).await?;
        info!(
            "User {} dismissed {} from organization {}",
            actor.id(),
            user_id,
            actor.organization_id()
        );
        Ok(report)
    }

    /// A member leaves the organization voluntarily
    pub async fn leave(&self, member: &Member) -> ServiceResult<DetachReport> {
        if member.is_owner() {
            return Err(ServiceError::forbidden(
                "The organization owner cannot leave; delete the organization instead",
            ));
        }

        let report = self.detach(member.organization_id(), member.id()).await?;
        info!("User {} left organization {}", member.id(), member.organization_id());
        Ok(report)
    }

    async fn detach(&self, organization_id: Uuid, user_id: Uuid) -> ServiceResult<DetachReport> {
        let mut tx = self.pool.begin().await?;

        // Lock the membership first so concurrent dismissals serialize
        let member: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE id = $1 AND organization_id = $2 FOR UPDATE")
                .bind(user_id)
                .bind(organization_id)
                .fetch_optional(&mut *tx)
                .await?;
        if member.is_none() {
            return Err(ServiceError::not_found("Employee"));
        }

        let mut report = DetachReport {
            user_id,
            ..Default::default()
        };

        report.attendance_removed = sqlx::query("DELETE FROM attendance WHERE organization_id = $1 AND user_id = $2")
            .bind(organization_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        report.join_requests_removed =
            sqlx::query("DELETE FROM join_requests WHERE organization_id = $1 AND user_id = $2")
                .bind(organization_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        report.tasks_unassigned = sqlx::query(
            r#"
            UPDATE assignments SET assignee_id = NULL, updated_at = now()
            WHERE organization_id = $1 AND assignee_id = $2 AND status <> 'done'
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        report.tasks_orphaned =
            sqlx::query("UPDATE assignments SET created_by = NULL WHERE organization_id = $1 AND created_by = $2")
                .bind(organization_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        report.news_orphaned =
            sqlx::query("UPDATE news SET author_id = NULL WHERE organization_id = $1 AND author_id = $2")
                .bind(organization_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        report.events_orphaned =
            sqlx::query("UPDATE events SET created_by = NULL WHERE organization_id = $1 AND created_by = $2")
                .bind(organization_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        sqlx::query(
            r#"
            UPDATE users
            SET organization_id = NULL, department_id = NULL, role_id = NULL,
                position = NULL, hired_at = NULL, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(report)
    }
}

/// Fails unless the department belongs to the organization
pub(crate) async fn ensure_department(
    conn: &mut PgConnection,
    organization_id: Uuid,
    department_id: Uuid,
) -> ServiceResult<()> {
    let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM departments WHERE id = $1 AND organization_id = $2")
        .bind(department_id)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?;
    found
        .map(|_| ())
        .ok_or_else(|| ServiceError::validation("department_id", "Department does not exist in this organization"))
}

/// Fails unless the role belongs to the organization; returns whether it is an administrator role
pub(crate) async fn ensure_role(conn: &mut PgConnection, organization_id: Uuid, role_id: Uuid) -> ServiceResult<bool> {
    let found: Option<(bool,)> = sqlx::query_as("SELECT is_admin FROM roles WHERE id = $1 AND organization_id = $2")
        .bind(role_id)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?;
    found
        .map(|(is_admin,)| is_admin)
        .ok_or_else(|| ServiceError::validation("role_id", "Role does not exist in this organization"))
}

/// Department of a member, or an error when the user is not a member of the organization
pub(crate) async fn member_department(
    conn: &mut PgConnection,
    organization_id: Uuid,
    user_id: Uuid,
    field: &'static str,
) -> ServiceResult<Option<Uuid>> {
    let found: Option<(Option<Uuid>,)> =
        sqlx::query_as("SELECT department_id FROM users WHERE id = $1 AND organization_id = $2")
            .bind(user_id)
            .bind(organization_id)
            .fetch_optional(&mut *conn)
            .await?;
    found
        .map(|(department_id,)| department_id)
        .ok_or_else(|| ServiceError::validation(field, "User is not a member of this organization"))
}
