use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{validation, ServiceError, ServiceResult};
use crate::auth::Member;
use crate::database::models::{Organization, Role};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoleSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub role: Role,
    pub member_count: i64,
}

/// Permission flags of a role. Missing flags default to false on create
/// and stay unchanged on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleFlags {
    pub is_admin: Option<bool>,
    pub can_manage_employees: Option<bool>,
    pub can_manage_departments: Option<bool>,
    pub can_manage_roles: Option<bool>,
    pub can_manage_tasks: Option<bool>,
    pub can_post_news: Option<bool>,
    pub can_manage_events: Option<bool>,
    pub can_manage_attendance: Option<bool>,
    pub can_view_statistics: Option<bool>,
    pub can_review_join_requests: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRole {
    pub name: String,
    #[serde(flatten)]
    pub flags: RoleFlags,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    #[serde(flatten)]
    pub flags: RoleFlags,
}

pub struct RoleService {
    pool: PgPool,
}

const SUMMARY_SELECT: &str = r#"
    SELECT r.*, (SELECT COUNT(*) FROM users u WHERE u.role_id = r.id) AS member_count
    FROM roles r
"#;

impl RoleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, organization_id: Uuid) -> ServiceResult<Vec<RoleSummary>> {
        let sql = format!("{SUMMARY_SELECT} WHERE r.organization_id = $1 ORDER BY r.name");
        let rows = sqlx::query_as::<_, RoleSummary>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, organization_id: Uuid, role_id: Uuid) -> ServiceResult<RoleSummary> {
        let sql = format!("{SUMMARY_SELECT} WHERE r.organization_id = $1 AND r.id = $2");
        sqlx::query_as::<_, RoleSummary>(&sql)
            .bind(organization_id)
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Role"))
    }

    /// Role row by id without the organization scope, used when resolving a member's permissions
    pub async fn find(&self, role_id: Uuid) -> ServiceResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    pub async fn create(&self, actor: &Member, input: NewRole) -> ServiceResult<Role> {
        let organization_id = actor.organization_id();
        let name = validation::required_text("name", &input.name, 80)?;
        let f = &input.flags;
        if f.is_admin == Some(true) && !actor.is_admin() {
            return Err(ServiceError::forbidden("Only administrators can create an administrator role"));
        }

        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (
                id, organization_id, name, is_admin,
                can_manage_employees, can_manage_departments, can_manage_roles, can_manage_tasks,
                can_post_news, can_manage_events, can_manage_attendance, can_view_statistics,
                can_review_join_requests
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(&name)
        .bind(f.is_admin.unwrap_or(false))
        .bind(f.can_manage_employees.unwrap_or(false))
        .bind(f.can_manage_departments.unwrap_or(false))
        .bind(f.can_manage_roles.unwrap_or(false))
        .bind(f.can_manage_tasks.unwrap_or(false))
        .bind(f.can_post_news.unwrap_or(false))
        .bind(f.can_manage_events.unwrap_or(false))
        .bind(f.can_manage_attendance.unwrap_or(false))
        .bind(f.can_view_statistics.unwrap_or(false))
        .bind(f.can_review_join_requests.unwrap_or(false))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ServiceError::on_unique(e, format!("Role '{}' already exists", name)))?;

        info!("Created role '{}' in organization {}", role.name, organization_id);
        Ok(role)
    }

    /// Only administrators may grant `is_admin` or edit the role they hold themselves.
    pub async fn update(&self, actor: &Member, role_id: Uuid, update: RoleUpdate) -> ServiceResult<Role> {
        let organization = &actor.organization;
        let name = update
            .name
            .as_deref()
            .map(|v| validation::required_text("name", v, 80))
            .transpose()?;
        let f = &update.flags;

        if !actor.is_admin() {
            if f.is_admin == Some(true) {
                return Err(ServiceError::forbidden("Only administrators can grant administrator rights"));
            }
            if actor.user.role_id == Some(role_id) {
                return Err(ServiceError::forbidden("You cannot change the role you hold"));
            }
        }

        if f.is_admin == Some(false) && self.is_owner_role(organization, role_id).await? {
            return Err(ServiceError::forbidden(
                "The organization owner's role must keep administrator rights",
            ));
        }

        sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles SET
                name = COALESCE($3, name),
                is_admin = COALESCE($4, is_admin),
                can_manage_employees = COALESCE($5, can_manage_employees),
                can_manage_departments = COALESCE($6, can_manage_departments),
                can_manage_roles = COALESCE($7, can_manage_roles),
                can_manage_tasks = COALESCE($8, can_manage_tasks),
                can_post_news = COALESCE($9, can_post_news),
                can_manage_events = COALESCE($10, can_manage_events),
                can_manage_attendance = COALESCE($11, can_manage_attendance),
                can_view_statistics = COALESCE($12, can_view_statistics),
                can_review_join_requests = COALESCE($13, can_review_join_requests)
            WHERE organization_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(organization.id)
        .bind(role_id)
        .bind(name)
        .bind(f.is_admin)
        .bind(f.can_manage_employees)
        .bind(f.can_manage_departments)
        .bind(f.can_manage_roles)
        .bind(f.can_manage_tasks)
        .bind(f.can_post_news)
        .bind(f.can_manage_events)
        .bind(f.can_manage_attendance)
        .bind(f.can_view_statistics)
        .bind(f.can_review_join_requests)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ServiceError::on_unique(e, "A role with this name already exists"))?
        .ok_or_else(|| ServiceError::not_found("Role"))
    }

    /// Delete a role that nobody holds any more
    pub async fn delete(&self, organization_id: Uuid, role_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;

        let (holders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role_id = $1")
            .bind(role_id)
            .fetch_one(&mut *tx)
            .await?;
        if holders > 0 {
            return Err(ServiceError::conflict(format!(
                "Role is still assigned to {} employee(s)",
                holders
            )));
        }

        let deleted = sqlx::query("DELETE FROM roles WHERE organization_id = $1 AND id = $2")
            .bind(organization_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(ServiceError::not_found("Role"));
        }

        tx.commit().await?;
        info!("Deleted role {} in organization {}", role_id, organization_id);
        Ok(())
    }

    async fn is_owner_role(&self, organization: &Organization, role_id: Uuid) -> ServiceResult<bool> {
        let (held,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND role_id = $2)")
            .bind(organization.owner_id)
            .bind(role_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(held)
    }
}
