use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{validation, ServiceError, ServiceResult};
use crate::database::models::Department;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DepartmentSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub department: Department,
    pub employee_count: i64,
    pub open_task_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Employees and tasks moved to "no department" when a department is removed
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentRemoval {
    pub department_id: Uuid,
    pub employees_moved: u64,
    pub tasks_moved: u64,
}

pub struct DepartmentService {
    pool: PgPool,
}

const SUMMARY_SELECT: &str = r#"
    SELECT d.id, d.organization_id, d.name, d.description, d.created_at,
           (SELECT COUNT(*) FROM users u WHERE u.department_id = d.id) AS employee_count,
           (SELECT COUNT(*) FROM assignments a WHERE a.department_id = d.id AND a.status <> 'done') AS open_task_count
    FROM departments d
"#;

impl DepartmentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, organization_id: Uuid) -> ServiceResult<Vec<DepartmentSummary>> {
        let sql = format!("{SUMMARY_SELECT} WHERE d.organization_id = $1 ORDER BY d.name");
        let rows = sqlx::query_as::<_, DepartmentSummary>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, organization_id: Uuid, department_id: Uuid) -> ServiceResult<DepartmentSummary> {
        let sql = format!("{SUMMARY_SELECT} WHERE d.organization_id = $1 AND d.id = $2");
        sqlx::query_as::<_, DepartmentSummary>(&sql)
            .bind(organization_id)
            .bind(department_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Department"))
    }

    pub async fn create(&self, organization_id: Uuid, input: NewDepartment) -> ServiceResult<Department> {
        let name = validation::required_text("name", &input.name, 120)?;
        let description = input.description.map(|d| d.trim().to_string()).unwrap_or_default();

        let department = sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO departments (id, organization_id, name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, organization_id, name, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(&name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ServiceError::on_unique(e, format!("Department '{}' already exists", name)))?;

        info!("Created department '{}' in organization {}", department.name, organization_id);
        Ok(department)
    }

    pub async fn update(
        &self,
        organization_id: Uuid,
        department_id: Uuid,
        update: DepartmentUpdate,
    ) -> ServiceResult<Department> {
        let name = update
            .name
            .as_deref()
            .map(|v| validation::required_text("name", v, 120))
            .transpose()?;

        sqlx::query_as::<_, Department>(
            r#"
            UPDATE departments
            SET name = COALESCE($3, name), description = COALESCE($4, description)
            WHERE organization_id = $1 AND id = $2
            RETURNING id, organization_id, name, description, created_at
            "#,
        )
        .bind(organization_id)
        .bind(department_id)
        .bind(name)
        .bind(update.description.map(|d| d.trim().to_string()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ServiceError::on_unique(e, "A department with this name already exists"))?
        .ok_or_else(|| ServiceError::not_found("Department"))
    }

    /// Remove a department; its employees and tasks stay in the organization without a department
    pub async fn delete(&self, organization_id: Uuid, department_id: Uuid) -> ServiceResult<DepartmentRemoval> {
        let mut tx = self.pool.begin().await?;

        let employees_moved = sqlx::query(
            "UPDATE users SET department_id = NULL, updated_at = now() WHERE organization_id = $1 AND department_id = $2",
        )
        .bind(organization_id)
        .bind(department_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let tasks_moved = sqlx::query(
            "UPDATE assignments SET department_id = NULL, updated_at = now() WHERE organization_id = $1 AND department_id = $2",
        )
        .bind(organization_id)
        .bind(department_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM departments WHERE organization_id = $1 AND id = $2")
            .bind(organization_id)
            .bind(department_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(ServiceError::not_found("Department"));
        }

        tx.commit().await?;

        info!(
            "Deleted department {} ({} employees, {} tasks moved)",
            department_id, employees_moved, tasks_moved
        );
        Ok(DepartmentRemoval {
            department_id,
            employees_moved,
            tasks_moved,
        })
    }
}
