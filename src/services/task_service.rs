use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::employee_service::{ensure_department, member_department};
use super::{validation, ServiceError, ServiceResult};
use crate::auth::{Member, Permission};
use crate::database::models::{Assignment, TaskPriority, TaskStatus};
use crate::types::Pagination;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub assignee_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    /// Only tasks assigned to the caller
    #[serde(default)]
    pub mine: bool,
    /// Only open tasks whose due date has passed
    #[serde(default)]
    pub overdue: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub assignee_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "crate::types::nullable")]
    pub due_date: Option<Option<NaiveDate>>,
}

/// Target of a task relocation. At least one field must be present;
/// `department_id: null` explicitly removes the department.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relocation {
    pub assignee_id: Option<Uuid>,
    #[serde(default, deserialize_with = "crate::types::nullable")]
    pub department_id: Option<Option<Uuid>>,
}

pub struct TaskService {
    pool: PgPool,
}

const TASK_COLUMNS: &str = "id, organization_id, department_id, title, description, status, priority, \
    assignee_id, created_by, due_date, completed_at, created_at, updated_at";

impl TaskService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, member: &Member, filter: &TaskFilter, pagination: Pagination) -> ServiceResult<Vec<Assignment>> {
        let (limit, offset) = pagination.limit_offset();

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {TASK_COLUMNS} FROM assignments WHERE organization_id = "));
        query.push_bind(member.organization_id());

        let assignee = if filter.mine { Some(member.id()) } else { filter.assignee_id };
        if let Some(assignee_id) = assignee {
            query.push(" AND assignee_id = ").push_bind(assignee_id);
        }
        if let Some(department_id) = filter.department_id {
            query.push(" AND department_id = ").push_bind(department_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if filter.overdue {
            query
                .push(" AND status <> 'done' AND due_date < ")
                .push_bind(Utc::now().date_naive());
        }

        query
            .push(" ORDER BY due_date ASC NULLS LAST, created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let tasks = query.build_query_as::<Assignment>().fetch_all(&self.pool).await?;
        Ok(tasks)
    }

    pub async fn get(&self, organization_id: Uuid, task_id: Uuid) -> ServiceResult<Assignment> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM assignments WHERE organization_id = $1 AND id = $2");
        sqlx::query_as::<_, Assignment>(&sql)
            .bind(organization_id)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task"))
    }

    pub async fn create(&self, creator: &Member, input: NewTask) -> ServiceResult<Assignment> {
        let organization_id = creator.organization_id();
        let title = validation::required_text("title", &input.title, 200)?;
        let description = input.description.map(|d| d.trim().to_string()).unwrap_or_default();

        let mut conn = self.pool.acquire().await?;

        let mut department_id = input.department_id;
        if let Some(id) = department_id {
            ensure_department(&mut *conn, organization_id, id).await?;
        }
        if let Some(assignee_id) = input.assignee_id {
            let assignee_department = member_department(&mut *conn, organization_id, assignee_id, "assignee_id").await?;
            department_id = department_id.or(assignee_department);
        }

        let sql = format!(
            r#"
            INSERT INTO assignments (id, organization_id, department_id, title, description, priority,
                                     assignee_id, created_by, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TASK_COLUMNS}
            "#
        );
        let task = sqlx::query_as::<_, Assignment>(&sql)
            .bind(Uuid::new_v4())
            .bind(organization_id)
            .bind(department_id)
            .bind(&title)
            .bind(description)
            .bind(input.priority)
            .bind(input.assignee_id)
            .bind(creator.id())
            .bind(input.due_date)
            .fetch_one(&mut *conn)
            .await?;

        info!("User {} created task {} '{}'", creator.id(), task.id, task.title);
        Ok(task)
    }

    pub async fn update(&self, organization_id: Uuid, task_id: Uuid, update: TaskUpdate) -> ServiceResult<Assignment> {
        let title = update
            .title
            .as_deref()
            .map(|v| validation::required_text("title", v, 200))
            .transpose()?;

        let sql = format!(
            r#"
            UPDATE assignments
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                priority = COALESCE($5, priority),
                due_date = CASE WHEN $6 THEN $7 ELSE due_date END,
                updated_at = now()
            WHERE organization_id = $1 AND id = $2
            RETURNING {TASK_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Assignment>(&sql)
            .bind(organization_id)
            .bind(task_id)
            .bind(title)
            .bind(update.description.map(|d| d.trim().to_string()))
            .bind(update.priority)
            .bind(update.due_date.is_some())
            .bind(update.due_date.flatten())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task"))
    }

    pub async fn delete(&self, organization_id: Uuid, task_id: Uuid) -> ServiceResult<()> {
        let deleted = sqlx::query("DELETE FROM assignments WHERE organization_id = $1 AND id = $2")
            .bind(organization_id)
            .bind(task_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(ServiceError::not_found("Task"));
        }
        Ok(())
    }

    /// Progress a task. The assignee may do this for their own task; everyone
    /// else needs the task-management permission.
    pub async fn set_status(&self, actor: &Member, task_id: Uuid, status: TaskStatus) -> ServiceResult<Assignment> {
        let task = self.get(actor.organization_id(), task_id).await?;
        if task.assignee_id != Some(actor.id()) {
            actor.require(Permission::ManageTasks)?;
        }

        let sql = format!(
            r#"
            UPDATE assignments
            SET status = $3,
                completed_at = CASE WHEN $4 THEN COALESCE(completed_at, now()) ELSE NULL END,
                updated_at = now()
            WHERE organization_id = $1 AND id = $2
            RETURNING {TASK_COLUMNS}
            "#
        );
        let task = sqlx::query_as::<_, Assignment>(&sql)
            .bind(actor.organization_id())
            .bind(task_id)
            .bind(status)
            .bind(status == TaskStatus::Done)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task"))?;

        info!("User {} moved task {} to {:?}", actor.id(), task.id, task.status);
        Ok(task)
    }

    /// Move a task to another employee and/or department. When only the
    /// assignee changes, the task follows the assignee's department.
    pub async fn relocate(&self, organization_id: Uuid, task_id: Uuid, relocation: Relocation) -> ServiceResult<Assignment> {
        if relocation.assignee_id.is_none() && relocation.department_id.is_none() {
            return Err(ServiceError::validation(
                "assignee_id",
                "Provide an assignee, a department, or both",
            ));
        }

        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {TASK_COLUMNS} FROM assignments WHERE organization_id = $1 AND id = $2 FOR UPDATE");
        let task = sqlx::query_as::<_, Assignment>(&sql)
            .bind(organization_id)
            .bind(task_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task"))?;

        let mut department_id = task.department_id;
        let mut assignee_id = task.assignee_id;

        if let Some(new_assignee) = relocation.assignee_id {
            let assignee_department = member_department(&mut *tx, organization_id, new_assignee, "assignee_id").await?;
            assignee_id = Some(new_assignee);
            if relocation.department_id.is_none() {
                if let Some(department) = assignee_department {
                    department_id = Some(department);
                }
            }
        }

        if let Some(requested) = relocation.department_id {
            if let Some(id) = requested {
                ensure_department(&mut *tx, organization_id, id).await?;
            }
            department_id = requested;
        }

        let sql = format!(
            r#"
            UPDATE assignments
            SET assignee_id = $3, department_id = $4, updated_at = now()
            WHERE organization_id = $1 AND id = $2
            RETURNING {TASK_COLUMNS}
            "#
        );
        let moved = sqlx::query_as::<_, Assignment>(&sql)
            .bind(organization_id)
            .bind(task_id)
            .bind(assignee_id)
            .bind(department_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            "Relocated task {} to assignee {:?} in department {:?}",
            moved.id, moved.assignee_id, moved.department_id
        );
        Ok(moved)
    }
}
