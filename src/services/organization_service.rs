use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{validation, ServiceError, ServiceResult};
use crate::database::models::user::USER_COLUMNS;
use crate::database::models::{Organization, User};

/// Public listing entry shown to accounts looking for a company to join
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrganizationSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub employee_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationOverview {
    #[serde(flatten)]
    pub organization: Organization,
    pub owner: Option<User>,
    pub employee_count: i64,
    pub department_count: i64,
    pub role_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub struct OrganizationService {
    pool: PgPool,
}

impl OrganizationService {
    const SEARCH_LIMIT: i64 = 50;

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn search(&self, search: Option<&str>) -> ServiceResult<Vec<OrganizationSummary>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let rows = sqlx::query_as::<_, OrganizationSummary>(
            r#"
            SELECT o.id, o.name, o.description,
                   (SELECT COUNT(*) FROM users u WHERE u.organization_id = o.id) AS employee_count
            FROM organizations o
            WHERE $1::text IS NULL OR o.name ILIKE $1
            ORDER BY o.name
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(Self::SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn find(&self, organization_id: Uuid) -> ServiceResult<Option<Organization>> {
        let organization = sqlx::query_as::<_, Organization>(
            "SELECT id, name, description, owner_id, created_at, updated_at FROM organizations WHERE id = $1",
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(organization)
    }

    pub async fn overview(&self, organization: Organization) -> ServiceResult<OrganizationOverview> {
        let owner = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(organization.owner_id)
            .fetch_optional(&self.pool)
            .await?;

        let (employee_count, department_count, role_count): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users WHERE organization_id = $1),
                (SELECT COUNT(*) FROM departments WHERE organization_id = $1),
                (SELECT COUNT(*) FROM roles WHERE organization_id = $1)
            "#,
        )
        .bind(organization.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(OrganizationOverview {
            organization,
            owner,
            employee_count,
            department_count,
            role_count,
        })
    }

    pub async fn update(&self, organization_id: Uuid, update: OrganizationUpdate) -> ServiceResult<Organization> {
        let name = update
            .name
            .as_deref()
            .map(|v| validation::required_text("name", v, 120))
            .transpose()?;
        let description = update.description.map(|d| d.trim().to_string());

        let organization = sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, owner_id, created_at, updated_at
            "#,
        )
        .bind(organization_id)
        .bind(&name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ServiceError::on_unique(e, "An organization with this name already exists"))?
        .ok_or_else(|| ServiceError::not_found("Organization"))?;

        Ok(organization)
    }

    /// Delete the organization and everything it owns; members become plain accounts again
    pub async fn delete(&self, organization_id: Uuid) -> ServiceResult<u64> {
        let mut tx = self.pool.begin().await?;

        let detached = sqlx::query(
            r#"
            UPDATE users
            SET organization_id = NULL, department_id = NULL, role_id = NULL,
                position = NULL, hired_at = NULL, updated_at = now()
            WHERE organization_id = $1
            "#,
        )
        .bind(organization_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(organization_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(ServiceError::not_found("Organization"));
        }

        tx.commit().await?;

        info!("Deleted organization {} and detached {} members", organization_id, detached);
        Ok(detached)
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
