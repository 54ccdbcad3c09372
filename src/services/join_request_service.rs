use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::employee_service::{ensure_department, ensure_role};
use super::{validation, ServiceError, ServiceResult};
use crate::auth::Member;
use crate::database::models::{JoinRequest, JoinRequestStatus, User};

/// A join request with the organization and applicant it refers to
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JoinRequestView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: JoinRequest,
    pub organization_name: String,
    pub applicant_email: String,
    pub applicant_first_name: String,
    pub applicant_last_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewJoinRequest {
    pub organization_id: Uuid,
    pub message: Option<String>,
}

/// Placement of the applicant when a request is approved
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Approval {
    pub department_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    pub request: JoinRequest,
    pub other_requests_rejected: u64,
}

pub struct JoinRequestService {
    pool: PgPool,
}

const VIEW_SELECT: &str = r#"
    SELECT j.id, j.organization_id, j.user_id, j.message, j.status, j.decided_by, j.decided_at, j.created_at,
           o.name AS organization_name,
           u.email AS applicant_email, u.first_name AS applicant_first_name, u.last_name AS applicant_last_name
    FROM join_requests j
    JOIN organizations o ON o.id = j.organization_id
    JOIN users u ON u.id = j.user_id
"#;

const REQUEST_COLUMNS: &str = "id, organization_id, user_id, message, status, decided_by, decided_at, created_at";

impl JoinRequestService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// An account without an organization asks to join one
    pub async fn create(&self, applicant: &User, input: NewJoinRequest) -> ServiceResult<JoinRequest> {
        if applicant.organization_id.is_some() {
            return Err(ServiceError::conflict("You already belong to an organization"));
        }
        let message = validation::optional_text("message", input.message.as_deref(), 2000)?.unwrap_or_default();

        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM organizations WHERE id = $1")
            .bind(input.organization_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(ServiceError::not_found("Organization"));
        }

        let sql = format!(
            "INSERT INTO join_requests (id, organization_id, user_id, message) VALUES ($1, $2, $3, $4) RETURNING {REQUEST_COLUMNS}"
        );
        let request = sqlx::query_as::<_, JoinRequest>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.organization_id)
            .bind(applicant.id)
            .bind(message)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ServiceError::on_unique(e, "A pending request to this organization already exists"))?;

        info!(
            "User {} requested to join organization {}",
            applicant.id, request.organization_id
        );
        Ok(request)
    }

    pub async fn list_for_applicant(&self, user_id: Uuid) -> ServiceResult<Vec<JoinRequestView>> {
        let sql = format!("{VIEW_SELECT} WHERE j.user_id = $1 ORDER BY j.created_at DESC");
        let rows = sqlx::query_as::<_, JoinRequestView>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_for_organization(
        &self,
        organization_id: Uuid,
        status: Option<JoinRequestStatus>,
    ) -> ServiceResult<Vec<JoinRequestView>> {
        let sql = format!(
            "{VIEW_SELECT} WHERE j.organization_id = $1 AND ($2::join_request_status IS NULL OR j.status = $2) \
             ORDER BY j.created_at DESC"
        );
        let rows = sqlx::query_as::<_, JoinRequestView>(&sql)
            .bind(organization_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Applicant withdraws a request that has not been decided yet
    pub async fn cancel(&self, user_id: Uuid, request_id: Uuid) -> ServiceResult<()> {
        let deleted = sqlx::query("DELETE FROM join_requests WHERE id = $1 AND user_id = $2 AND status = 'pending'")
            .bind(request_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(ServiceError::not_found("Pending join request"));
        }
        Ok(())
    }

    /// Accept the applicant into the organization. The request row and the
    /// applicant row are locked for the whole transaction.
    pub async fn approve(&self, reviewer: &Member, request_id: Uuid, approval: Approval) -> ServiceResult<ApprovalOutcome> {
        let organization_id = reviewer.organization_id();
        let reviewer_id = reviewer.id();
        let position = validation::optional_text("position", approval.position.as_deref(), 120)?;

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM join_requests WHERE id = $1 AND organization_id = $2 FOR UPDATE"
        );
        let request = sqlx::query_as::<_, JoinRequest>(&sql)
            .bind(request_id)
            .bind(organization_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::not_found("Join request"))?;

        if request.status != JoinRequestStatus::Pending {
            return Err(ServiceError::conflict("Join request has already been decided"));
        }

        if let Some(department_id) = approval.department_id {
            ensure_department(&mut *tx, organization_id, department_id).await?;
        }
        if let Some(role_id) = approval.role_id {
            let grants_admin = ensure_role(&mut *tx, organization_id, role_id).await?;
            if grants_admin && !reviewer.is_admin() {
                return Err(ServiceError::forbidden("Only administrators can grant an administrator role"));
            }
        }

        let (current_organization,): (Option<Uuid>,) =
            sqlx::query_as("SELECT organization_id FROM users WHERE id = $1 FOR UPDATE")
                .bind(request.user_id)
                .fetch_one(&mut *tx)
                .await?;
        if current_organization.is_some() {
            return Err(ServiceError::conflict("Applicant already belongs to an organization"));
        }

        sqlx::query(
            r#"
            UPDATE users
            SET organization_id = $2, department_id = $3, role_id = $4, position = $5,
                hired_at = now(), updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(request.user_id)
        .bind(organization_id)
        .bind(approval.department_id)
        .bind(approval.role_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            r#"
            UPDATE join_requests
            SET status = 'approved', decided_by = $2, decided_at = now()
            WHERE id = $1
            RETURNING {REQUEST_COLUMNS}
            "#
        );
        let request = sqlx::query_as::<_, JoinRequest>(&sql)
            .bind(request_id)
            .bind(reviewer_id)
            .fetch_one(&mut *tx)
            .await?;

        let other_requests_rejected = sqlx::query(
            r#"
            UPDATE join_requests
            SET status = 'rejected', decided_at = now()
            WHERE user_id = $1 AND id <> $2 AND status = 'pending'
            "#,
        )
        .bind(request.user_id)
        .bind(request.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        info!(
            "User {} approved join request {}; {} joined organization {}",
            reviewer_id, request.id, request.user_id, organization_id
        );
        Ok(ApprovalOutcome {
            request,
            other_requests_rejected,
        })
    }

    pub async fn reject(&self, organization_id: Uuid, reviewer_id: Uuid, request_id: Uuid) -> ServiceResult<JoinRequest> {
        let sql = format!(
            r#"
            UPDATE join_requests
            SET status = 'rejected', decided_by = $3, decided_at = now()
            WHERE id = $1 AND organization_id = $2 AND status = 'pending'
            RETURNING {REQUEST_COLUMNS}
            "#
        );
        let rejected = sqlx::query_as::<_, JoinRequest>(&sql)
            .bind(request_id)
            .bind(organization_id)
            .bind(reviewer_id)
            .fetch_optional(&self.pool)
            .await?;

        match rejected {
            Some(request) => {
                info!("User {} rejected join request {}", reviewer_id, request.id);
                Ok(request)
            }
            None => {
                let sql = "SELECT status FROM join_requests WHERE id = $1 AND organization_id = $2";
                let existing: Option<(JoinRequestStatus,)> = sqlx::query_as(sql)
                    .bind(request_id)
                    .bind(organization_id)
                    .fetch_optional(&self.pool)
                    .await?;
                match existing {
                    Some(_) => Err(ServiceError::conflict("Join request has already been decided")),
                    None => Err(ServiceError::not_found("Join request")),
                }
            }
        }
    }
}
