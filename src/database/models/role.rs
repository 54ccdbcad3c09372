use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named bundle of permission flags within one organization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub is_admin: bool,
    pub can_manage_employees: bool,
    pub can_manage_departments: bool,
    pub can_manage_roles: bool,
    pub can_manage_tasks: bool,
    pub can_post_news: bool,
    pub can_manage_events: bool,
    pub can_manage_attendance: bool,
    pub can_view_statistics: bool,
    pub can_review_join_requests: bool,
    pub created_at: DateTime<Utc>,
}

pub const ADMINISTRATOR_ROLE: &str = "Administrator";
