use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::{validation, ServiceError, ServiceResult};
use crate::database::models::Event;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Only events that have not ended yet
    #[serde(default)]
    pub upcoming: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::types::nullable")]
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

pub struct EventService {
    pool: PgPool,
}

const EVENT_COLUMNS: &str = "id, organization_id, created_by, title, description, location, starts_at, ends_at, created_at";

fn check_window(starts_at: DateTime<Utc>, ends_at: Option<DateTime<Utc>>) -> ServiceResult<()> {
    match ends_at {
        Some(end) if end < starts_at => Err(ServiceError::validation("ends_at", "Event cannot end before it starts")),
        _ => Ok(()),
    }
}

impl EventService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, organization_id: Uuid, filter: &EventFilter) -> ServiceResult<Vec<Event>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {EVENT_COLUMNS} FROM events WHERE organization_id = "));
        query.push_bind(organization_id);

        if let Some(from) = filter.from {
            query.push(" AND starts_at::date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND starts_at::date <= ").push_bind(to);
        }
        if filter.upcoming {
            query.push(" AND COALESCE(ends_at, starts_at) >= ").push_bind(Utc::now());
        }
        query.push(" ORDER BY starts_at");

        let events = query.build_query_as::<Event>().fetch_all(&self.pool).await?;
        Ok(events)
    }

    pub async fn get(&self, organization_id: Uuid, event_id: Uuid) -> ServiceResult<Event> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE organization_id = $1 AND id = $2");
        sqlx::query_as::<_, Event>(&sql)
            .bind(organization_id)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Event"))
    }

    pub async fn create(&self, organization_id: Uuid, creator_id: Uuid, input: NewEvent) -> ServiceResult<Event> {
        let title = validation::required_text("title", &input.title, 200)?;
        check_window(input.starts_at, input.ends_at)?;

        let sql = format!(
            "INSERT INTO events (id, organization_id, created_by, title, description, location, starts_at, ends_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {EVENT_COLUMNS}"
        );
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(Uuid::new_v4())
            .bind(organization_id)
            .bind(creator_id)
            .bind(title)
            .bind(input.description.map(|d| d.trim().to_string()).unwrap_or_default())
            .bind(input.location.map(|l| l.trim().to_string()).unwrap_or_default())
            .bind(input.starts_at)
            .bind(input.ends_at)
            .fetch_one(&self.pool)
            .await?;

        info!("User {} scheduled event {} at {}", creator_id, event.id, event.starts_at);
        Ok(event)
    }

    pub async fn update(&self, organization_id: Uuid, event_id: Uuid, update: EventUpdate) -> ServiceResult<Event> {
        let existing = self.get(organization_id, event_id).await?;
        let title = update
            .title
            .as_deref()
            .map(|v| validation::required_text("title", v, 200))
            .transpose()?;

        let starts_at = update.starts_at.unwrap_or(existing.starts_at);
        let ends_at = match update.ends_at {
            Some(value) => value,
            None => existing.ends_at,
        };
        check_window(starts_at, ends_at)?;

        let sql = format!(
            r#"
            UPDATE events
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                location = COALESCE($5, location),
                starts_at = $6,
                ends_at = $7
            WHERE organization_id = $1 AND id = $2
            RETURNING {EVENT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Event>(&sql)
            .bind(organization_id)
            .bind(event_id)
            .bind(title)
            .bind(update.description.map(|d| d.trim().to_string()))
            .bind(update.location.map(|l| l.trim().to_string()))
            .bind(starts_at)
            .bind(ends_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Event"))
    }

    pub async fn delete(&self, organization_id: Uuid, event_id: Uuid) -> ServiceResult<()> {
        let deleted = sqlx::query("DELETE FROM events WHERE organization_id = $1 AND id = $2")
            .bind(organization_id)
            .bind(event_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(ServiceError::not_found("Event"));
        }
        Ok(())
    }
}
