use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{validation, ServiceError, ServiceResult};
use crate::auth::{Member, Permission};
use crate::database::models::NewsPost;
use crate::types::Pagination;

#[derive(Debug, Clone, Deserialize)]
pub struct NewNewsPost {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub pinned: Option<bool>,
}

pub struct NewsService {
    pool: PgPool,
}

const NEWS_COLUMNS: &str = "id, organization_id, author_id, title, body, pinned, created_at, updated_at";

impl NewsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Pinned posts first, then newest first
    pub async fn list(&self, organization_id: Uuid, pagination: Pagination) -> ServiceResult<Vec<NewsPost>> {
        let (limit, offset) = pagination.limit_offset();
        let sql = format!(
            "SELECT {NEWS_COLUMNS} FROM news WHERE organization_id = $1 \
             ORDER BY pinned DESC, created_at DESC LIMIT $2 OFFSET $3"
        );
        let posts = sqlx::query_as::<_, NewsPost>(&sql)
            .bind(organization_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    pub async fn get(&self, organization_id: Uuid, post_id: Uuid) -> ServiceResult<NewsPost> {
        let sql = format!("SELECT {NEWS_COLUMNS} FROM news WHERE organization_id = $1 AND id = $2");
        sqlx::query_as::<_, NewsPost>(&sql)
            .bind(organization_id)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("News post"))
    }

    pub async fn create(&self, author: &Member, input: NewNewsPost) -> ServiceResult<NewsPost> {
        let title = validation::required_text("title", &input.title, 200)?;
        let body = validation::required_text("body", &input.body, 20_000)?;

        let sql = format!(
            "INSERT INTO news (id, organization_id, author_id, title, body, pinned) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {NEWS_COLUMNS}"
        );
        let post = sqlx::query_as::<_, NewsPost>(&sql)
            .bind(Uuid::new_v4())
            .bind(author.organization_id())
            .bind(author.id())
            .bind(title)
            .bind(body)
            .bind(input.pinned)
            .fetch_one(&self.pool)
            .await?;

        info!("User {} published news {}", author.id(), post.id);
        Ok(post)
    }

    pub async fn update(&self, editor: &Member, post_id: Uuid, update: NewsUpdate) -> ServiceResult<NewsPost> {
        let existing = self.get(editor.organization_id(), post_id).await?;
        Self::ensure_can_edit(editor, &existing)?;

        let title = update
            .title
            .as_deref()
            .map(|v| validation::required_text("title", v, 200))
            .transpose()?;
        let body = update
            .body
            .as_deref()
            .map(|v| validation::required_text("body", v, 20_000))
            .transpose()?;

        let sql = format!(
            r#"
            UPDATE news
            SET title = COALESCE($3, title), body = COALESCE($4, body),
                pinned = COALESCE($5, pinned), updated_at = now()
            WHERE organization_id = $1 AND id = $2
            RETURNING {NEWS_COLUMNS}
            "#
        );
        sqlx::query_as::<_, NewsPost>(&sql)
            .bind(editor.organization_id())
            .bind(post_id)
            .bind(title)
            .bind(body)
            .bind(update.pinned)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("News post"))
    }

    pub async fn delete(&self, editor: &Member, post_id: Uuid) -> ServiceResult<()> {
        let existing = self.get(editor.organization_id(), post_id).await?;
        Self::ensure_can_edit(editor, &existing)?;

        sqlx::query("DELETE FROM news WHERE organization_id = $1 AND id = $2")
            .bind(editor.organization_id())
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        info!("User {} deleted news {}", editor.id(), post_id);
        Ok(())
    }

    /// Authors manage their own posts; everyone else needs the news permission
    fn ensure_can_edit(editor: &Member, post: &NewsPost) -> ServiceResult<()> {
        if post.author_id == Some(editor.id()) {
            return Ok(());
        }
        editor.require(Permission::PostNews)
    }
}
