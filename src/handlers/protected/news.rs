use axum::Extension;
use uuid::Uuid;

use crate::auth::{Member, Permission};
use crate::database::models::NewsPost;
use crate::middleware::{ApiResponse, ApiResult, DbPool, Json, Path, Query};
use crate::services::news_service::{NewNewsPost, NewsUpdate};
use crate::services::NewsService;
use crate::types::Pagination;

/// GET /api/news?page=&per_page= - pinned posts first
pub async fn news_list(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Vec<NewsPost>> {
    let posts = NewsService::new(pool).list(member.organization_id(), pagination).await?;
    Ok(ApiResponse::success(posts))
}

/// POST /api/news
pub async fn news_create(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Json(input): Json<NewNewsPost>,
) -> ApiResult<NewsPost> {
    member.require(Permission::PostNews)?;
    let post = NewsService::new(pool).create(&member, input).await?;
    Ok(ApiResponse::created(post))
}

/// GET /api/news/:id
pub async fn news_get(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<NewsPost> {
    let post = NewsService::new(pool).get(member.organization_id(), post_id).await?;
    Ok(ApiResponse::success(post))
}

/// PATCH /api/news/:id - author or news editor
pub async fn news_update(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(post_id): Path<Uuid>,
    Json(input): Json<NewsUpdate>,
) -> ApiResult<NewsPost> {
    let post = NewsService::new(pool).update(&member, post_id, input).await?;
    Ok(ApiResponse::success(post))
}

/// DELETE /api/news/:id - author or news editor
pub async fn news_delete(
    Extension(member): Extension<Member>,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<()> {
    NewsService::new(pool).delete(&member, post_id).await?;
    Ok(ApiResponse::no_content())
}
