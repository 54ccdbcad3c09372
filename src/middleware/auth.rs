use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;

use crate::auth::{validate_jwt, Account};
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::services::AccountService;

/// Connection pool handed to authenticated handlers
#[derive(Clone)]
pub struct DbPool(pub PgPool);

/// JWT authentication middleware. Validates the bearer token, loads the
/// account it was issued for and injects `Account` and `DbPool`.
pub async fn jwt_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = validate_jwt(&token)?;

    let pool = DatabaseManager::main_pool().await?;
    let user = AccountService::new(pool.clone())
        .find(claims.sub)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Token presented for missing account {}", claims.sub);
            ApiError::unauthorized("Account no longer exists")
        })?;

    tracing::debug!("Authenticated {} ({})", user.email, user.id);

    request.extensions_mut().insert(Account(user));
    request.extensions_mut().insert(DbPool(pool));

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if token.trim().is_empty() => Err("Empty JWT token".to_string()),
        Some(token) => Ok(token.trim().to_string()),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}
