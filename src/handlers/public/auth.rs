use serde::Deserialize;

use crate::database::manager::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, Json};
use crate::services::account_service::{NewAccount, NewCompany, Session};
use crate::services::AccountService;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register - create a stand-alone account
///
/// Expected Input:
/// ```json
/// { "email": "ann@example.com", "password": "secret-pass", "first_name": "Ann", "last_name": "Lee" }
/// ```
///
/// Responds `201` with `{ "token", "expires_in", "user" }`.
pub async fn register(Json(input): Json<NewAccount>) -> ApiResult<Session> {
    let pool = DatabaseManager::main_pool().await?;
    let user = AccountService::new(pool).register(input).await?;
    Ok(ApiResponse::created(AccountService::issue_session(user, None)?))
}

/// POST /auth/register-company - create an account together with its organization
///
/// The caller becomes the owner and holds the built-in administrator role.
pub async fn register_company(Json(input): Json<NewCompany>) -> ApiResult<Session> {
    let pool = DatabaseManager::main_pool().await?;
    let (user, organization) = AccountService::new(pool).register_company(input).await?;
    Ok(ApiResponse::created(AccountService::issue_session(user, Some(organization))?))
}

/// POST /auth/login - exchange credentials for a JWT
pub async fn login(Json(input): Json<LoginRequest>) -> ApiResult<Session> {
    let pool = DatabaseManager::main_pool().await?;
    let user = AccountService::new(pool).login(&input.email, &input.password).await?;
    Ok(ApiResponse::success(AccountService::issue_session(user, None)?))
}
