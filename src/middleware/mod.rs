pub mod auth;
pub mod extract;
pub mod response;
pub mod validate_member;

pub use auth::{jwt_auth_middleware, DbPool};
pub use extract::{Json, Path, Query};
pub use response::{ApiResponse, ApiResult};
pub use validate_member::validate_member_middleware;
