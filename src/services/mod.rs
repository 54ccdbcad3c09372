pub mod account_service;
pub mod attendance_service;
pub mod department_service;
pub mod employee_service;
pub mod event_service;
pub mod join_request_service;
pub mod news_service;
pub mod organization_service;
pub mod role_service;
pub mod statistics_service;
pub mod task_service;
pub mod validation;

pub use account_service::AccountService;
pub use attendance_service::AttendanceService;
pub use department_service::DepartmentService;
pub use employee_service::EmployeeService;
pub use event_service::EventService;
pub use join_request_service::JoinRequestService;
pub use news_service::NewsService;
pub use organization_service::OrganizationService;
pub use role_service::RoleService;
pub use statistics_service::StatisticsService;
pub use task_service::TaskService;

use crate::auth::JwtError;
use crate::database::DatabaseError;

/// Domain-level failures raised by the services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Token(#[from] JwtError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Turn a unique-constraint violation into a conflict with a readable message
    pub fn on_unique(err: sqlx::Error, message: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => ServiceError::Conflict(message.into()),
            _ => ServiceError::Sqlx(err),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
