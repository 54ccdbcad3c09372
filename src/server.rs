use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config;
use crate::handlers::{self, account, protected, public};
use crate::middleware::{jwt_auth_middleware, validate_member_middleware};

/// The complete application router: public, account and member tiers plus
/// CORS and request tracing.
pub fn app() -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(public_routes())
        .merge(account_routes())
        .merge(member_routes())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

/// Bind the configured port and serve until the process is stopped
pub async fn serve(port: u16) -> anyhow::Result<()> {
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("WorkHub API listening on http://{}", bind_addr);

    axum::serve(listener, app()).await?;
    Ok(())
}

fn public_routes() -> Router {
    Router::new()
        .route("/auth/register", post(public::register))
        .route("/auth/register-company", post(public::register_company))
        .route("/auth/login", post(public::login))
}

fn account_routes() -> Router {
    use account::{join_requests, organizations, session};

    Router::new()
        .route("/api/auth/whoami", get(session::whoami))
        .route("/api/auth/refresh", post(session::refresh))
        .route("/api/auth/password", put(session::change_password))
        .route("/api/auth/profile", patch(session::update_profile))
        .route("/api/organizations", get(organizations::organization_search))
        .route("/api/join-requests", post(join_requests::join_request_create))
        .route("/api/join-requests/mine", get(join_requests::join_request_mine))
        .route("/api/join-requests/:id", axum::routing::delete(join_requests::join_request_cancel))
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn member_routes() -> Router {
    use protected::*;

    Router::new()
        .route(
            "/api/organization",
            get(organization::organization_get)
                .patch(organization::organization_update)
                .delete(organization::organization_delete),
        )
        .route(
            "/api/departments",
            get(departments::department_list).post(departments::department_create),
        )
        .route(
            "/api/departments/:id",
            get(departments::department_get)
                .patch(departments::department_update)
                .delete(departments::department_delete),
        )
        .route("/api/departments/:id/employees", get(departments::department_employees))
        .route("/api/roles", get(roles::role_list).post(roles::role_create))
        .route(
            "/api/roles/:id",
            get(roles::role_get).patch(roles::role_update).delete(roles::role_delete),
        )
        .route("/api/employees", get(employees::employee_list))
        .route("/api/employees/leave", post(employees::employee_leave))
        .route(
            "/api/employees/:id",
            get(employees::employee_get)
                .patch(employees::employee_update)
                .delete(employees::employee_dismiss),
        )
        .route("/api/join-requests", get(join_requests::join_request_list))
        .route("/api/join-requests/:id/approve", post(join_requests::join_request_approve))
        .route("/api/join-requests/:id/reject", post(join_requests::join_request_reject))
        .route("/api/tasks", get(tasks::task_list).post(tasks::task_create))
        .route(
            "/api/tasks/:id",
            get(tasks::task_get).patch(tasks::task_update).delete(tasks::task_delete),
        )
        .route("/api/tasks/:id/status", put(tasks::task_set_status))
        .route("/api/tasks/:id/relocate", post(tasks::task_relocate))
        .route(
            "/api/attendance",
            get(attendance::attendance_list).post(attendance::attendance_record),
        )
        .route("/api/attendance/check-in", post(attendance::attendance_check_in))
        .route("/api/attendance/check-out", post(attendance::attendance_check_out))
        .route("/api/attendance/:id", axum::routing::delete(attendance::attendance_delete))
        .route("/api/news", get(news::news_list).post(news::news_create))
        .route(
            "/api/news/:id",
            get(news::news_get).patch(news::news_update).delete(news::news_delete),
        )
        .route("/api/events", get(events::event_list).post(events::event_create))
        .route(
            "/api/events/:id",
            get(events::event_get).patch(events::event_update).delete(events::event_delete),
        )
        .route("/api/statistics", get(statistics::statistics_get))
        // Layers run outside-in: the JWT check happens before membership is resolved
        .route_layer(middleware::from_fn(validate_member_middleware))
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn cors_layer() -> CorsLayer {
    let origins = &config::config().security.cors_origins;
    if crate::is_development!() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
