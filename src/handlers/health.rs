use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;

/// GET / - service banner with the endpoint map
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "WorkHub API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Organization management: departments, roles, tasks, attendance, news and events",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/register, /auth/register-company, /auth/login (public - token acquisition)",
                "session": "/api/auth/whoami, /api/auth/refresh, /api/auth/password, /api/auth/profile (account)",
                "organizations": "/api/organizations (account), /api/organization (member)",
                "join_requests": "/api/join-requests[/mine|/:id[/approve|/reject]]",
                "departments": "/api/departments[/:id[/employees]] (member)",
                "roles": "/api/roles[/:id] (member)",
                "employees": "/api/employees[/:id|/leave] (member)",
                "tasks": "/api/tasks[/:id[/status|/relocate]] (member)",
                "attendance": "/api/attendance[/check-in|/check-out|/:id] (member)",
                "news": "/api/news[/:id] (member)",
                "events": "/api/events[/:id] (member)",
                "statistics": "/api/statistics (member)",
            }
        }
    }))
}

/// GET /health - database connectivity probe
pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable"
                    }
                })),
            )
        }
    }
}
