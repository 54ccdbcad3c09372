//! Router-level checks that never reach the database: everything here is
//! rejected or answered before a pool is needed.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
};
use chrono::Duration;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use workhub::auth::{generate_jwt_with_secret, Claims};

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = workhub::app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(path: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(path);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn root_banner_is_public() {
    let (status, body) = send(get("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"]["endpoints"]["public_auth"].as_str().unwrap().contains("/auth/login"));
}

#[tokio::test]
async fn account_routes_require_a_token() {
    for path in ["/api/auth/whoami", "/api/organizations", "/api/join-requests/mine"] {
        let (status, body) = send(get(path, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", path);
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert_eq!(body["message"], "Missing Authorization header");
    }
}

#[tokio::test]
async fn member_routes_require_a_token() {
    for path in [
        "/api/organization",
        "/api/departments",
        "/api/employees",
        "/api/tasks",
        "/api/attendance",
        "/api/news",
        "/api/events",
        "/api/statistics",
        "/api/join-requests",
    ] {
        let (status, _) = send(get(path, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", path);
    }
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() {
    let (status, body) = send(get("/api/auth/whoami", Some("Basic dXNlcjpwYXNz"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authorization header must use Bearer token format");
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let (status, body) = send(get("/api/tasks", Some("Bearer not.a.jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid JWT token"));
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let claims = Claims::with_expiry(Uuid::new_v4(), "mallory@workhub.test", Duration::hours(1));
    let forged = generate_jwt_with_secret(&claims, "some-other-secret").unwrap();

    let (status, _) = send(get("/api/auth/whoami", Some(&format!("Bearer {}", forged)))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let secret = &workhub::config::config().security.jwt_secret;
    let claims = Claims::with_expiry(Uuid::new_v4(), "late@workhub.test", Duration::hours(-2));
    let expired = generate_jwt_with_secret(&claims, secret).unwrap();

    let (status, _) = send(get("/api/statistics", Some(&format!("Bearer {}", expired)))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, _) = send(get("/api/does-not-exist", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_method_is_not_allowed() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/auth/login")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

fn post_json(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn mistyped_body_uses_the_error_envelope() {
    let (status, body) = send(post_json("/auth/login", r#"{"email": 5, "password": "x"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["message"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn malformed_json_uses_the_error_envelope() {
    let (status, body) = send(post_json("/auth/register", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn body_without_json_content_type_is_rejected() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .body(Body::from(r#"{"email":"a@b.co","password":"secret"}"#))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}
