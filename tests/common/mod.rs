#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use uuid::Uuid;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Inherit environment so the server sees DATABASE_URL and JWT_SECRET
        let child = Command::new(env!("CARGO_BIN_EXE_workhub"))
            .env("WORKHUB_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// Database-backed tests only run when DATABASE_URL points at a disposable database
pub fn database_configured() -> bool {
    let configured = std::env::var("DATABASE_URL").map(|v| !v.is_empty()).unwrap_or(false);
    if !configured {
        eprintln!("DATABASE_URL not set; skipping database-backed test");
    }
    configured
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@workhub.test", prefix, Uuid::new_v4().simple())
}

/// Thin JSON client bound to one bearer token
#[derive(Clone)]
pub struct Api {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl Api {
    pub fn anonymous(server: &TestServer) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: server.base_url.clone(),
            token: None,
        }
    }

    pub fn with_token(&self, token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            ..self.clone()
        }
    }

    pub async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut request = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).with_context(|| format!("non-JSON body: {}", text))?
        };
        Ok((status, value))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::DELETE, path, None).await
    }
}

/// Register a company and return an API client for its owner plus the organization id
pub async fn register_company(server: &TestServer, name: &str) -> Result<(Api, String)> {
    let api = Api::anonymous(server);
    let (status, body) = api
        .post(
            "/auth/register-company",
            serde_json::json!({
                "email": unique_email("owner"),
                "password": "owner-password",
                "first_name": "Olga",
                "last_name": "Owner",
                "organization_name": format!("{} {}", name, Uuid::new_v4().simple()),
            }),
        )
        .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "register-company failed: {} {}", status, body);

    let token = body["data"]["token"].as_str().context("token missing")?;
    let organization_id = body["data"]["organization"]["id"].as_str().context("organization missing")?;
    Ok((api.with_token(token), organization_id.to_string()))
}

/// Register a stand-alone account and return a client for it plus the account id
pub async fn register_account(server: &TestServer, first_name: &str) -> Result<(Api, String)> {
    let api = Api::anonymous(server);
    let (status, body) = api
        .post(
            "/auth/register",
            serde_json::json!({
                "email": unique_email(&first_name.to_lowercase()),
                "password": "member-password",
                "first_name": first_name,
                "last_name": "Tester",
            }),
        )
        .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);

    let token = body["data"]["token"].as_str().context("token missing")?;
    let user_id = body["data"]["user"]["id"].as_str().context("user missing")?;
    Ok((api.with_token(token), user_id.to_string()))
}

/// Send a join request from `applicant` and approve it as `reviewer`
pub async fn hire(reviewer: &Api, applicant: &Api, organization_id: &str, placement: Value) -> Result<Value> {
    let (status, body) = applicant
        .post("/api/join-requests", serde_json::json!({ "organization_id": organization_id }))
        .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "join request failed: {} {}", status, body);
    let request_id = body["data"]["id"].as_str().context("request id missing")?;

    let (status, body) = reviewer
        .post(&format!("/api/join-requests/{}/approve", request_id), placement)
        .await?;
    anyhow::ensure!(status == StatusCode::OK, "approve failed: {} {}", status, body);
    Ok(body["data"].clone())
}
