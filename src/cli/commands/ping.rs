use std::time::{Duration, Instant};

use anyhow::Context;
use serde_json::{json, Value};

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

/// Call `GET {url}/health` on a running server
pub async fn handle(url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let endpoint = format!("{}/health", url.trim_end_matches('/'));
    let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;

    let started = Instant::now();
    let response = client
        .get(&endpoint)
        .send()
        .await
        .with_context(|| format!("failed to reach {}", endpoint))?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        output_success(
            output_format,
            &format!("{} is healthy ({} ms)", url, elapsed_ms),
            Some(json!({ "status": status.as_u16(), "elapsed_ms": elapsed_ms, "health": body })),
        )
    } else {
        output_error(
            output_format,
            &format!("{} responded {} ({} ms)", url, status, elapsed_ms),
            Some("UNHEALTHY"),
        )?;
        anyhow::bail!("server at {} is unhealthy", url)
    }
}
