//! Client for the external workflow-automation service.
//!
//! Finished interviews are handed off to the workflow service's run
//! endpoint for downstream processing; its health endpoint feeds our
//! readiness probe. The handoff is best-effort: the interview API never
//! fails because the workflow service is down.

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::time::Duration;

/// HTTP client bound to one workflow service base URL.
#[derive(Clone)]
pub struct WorkflowClient {
    client: reqwest::Client,
    base_url: String,
}

impl WorkflowClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("building workflow HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the workflow service is reachable and healthy.
    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                tracing::debug!("workflow health check failed: {}", err);
                false
            }
        }
    }

    /// Submit a finished interview payload to the workflow run endpoint.
    pub async fn process_interview(&self, interview: Value) -> Result<Value> {
        let resp = self
            .client
            .post(format!("{}/api/v1/run", self.base_url))
            .json(&json!({
                "input_value": interview,
                "output_type": "chat",
                "tweaks": {}
            }))
            .send()
            .await
            .context("sending interview to workflow service")?
            .error_for_status()
            .context("workflow service rejected interview")?;

        resp.json::<Value>()
            .await
            .context("decoding workflow response")
    }
}
