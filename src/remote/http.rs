use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::config::{CaptureConfig, EndpointConfig};
use super::payload::{
    ClassificationResult, DatasetRecord, PredictRequest, SequenceField, UploadRequest,
};
use super::traits::GestureService;

/// [`GestureService`] backed by the classifier's JSON-over-HTTP API.
///
/// `ureq` is blocking, so every call runs on tokio's blocking pool and the
/// frame loop never waits on a socket.
pub struct HttpGestureService {
    agent: ureq::Agent,
    api_url: String,
    endpoints: EndpointConfig,
    field: SequenceField,
}

impl HttpGestureService {
    pub fn new(config: &CaptureConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout())
            .build();

        Self {
            agent,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
            field: config.sequence_field,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<String> {
        let agent = self.agent.clone();
        let url = self.url(path);

        tokio::task::spawn_blocking(move || -> Result<String> {
            let response = agent
                .post(&url)
                .set("Content-Type", "application/json")
                .send_json(body)
                .map_err(|e| anyhow!("POST {} failed: {}", url, e))?;
            response
                .into_string()
                .context(format!("Failed to read response from {}", url))
        })
        .await
        .context("HTTP worker task failed")?
    }

    async fn get(&self, path: &str) -> Result<String> {
        let agent = self.agent.clone();
        let url = self.url(path);

        tokio::task::spawn_blocking(move || -> Result<String> {
            let response = agent
                .get(&url)
                .call()
                .map_err(|e| anyhow!("GET {} failed: {}", url, e))?;
            response
                .into_string()
                .context(format!("Failed to read response from {}", url))
        })
        .await
        .context("HTTP worker task failed")?
    }
}

#[async_trait]
impl GestureService for HttpGestureService {
    async fn upload(&self, request: UploadRequest) -> Result<()> {
        log::debug!(
            "Uploading {} frames for label '{}'",
            request.sequence.len(),
            request.label
        );
        self.post_json(&self.endpoints.upload, request.to_json(self.field))
            .await?;
        Ok(())
    }

    async fn predict(&self, request: PredictRequest) -> Result<ClassificationResult> {
        let path = if request.is_single_frame() {
            &self.endpoints.predict_frame
        } else {
            &self.endpoints.predict
        };

        let body = self.post_json(path, request.to_json(self.field)).await?;
        serde_json::from_str(&body)
            .context(format!("Unexpected prediction response: {}", truncate(&body, 200)))
    }

    async fn dataset(&self) -> Result<Vec<DatasetRecord>> {
        let body = self.get(&self.endpoints.dataset).await?;
        serde_json::from_str(&body).context("Failed to parse dataset listing")
    }

    async fn health(&self) -> Result<()> {
        let agent = self.agent.clone();
        let url = self.url(&self.endpoints.health);

        tokio::task::spawn_blocking(move || answered(&url, agent.get(&url).call()))
            .await
            .context("HTTP worker task failed")?
    }
}

/// Any HTTP status means the backend is up; only transport failures count.
fn answered(url: &str, outcome: std::result::Result<ureq::Response, ureq::Error>) -> Result<()> {
    match outcome {
        Ok(_) => Ok(()),
        Err(ureq::Error::Status(code, _)) => {
            log::debug!("GET {} answered {}", url, code);
            Ok(())
        }
        Err(e) => Err(anyhow!("GET {} failed: {}", url, e)),
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
