use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use std::time::Duration;

use crate::config::OracleConfig;

/// One candidate pothole bounding box, in image-pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Detection {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("inference request failed: {0}")]
    Request(String),

    #[error("inference response malformed: {0}")]
    Malformed(String),
}

/// External detection service. Injected into the post-creation workflow so
/// tests can substitute a canned implementation.
#[async_trait]
pub trait DetectionOracle: Send + Sync {
    async fn detect(&self, image_bytes: &[u8]) -> Result<Vec<Detection>, OracleError>;
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    #[serde(default)]
    predictions: Vec<Detection>,
}

/// HTTP client for a hosted inference endpoint. The image is posted
/// base64-encoded; the response carries a `predictions` array of boxes.
/// Each attempt is bounded by the configured timeout and failed calls get
/// exactly one retry before the error propagates.
pub struct HttpOracle {
    client: reqwest::Client,
    infer_url: String,
}

impl HttpOracle {
    pub fn new(config: &OracleConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let infer_url = format!(
            "{}/{}?api_key={}",
            config.api_url.trim_end_matches('/'),
            config.model_id,
            config.api_key
        );

        Ok(Self { client, infer_url })
    }

    async fn infer_once(&self, payload: &str) -> Result<Vec<Detection>, OracleError> {
        let response = self
            .client
            .post(&self.infer_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OracleError::Request(format!(
                "inference endpoint returned {}",
                response.status()
            )));
        }

        let parsed: InferenceResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        Ok(parsed.predictions)
    }
}

#[async_trait]
impl DetectionOracle for HttpOracle {
    async fn detect(&self, image_bytes: &[u8]) -> Result<Vec<Detection>, OracleError> {
        let payload = base64::engine::general_purpose::STANDARD.encode(image_bytes);

        match self.infer_once(&payload).await {
            Ok(detections) => Ok(detections),
            Err(first) => {
                tracing::warn!("Oracle call failed, retrying once: {}", first);
                self.infer_once(&payload).await
            }
        }
    }
}
