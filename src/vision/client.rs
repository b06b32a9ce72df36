use crate::http::build_client;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::Serialize;
use serde_json::Value;
use std::{path::Path, time::Duration};
use thiserror::Error;
use tracing::{debug, warn};

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const EXTRACT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub endpoint: String,
    pub probe_timeout: Duration,
    pub extract_timeout: Duration,
}

impl VisionConfig {
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("VISION_API_URL")
                .unwrap_or_else(|_| "http://localhost:8501/recognize".into()),
        )
    }

    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            probe_timeout: PROBE_TIMEOUT,
            extract_timeout: EXTRACT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisionFailure {
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("image unreadable: {0}")]
    ImageUnreadable(String),
    #[error("request cancelled")]
    Cancelled,
}

impl VisionFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            VisionFailure::ServiceUnavailable(_) => "service_unavailable",
            VisionFailure::Upstream(_) => "upstream_error",
            VisionFailure::MalformedResponse(_) => "malformed_response",
            VisionFailure::ImageUnreadable(_) => "image_unreadable",
            VisionFailure::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Healthy { status: u16 },
    Unhealthy { reason: String },
}

/// Which payload field the labels were read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelField {
    Tags,
    English,
}

/// Labels in upstream rank order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLabelList {
    pub labels: Vec<String>,
    pub field: LabelField,
}

/// Decodes a recognition response body.
///
/// The body must be a JSON object. `tags` wins when it is an array of strings;
/// otherwise `english` is tried. Any other shape is rejected.
pub fn decode_labels(body: &[u8]) -> Result<RawLabelList, VisionFailure> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|err| VisionFailure::MalformedResponse(err.to_string()))?;
    let Some(payload) = payload.as_object() else {
        return Err(VisionFailure::MalformedResponse(
            "response body is not a JSON object".into(),
        ));
    };
    let candidates = [(LabelField::Tags, "tags"), (LabelField::English, "english")];
    for (field, key) in candidates {
        if let Some(labels) = payload.get(key).and_then(string_list) {
            return Ok(RawLabelList { labels, field });
        }
    }
    Err(VisionFailure::MalformedResponse(
        "neither `tags` nor `english` is a list of strings".into(),
    ))
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

pub struct VisionClient {
    http: Client,
    config: VisionConfig,
}

impl VisionClient {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            http: build_client(),
            config,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.config.endpoint.trim()
    }

    /// The service has no health route, so any answer below 500 counts as alive.
    pub async fn probe_outcome(&self) -> ProbeOutcome {
        let endpoint = self.endpoint();
        if endpoint.is_empty() {
            return ProbeOutcome::Unhealthy {
                reason: "missing endpoint".into(),
            };
        }
        let reason = match self
            .http
            .head(endpoint)
            .timeout(self.config.probe_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().as_u16() < 500 => {
                return ProbeOutcome::Healthy {
                    status: response.status().as_u16(),
                };
            }
            Ok(response) => format!("HTTP {}", response.status()),
            Err(err) => err.to_string(),
        };
        warn!(target = "pantry.vision", endpoint = %endpoint, %reason, "vision_probe_failed");
        ProbeOutcome::Unhealthy { reason }
    }

    /// Uploads the image for labelling. Callers probe first and skip this when the
    /// service is unhealthy.
    pub async fn upload(&self, image_path: &Path) -> Result<RawLabelList, VisionFailure> {
        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|err| VisionFailure::ImageUnreadable(err.to_string()))?;
        let file_name = image_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();
        let form = Form::new().part("image", Part::bytes(bytes).file_name(file_name));

        let response = self
            .http
            .post(self.endpoint())
            .multipart(form)
            .timeout(self.config.extract_timeout)
            .send()
            .await
            .map_err(|err| VisionFailure::Upstream(err.to_string()))?;

        if !response.status().is_success() {
            return Err(VisionFailure::Upstream(format!("HTTP {}", response.status())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| VisionFailure::Upstream(err.to_string()))?;
        let labels = decode_labels(&body)?;
        debug!(
            target = "pantry.vision",
            count = labels.labels.len(),
            field = ?labels.field,
            "vision_labels_received"
        );
        Ok(labels)
    }
}
