//! Prediction service client.

use crate::config::ClientConfig;
use crate::error::PredictError;
use crate::types::{Confidence, ConfidenceScale, ImageUpload, Prediction};
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;

/// Multipart field the service reads the image from.
pub const IMAGE_FIELD: &str = "image";

/// Anything that can turn an upload into a prediction.
pub trait PredictionClient: Send + Sync {
    fn predict(&self, upload: &ImageUpload) -> Result<Prediction, PredictError>;
}

#[derive(Debug, Deserialize)]
struct PredictionBody {
    predicted_class_name: String,
    confidence: f64,
}

/// Blocking reqwest client. Call it off the UI thread, see
/// [`crate::runner::PendingPrediction`].
pub struct HttpPredictionClient {
    http: reqwest::blocking::Client,
    config: ClientConfig,
}

impl HttpPredictionClient {
    pub fn new(config: ClientConfig) -> Result<Self, PredictError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PredictError::Transport(format!("http client setup failed: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `GET /ping` on the endpoint's origin.
    pub fn ping(&self) -> Result<(), PredictError> {
        let url = self.config.ping_url();
        let resp = self.http.get(url.clone()).send().map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PredictError::Status {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }
        tracing::debug!(%url, "prediction service reachable");
        Ok(())
    }
}

impl PredictionClient for HttpPredictionClient {
    fn predict(&self, upload: &ImageUpload) -> Result<Prediction, PredictError> {
        let part = Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.media_type)
            .map_err(|e| {
                PredictError::Transport(format!("invalid media type {}: {e}", upload.media_type))
            })?;
        let form = Form::new().part(IMAGE_FIELD, part);

        tracing::debug!(
            endpoint = %self.config.endpoint,
            file = %upload.file_name,
            bytes = upload.bytes.len(),
            "posting image"
        );
        let resp = self
            .http
            .post(self.config.endpoint.clone())
            .multipart(form)
            .send()
            .map_err(transport)?;

        let status = resp.status();
        let body = resp.bytes().map_err(transport)?;
        if !status.is_success() {
            return Err(PredictError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        parse_prediction(&body, self.config.confidence_scale)
    }
}

fn transport(err: reqwest::Error) -> PredictError {
    if err.is_timeout() {
        PredictError::Transport(format!("request timed out: {err}"))
    } else {
        PredictError::Transport(err.to_string())
    }
}

/// Decodes a 2xx body into a prediction.
pub fn parse_prediction(body: &[u8], scale: ConfidenceScale) -> Result<Prediction, PredictError> {
    let parsed: PredictionBody = serde_json::from_slice(body)
        .map_err(|e| PredictError::MalformedResponse(e.to_string()))?;

    let label = parsed.predicted_class_name.trim();
    if label.is_empty() {
        return Err(PredictError::MalformedResponse(
            "predicted_class_name is empty".into(),
        ));
    }
    let confidence = Confidence::from_raw(parsed.confidence, scale).ok_or_else(|| {
        PredictError::MalformedResponse(format!(
            "confidence {} out of range for {scale:?} scale",
            parsed.confidence
        ))
    })?;
    Ok(Prediction::new(label, confidence))
}
