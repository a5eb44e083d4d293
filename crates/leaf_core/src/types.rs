use crate::media;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Scale the prediction API reports `confidence` in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceScale {
    /// 0-100, what the potato leaf service returns.
    #[default]
    Percent,
    /// 0-1 probability.
    Fraction,
}

/// Model confidence, normalised to percent in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confidence(f64);

impl Confidence {
    /// Normalises a raw API value. Returns `None` for values that are not
    /// finite or fall outside the range of the given scale.
    pub fn from_raw(raw: f64, scale: ConfidenceScale) -> Option<Self> {
        if !raw.is_finite() {
            return None;
        }
        let percent = match scale {
            ConfidenceScale::Percent => raw,
            ConfidenceScale::Fraction => raw * 100.0,
        };
        // Adding +0.0 turns -0.0 into 0.0.
        (0.0..=100.0).contains(&percent).then_some(Self(percent + 0.0))
    }

    pub fn percent(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Confidence {
    /// One decimal, trailing `.0` dropped: `91%`, `98.2%`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = format!("{:.1}", self.0);
        let compact = text.strip_suffix(".0").unwrap_or(&text);
        write!(f, "{compact}%")
    }
}

/// Coarse reading of a predicted label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Health {
    Healthy,
    Diseased,
}

/// A successful answer from the prediction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: Confidence,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// `Healthy` when the label mentions "healthy" in any casing.
    pub fn health(&self) -> Health {
        if self.label.to_lowercase().contains("healthy") {
            Health::Healthy
        } else {
            Health::Diseased
        }
    }
}

/// Opaque handle to a transient preview owned by a [`crate::PreviewStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreviewId(u64);

impl PreviewId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// A file offered to the controller by the picker or a drop.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    file_name: String,
    media_type: String,
    bytes: Arc<[u8]>,
}

impl FileCandidate {
    /// Builds a candidate whose media type is guessed from the name and
    /// leading bytes.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::with_reported_type(file_name, None, bytes)
    }

    /// Builds a candidate, preferring a media type reported by the source
    /// (e.g. a drag-and-drop payload) when it is non-empty.
    pub fn with_reported_type(
        file_name: impl Into<String>,
        reported: Option<&str>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let file_name = file_name.into();
        let bytes = bytes.into();
        let media_type = media::resolve_media_type(&file_name, reported, &bytes);
        Self {
            file_name,
            media_type,
            bytes,
        }
    }

    /// Reads a file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_image(&self) -> bool {
        media::is_image_media_type(&self.media_type)
    }

    pub(crate) fn into_selected(self, preview: PreviewId) -> SelectedImage {
        SelectedImage {
            upload: ImageUpload {
                file_name: self.file_name,
                media_type: self.media_type,
                bytes: self.bytes,
            },
            preview,
        }
    }
}

/// What is sent to the prediction service: one multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

/// The image currently held by the controller.
#[derive(Debug, Clone)]
pub struct SelectedImage {
    upload: ImageUpload,
    preview: PreviewId,
}

impl SelectedImage {
    pub fn file_name(&self) -> &str {
        &self.upload.file_name
    }

    pub fn media_type(&self) -> &str {
        &self.upload.media_type
    }

    pub fn len(&self) -> usize {
        self.upload.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upload.bytes.is_empty()
    }

    pub fn preview(&self) -> PreviewId {
        self.preview
    }

    pub fn upload(&self) -> &ImageUpload {
        &self.upload
    }
}
