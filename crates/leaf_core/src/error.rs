use thiserror::Error;

/// Shown for every failed prediction. Details go to the log.
pub const FAILURE_NOTICE: &str =
    "Something went wrong while contacting the prediction service. Please try again.";

/// Shown when submitting without an image.
pub const VALIDATION_NOTICE: &str = "Please choose an image first.";

/// A preview store could not build a preview for the file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PreviewError(pub String);

/// Why a picked or dropped file was not taken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("{file_name} is not an image ({media_type})")]
    UnsupportedMedia {
        file_name: String,
        media_type: String,
    },

    #[error("drop contained no files")]
    NothingDropped,

    #[error("preview unavailable: {0}")]
    Preview(#[from] PreviewError),
}

/// Why `submit` did not start a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("no image selected")]
    Validation,

    #[error("a prediction is already in progress")]
    Busy,
}

/// Failure of a single prediction round trip.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    /// Connection failure, timeout or a worker that never answered.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("prediction service answered HTTP {status}")]
    Status { status: u16, body: String },

    /// 2xx, but the body is not the expected JSON shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl PredictError {
    pub fn user_message(&self) -> &'static str {
        FAILURE_NOTICE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("LEAF_API_URL is not set")]
    MissingEndpoint,

    #[error("invalid endpoint `{value}`: {reason}")]
    InvalidEndpoint { value: String, reason: String },

    #[error("invalid timeout `{0}`: expected a positive number of seconds")]
    InvalidTimeout(String),

    #[error("invalid confidence scale `{0}`: expected `percent` or `fraction`")]
    InvalidScale(String),
}
