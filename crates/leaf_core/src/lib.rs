//! Core of the leaf disease client: selection state, uploads and the
//! prediction service client. Knows nothing about the GUI toolkit.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod media;
pub mod runner;
pub mod types;

pub use client::{HttpPredictionClient, PredictionClient};
pub use config::ClientConfig;
pub use controller::{
    Controller, Notice, NoticeKind, PredictionTicket, PreviewStore, ResultCard, UiState, ViewModel,
};
pub use error::{ConfigError, PredictError, PreviewError, SelectError, SubmitError};
pub use runner::PendingPrediction;
pub use types::{
    Confidence, ConfidenceScale, FileCandidate, Health, ImageUpload, Prediction, PreviewId,
    SelectedImage,
};
