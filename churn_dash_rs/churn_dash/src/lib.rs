//! Core churn-risk dashboard library: the wire contract with the prediction
//! service, the render models behind the KPI cards, charts and bulk ranking, and
//! a native HTTP client.

use thiserror::Error;

pub mod chart;
pub mod config;
pub mod control;
pub mod layout;
pub mod render;
pub mod severity;
pub mod wire;

#[cfg(feature = "native")]
pub mod client;

pub use chart::{ChartKind, ChartRenderer, ChartSpec, ChartSurface};
pub use config::ClientConfig;
pub use control::{BusyControl, BusyGuard, RequestSequencer, Ticket};
pub use layout::{Region, RegionRule, RuleEffect, ViewMode};
pub use render::{ranking_csv, BulkTable, BulkTableRow, KpiView};
pub use severity::{RiskLevel, Severity};
pub use wire::{BulkResultRow, FormInputs, PredictionRequest, PredictionResponse, UploadFile};

#[cfg(feature = "native")]
pub use client::PredictionClient;

/// Shown when a single prediction fails for any reason.
pub const PREDICT_FAILURE_ALERT: &str =
    "Error connecting to prediction server. Please ensure the backend is running and reachable.";
/// Shown when a bulk upload fails for any reason other than a missing file.
pub const UPLOAD_FAILURE_ALERT: &str = "Error processing file. Ensure it is a valid CSV.";
/// Shown when the upload is triggered without a file.
pub const NO_FILE_PROMPT: &str = "Please select a CSV file first.";

pub const PREDICT_BUSY_LABEL: &str = "Analyzing...";
pub const UPLOAD_BUSY_LABEL: &str = "Processing...";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("request timed out after {0} ms")]
    Timeout(u64),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("no file selected")]
    NoFileSelected,
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Static user-facing text for a failed call. Every failure of one operation
    /// maps to the same message; a missing file gets its own prompt.
    pub fn user_message(&self, op: Operation) -> &'static str {
        match (self, op) {
            (ClientError::NoFileSelected, _) => NO_FILE_PROMPT,
            (_, Operation::Predict) => PREDICT_FAILURE_ALERT,
            (_, Operation::Upload) => UPLOAD_FAILURE_ALERT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Predict,
    Upload,
}

pub type Result<T> = std::result::Result<T, ClientError>;
