use std::time::Duration;

use crate::{ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_PREDICT_TIMEOUT: Duration = Duration::from_millis(5000);
/// Environment variable holding the prediction service base URL.
pub const BASE_URL_ENV: &str = "CHURN_API_URL";

pub const PREDICT_PATH: &str = "/predict";
pub const UPLOAD_PATH: &str = "/upload";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub predict_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            predict_timeout: DEFAULT_PREDICT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = normalize_base_url(&base_url.into())?;
        Ok(Self {
            base_url,
            ..Self::default()
        })
    }

    /// Base URL from `CHURN_API_URL`, or the local default when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Ok(Self::default()),
        }
    }

    pub fn with_predict_timeout(mut self, timeout: Duration) -> Self {
        self.predict_timeout = timeout;
        self
    }

    pub fn predict_url(&self) -> String {
        format!("{}{}", self.base_url, PREDICT_PATH)
    }

    pub fn upload_url(&self) -> String {
        format!("{}{}", self.base_url, UPLOAD_PATH)
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ClientError::Config(format!(
            "base URL must start with http:// or https://, got {raw:?}"
        )));
    }
    Ok(trimmed.to_string())
}
