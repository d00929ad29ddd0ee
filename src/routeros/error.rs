use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("RouterOS transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("RouterOS sent an undecodable body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("RouterOS rejected credentials ({0})")]
    Auth(StatusCode),
    #[error("RouterOS returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },
}

impl RouterError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(e) => e.status(),
            Self::Decode(_) => None,
            Self::Auth(s) => Some(*s),
            Self::Status { status, .. } => Some(*status),
        }
    }
}

/// Error body RouterOS sends alongside a failed request.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub error: serde_json::Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ApiError {
    pub fn describe(&self) -> String {
        match (&self.message, &self.detail) {
            (Some(m), Some(d)) => format!("{m}: {d}"),
            (Some(m), None) => m.clone(),
            (None, Some(d)) => d.clone(),
            (None, None) => format!("error {}", self.error),
        }
    }
}
