use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure surfaced by the API gateway.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("request failed with status {status}")]
    Status {
        status: u16,
        problem: Option<ProblemDetails>,
    },
    /// No response was received (connection refused, DNS, timeout).
    #[error("no response from server: {0}")]
    Unreachable(String),
    /// Rejected locally because no session is stored while authentication is enabled.
    #[error("Unauthorized. Please log in again.")]
    NotAuthenticated,
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("{0}")]
    Local(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::NotAuthenticated) || self.status() == Some(401)
    }
}

/// RFC 7807 error body returned by the task service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Map<String, Value>>,
}

impl ProblemDetails {
    /// Parses a response body; empty or non-JSON bodies yield `None`.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        serde_json::from_slice(body).ok()
    }

    /// Every validation message in body order, across all fields.
    pub fn validation_messages(&self) -> Vec<String> {
        let Some(errors) = &self.errors else {
            return Vec::new();
        };

        let mut messages = Vec::new();
        for value in errors.values() {
            match value {
                Value::String(message) => messages.push(message.clone()),
                Value::Array(items) => messages.extend(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|message| message.to_string()),
                ),
                _ => {}
            }
        }
        messages
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode storage contents: {0}")]
    Encode(#[from] serde_json::Error),
}
