//! Execution service contract: wire types, error taxonomy and the client trait.
//!
//! The service itself is remote and opaque. `HttpExecutionService` talks to
//! it over HTTP; tests substitute their own `ExecutionService`.

mod http;

pub use http::HttpExecutionService;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::language::Language;

/// Shown when nothing better than "it failed" is known.
pub const GENERIC_FAILURE: &str =
    "Failed to execute code. Please check if the backend server is running.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionRequest {
    pub language: Language,
    #[serde(rename = "code")]
    pub source: String,
}

impl ExecutionRequest {
    pub fn new(language: Language, source: impl Into<String>) -> Self {
        Self { language, source: source.into() }
    }
}

/// Body of a 2xx reply from the execute endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    /// Seconds, as measured by the service.
    #[serde(default)]
    pub execution_time: Option<f64>,
    #[serde(default)]
    pub stderr: Option<String>,
}

impl ExecuteResponse {
    /// The error text, if the service reported one. Empty strings count as absent.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub docker_available: Option<bool>,
    #[serde(default)]
    pub supported_languages: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceLanguage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LanguagesResponse {
    pub languages: Vec<ServiceLanguage>,
}

/// FastAPI-style error body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service returned {status}")]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },
    #[error("request timed out")]
    Timeout,
    #[error("{0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ServiceError {
    /// Best message for the user: server detail, then transport text, then a generic hint.
    pub fn diagnostic(&self) -> String {
        let candidate = match self {
            ServiceError::Status { detail: Some(d), .. } if !d.trim().is_empty() => d.clone(),
            other => other.to_string(),
        };
        if candidate.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            candidate
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout
        } else if e.is_decode() {
            ServiceError::Malformed(e.to_string())
        } else {
            ServiceError::Transport(e.to_string())
        }
    }
}

/// Client side of the remote execution service.
#[async_trait]
pub trait ExecutionService: Send + Sync {
    async fn health(&self) -> Result<HealthResponse, ServiceError>;

    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecuteResponse, ServiceError>;

    async fn languages(&self) -> Result<Vec<ServiceLanguage>, ServiceError>;
}
