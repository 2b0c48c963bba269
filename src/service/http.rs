//! Reqwest-based client for the execution service HTTP API.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Response,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::{
    ErrorBody, ExecuteResponse, ExecutionRequest, ExecutionService, HealthResponse,
    LanguagesResponse, ServiceError, ServiceLanguage,
};
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct HttpExecutionService {
    http: Client,
    base_url: String,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl HttpExecutionService {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.api_url(), cfg.request_timeout(), cfg.health_timeout())
    }

    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        health_timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = Client::builder().build()?;
        Ok(Self { http, base_url, request_timeout, health_timeout })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }
}

/// Decode a 2xx body, or turn an error status into `ServiceError::Status`.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ServiceError> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.detail)
            .map(|d| match d {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            });
        return Err(ServiceError::Status { status, detail });
    }

    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ServiceError::Malformed(e.to_string()))
}

#[async_trait]
impl ExecutionService for HttpExecutionService {
    async fn health(&self) -> Result<HealthResponse, ServiceError> {
        let url = self.url("/health");
        debug!(%url, "Probing execution service");
        let resp = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .timeout(self.health_timeout)
            .send()
            .await?;
        decode(resp).await
    }

    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecuteResponse, ServiceError> {
        let url = self.url("/api/v1/execute");
        info!(
            language = request.language.wire_id(),
            bytes = request.source.len(),
            "Submitting execution request"
        );
        let resp = self
            .http
            .post(&url)
            .headers(Self::json_headers())
            .json(request)
            .timeout(self.request_timeout)
            .send()
            .await
            .inspect_err(|e| warn!(error = %e, "Execution request failed"))?;
        decode(resp).await
    }

    async fn languages(&self) -> Result<Vec<ServiceLanguage>, ServiceError> {
        let url = self.url("/api/v1/languages");
        let resp = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .timeout(self.health_timeout)
            .send()
            .await?;
        let body: LanguagesResponse = decode(resp).await?;
        Ok(body.languages)
    }
}
