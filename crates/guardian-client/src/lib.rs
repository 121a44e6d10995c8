//! Typed client for the guardian scan API. Thin by design: every method is
//! one request, one deserialized payload; retry policy belongs to the
//! caller's poll cadence.

use guardian_core::{ConfigEntry, PhaseLog, ScanJob, ScanReport};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const BASE_URL_ENV: &str = "GUARDIAN_API_URL";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server rejected request: {status} {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Response to a scan submission; the id enters the job table on the next
/// list poll.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanAccepted {
    pub scan_id: i64,
    #[serde(default)]
    pub status: String,
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Base URL from `GUARDIAN_API_URL`, falling back to local loopback.
    pub fn from_env() -> ClientResult<Self> {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn check(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Rejected { status, body })
    }

    /// `GET /scans` — the full job table, newest first as the server sends
    /// it.
    pub async fn list_scans(&self) -> ClientResult<Vec<ScanJob>> {
        tracing::debug!(url = %self.url("/scans"), "fetching scan list");
        let response = self.http.get(self.url("/scans")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `GET /scans/{id}/logs` — phase telemetry for one job.
    pub async fn scan_logs(&self, scan_id: i64) -> ClientResult<Vec<PhaseLog>> {
        let url = self.url(&format!("/scans/{scan_id}/logs"));
        tracing::debug!(%url, "fetching scan logs");
        let response = self.http.get(url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `GET /scans/{id}/report` — the full report envelope.
    pub async fn scan_report(&self, scan_id: i64) -> ClientResult<ScanReport> {
        let url = self.url(&format!("/scans/{scan_id}/report"));
        tracing::debug!(%url, "fetching scan report");
        let response = self.http.get(url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `POST /scans/{id}/cancel`.
    pub async fn cancel_scan(&self, scan_id: i64) -> ClientResult<()> {
        let url = self.url(&format!("/scans/{scan_id}/cancel"));
        tracing::info!(%url, "cancelling scan");
        let response = self.http.post(url).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    /// `POST /scan` — submit a new scan run.
    pub async fn start_scan(
        &self,
        repo_url: &str,
        target_url: Option<&str>,
        github_token: Option<&str>,
    ) -> ClientResult<ScanAccepted> {
        let mut query: Vec<(&str, &str)> = vec![("repo_url", repo_url)];
        if let Some(target_url) = target_url {
            query.push(("target_url", target_url));
        }
        if let Some(github_token) = github_token {
            query.push(("github_token", github_token));
        }
        tracing::info!(repo_url, "submitting scan");
        let response = self
            .http
            .post(self.url("/scan"))
            .query(&query)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `GET /config`.
    pub async fn get_config(&self) -> ClientResult<Vec<ConfigEntry>> {
        let response = self.http.get(self.url("/config")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `POST /config?key=&value=&is_secret=`.
    pub async fn set_config(&self, key: &str, value: &str, is_secret: bool) -> ClientResult<()> {
        let is_secret = if is_secret { "true" } else { "false" };
        let response = self
            .http
            .post(self.url("/config"))
            .query(&[("key", key), ("value", value), ("is_secret", is_secret)])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
