//! Runtime probe adapters.
//!
//! `HttpRuntimeProbe` talks to a preview host that renders the project
//! headlessly and reports captured console errors. `NullRuntimeProbe` is the
//! no-op stand-in for environments without a preview host.

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::PreviewConfig;
use crate::domain::ports::{ProbeReport, RuntimeProbe, SuiteOutcome};

/// Probe that reports a clean runtime and no test suite. Used when no
/// preview host is configured.
#[derive(Debug, Default)]
pub struct NullRuntimeProbe;

#[async_trait]
impl RuntimeProbe for NullRuntimeProbe {
    async fn probe(&self, _project_id: &str) -> DomainResult<ProbeReport> {
        Ok(ProbeReport::default())
    }

    async fn run_test_suite(&self, _project_id: &str) -> DomainResult<Option<SuiteOutcome>> {
        Ok(None)
    }
}

#[derive(Deserialize)]
struct ConsoleErrorsBody {
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Deserialize)]
struct SuiteBody {
    passed: bool,
    #[serde(default)]
    summary: String,
}

/// HTTP probe against a live preview host.
pub struct HttpRuntimeProbe {
    http_client: ReqwestClient,
    base_url: String,
}

impl HttpRuntimeProbe {
    pub fn new(config: &PreviewConfig) -> DomainResult<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::ProbeError(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RuntimeProbe for HttpRuntimeProbe {
    async fn probe(&self, project_id: &str) -> DomainResult<ProbeReport> {
        let url = format!("{}/{}/console-errors", self.base_url, project_id);
        debug!(%url, "probing preview runtime");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| DomainError::ProbeError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DomainError::ProbeError(format!(
                "preview host returned {}",
                response.status()
            )));
        }

        let body: ConsoleErrorsBody = response
            .json()
            .await
            .map_err(|e| DomainError::ProbeError(e.to_string()))?;
        Ok(ProbeReport {
            console_errors: body.errors,
        })
    }

    async fn run_test_suite(&self, project_id: &str) -> DomainResult<Option<SuiteOutcome>> {
        let url = format!("{}/{}/tests", self.base_url, project_id);
        debug!(%url, "requesting test suite run");

        let response = self
            .http_client
            .post(&url)
            .send()
            .await
            .map_err(|e| DomainError::ProbeError(e.to_string()))?;

        // 404 means the project has no test suite.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(DomainError::ProbeError(format!(
                "preview host returned {}",
                response.status()
            )));
        }

        let body: SuiteBody = response
            .json()
            .await
            .map_err(|e| DomainError::ProbeError(e.to_string()))?;
        Ok(Some(SuiteOutcome {
            passed: body.passed,
            summary: body.summary,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_probe_is_clean_and_suiteless() {
        let probe = NullRuntimeProbe;
        assert!(probe.probe("p1").await.unwrap().clean());
        assert!(probe.run_test_suite("p1").await.unwrap().is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let probe = HttpRuntimeProbe::new(&PreviewConfig {
            base_url: "http://localhost:3000/preview/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(probe.base_url, "http://localhost:3000/preview");
    }
}
