//! Port trait for the headless runtime probe.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;

/// Console and runtime errors captured while executing the project preview.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeReport {
    pub console_errors: Vec<String>,
}

impl ProbeReport {
    pub fn clean(&self) -> bool {
        self.console_errors.is_empty()
    }
}

/// Outcome of running the project's own test suite, when it has one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteOutcome {
    pub passed: bool,
    pub summary: String,
}

/// Headless execution of the current project state.
///
/// The probe navigates to a live preview, captures console/runtime errors,
/// and can optionally run the project's existing test suite for regression
/// checking.
#[async_trait]
pub trait RuntimeProbe: Send + Sync {
    /// Execute the preview and capture runtime errors.
    async fn probe(&self, project_id: &str) -> DomainResult<ProbeReport>;

    /// Run the project's test suite. `Ok(None)` means the project has none.
    async fn run_test_suite(&self, project_id: &str) -> DomainResult<Option<SuiteOutcome>>;
}
