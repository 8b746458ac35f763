//! Post-application testing.
//!
//! Four probes run unconditionally after a fix is applied; there is no
//! short-circuit, so a report always shows the full picture. A probe that
//! errors internally becomes a failed test case rather than propagating.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::domain::errors::DomainResult;
use crate::domain::models::{AppliedFix, TestCase, TestReport};
use crate::domain::ports::{ProjectStore, RuntimeProbe, StaticAnalyzer};

/// Runs build, runtime, original-error, and regression probes against the
/// post-application project state.
pub struct FixTester {
    store: Arc<dyn ProjectStore>,
    analyzer: Arc<dyn StaticAnalyzer>,
    probe: Arc<dyn RuntimeProbe>,
}

impl FixTester {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        analyzer: Arc<dyn StaticAnalyzer>,
        probe: Arc<dyn RuntimeProbe>,
    ) -> Self {
        Self {
            store,
            analyzer,
            probe,
        }
    }

    /// Test an applied fix. `original_error` is the failure signature the
    /// session set out to resolve.
    pub async fn test_fix(
        &self,
        applied: &AppliedFix,
        project_id: &str,
        original_error: &str,
    ) -> TestReport {
        debug!(project_id, fix_id = %applied.id, "running post-application tests");

        let cases = vec![
            self.timed("Build Check", self.build_check(project_id)).await,
            self.timed("Runtime Check", self.runtime_check(project_id)).await,
            self.timed(
                "Original Error Check",
                self.original_error_check(project_id, original_error),
            )
            .await,
            self.timed("Regression Check", self.regression_check(project_id))
                .await,
        ];

        let report = TestReport::from_cases(cases);
        info!(
            project_id,
            success = report.success,
            "post-application tests finished"
        );
        report
    }

    /// Time a probe and convert an internal error into a failed case.
    async fn timed(
        &self,
        name: &str,
        probe: impl std::future::Future<Output = DomainResult<(bool, Option<String>)>>,
    ) -> TestCase {
        let start = Instant::now();
        let (passed, message) = match probe.await {
            Ok(outcome) => outcome,
            Err(err) => (false, Some(format!("probe error: {err}"))),
        };
        TestCase {
            name: name.to_string(),
            passed,
            duration: start.elapsed(),
            message,
        }
    }

    /// Current state must still pass static analysis.
    async fn build_check(&self, project_id: &str) -> DomainResult<(bool, Option<String>)> {
        let state = self.store.get(project_id).await?;

        let mut errors = Vec::new();
        let report = self.analyzer.lint(&state.file_content, "main", false);
        errors.extend(report.errors);
        for (path, content) in &state.files {
            let report = self.analyzer.lint(content, path, false);
            errors.extend(report.errors);
        }

        if errors.is_empty() {
            Ok((true, None))
        } else {
            let summary = errors
                .iter()
                .take(3)
                .map(|d| format!("{}:{} {}", d.file, d.line, d.message))
                .collect::<Vec<_>>()
                .join("; ");
            Ok((false, Some(format!("build errors: {summary}"))))
        }
    }

    /// Headless execution must be free of console/runtime errors.
    async fn runtime_check(&self, project_id: &str) -> DomainResult<(bool, Option<String>)> {
        let report = self.probe.probe(project_id).await?;
        if report.clean() {
            Ok((true, None))
        } else {
            Ok((
                false,
                Some(format!(
                    "console error: {}",
                    report.console_errors.join("; ")
                )),
            ))
        }
    }

    /// The original failure signature must no longer reproduce.
    async fn original_error_check(
        &self,
        project_id: &str,
        original_error: &str,
    ) -> DomainResult<(bool, Option<String>)> {
        let signature = original_error.lines().next().unwrap_or(original_error);
        let report = self.probe.probe(project_id).await?;
        let reproduced = report
            .console_errors
            .iter()
            .any(|e| e.contains(signature) || signature.contains(e.as_str()));
        if reproduced {
            Ok((
                false,
                Some(format!("original error still reproduces: {signature}")),
            ))
        } else {
            Ok((true, None))
        }
    }

    /// The project's own test suite, when it has one, must still pass.
    async fn regression_check(&self, project_id: &str) -> DomainResult<(bool, Option<String>)> {
        match self.probe.run_test_suite(project_id).await? {
            None => Ok((true, Some("no test suite configured".to_string()))),
            Some(outcome) if outcome.passed => Ok((true, Some(outcome.summary))),
            Some(outcome) => Ok((false, Some(format!("regression: {}", outcome.summary)))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::models::FixType;
    use crate::domain::ports::{ProbeReport, SuiteOutcome};
    use crate::infrastructure::analyzer::HeuristicAnalyzer;
    use crate::infrastructure::store::InMemoryProjectStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    struct FixedProbe {
        console_errors: Vec<String>,
        suite: Option<SuiteOutcome>,
        fail_probe: bool,
    }

    #[async_trait]
    impl RuntimeProbe for FixedProbe {
        async fn probe(&self, _project_id: &str) -> DomainResult<ProbeReport> {
            if self.fail_probe {
                return Err(DomainError::ProbeError("browser crashed".to_string()));
            }
            Ok(ProbeReport {
                console_errors: self.console_errors.clone(),
            })
        }

        async fn run_test_suite(&self, _project_id: &str) -> DomainResult<Option<SuiteOutcome>> {
            Ok(self.suite.clone())
        }
    }

    fn applied() -> AppliedFix {
        AppliedFix {
            id: Uuid::new_v4(),
            fix_type: FixType::Replace,
            operations: vec![],
            applied_at: Utc::now(),
            original_error: "ReferenceError: foo is not defined".to_string(),
        }
    }

    async fn tester_with(probe: FixedProbe) -> (FixTester, String) {
        let store = Arc::new(InMemoryProjectStore::new());
        let project_id = "p1".to_string();
        store
            .seed(&project_id, "const x = 1;\n", Default::default())
            .await;
        let tester = FixTester::new(store, Arc::new(HeuristicAnalyzer::new()), Arc::new(probe));
        (tester, project_id)
    }

    #[tokio::test]
    async fn all_clean_probes_pass() {
        let (tester, project_id) = tester_with(FixedProbe {
            console_errors: vec![],
            suite: None,
            fail_probe: false,
        })
        .await;

        let report = tester
            .test_fix(&applied(), &project_id, "ReferenceError: foo is not defined")
            .await;
        assert!(report.success);
        assert_eq!(report.cases.len(), 4);
    }

    #[tokio::test]
    async fn console_error_fails_runtime_and_all_probes_still_run() {
        let (tester, project_id) = tester_with(FixedProbe {
            console_errors: vec!["TypeError: x is undefined".to_string()],
            suite: None,
            fail_probe: false,
        })
        .await;

        let report = tester.test_fix(&applied(), &project_id, "some other error").await;
        assert!(!report.success);
        assert_eq!(report.cases.len(), 4);
        let runtime = report.cases.iter().find(|c| c.name == "Runtime Check").unwrap();
        assert!(!runtime.passed);
        // Original error is different from the console error, so that probe passes.
        let original = report
            .cases
            .iter()
            .find(|c| c.name == "Original Error Check")
            .unwrap();
        assert!(original.passed);
    }

    #[tokio::test]
    async fn reproduced_original_error_fails_its_probe() {
        let (tester, project_id) = tester_with(FixedProbe {
            console_errors: vec!["ReferenceError: foo is not defined".to_string()],
            suite: None,
            fail_probe: false,
        })
        .await;

        let report = tester
            .test_fix(&applied(), &project_id, "ReferenceError: foo is not defined")
            .await;
        let original = report
            .cases
            .iter()
            .find(|c| c.name == "Original Error Check")
            .unwrap();
        assert!(!original.passed);
    }

    #[tokio::test]
    async fn probe_crash_becomes_failed_case_not_panic() {
        let (tester, project_id) = tester_with(FixedProbe {
            console_errors: vec![],
            suite: None,
            fail_probe: true,
        })
        .await;

        let report = tester.test_fix(&applied(), &project_id, "err").await;
        assert!(!report.success);
        let runtime = report.cases.iter().find(|c| c.name == "Runtime Check").unwrap();
        assert!(runtime.message.as_deref().unwrap().contains("probe error"));
    }

    #[tokio::test]
    async fn failing_suite_fails_regression_check() {
        let (tester, project_id) = tester_with(FixedProbe {
            console_errors: vec![],
            suite: Some(SuiteOutcome {
                passed: false,
                summary: "2 of 10 tests failed".to_string(),
            }),
            fail_probe: false,
        })
        .await;

        let report = tester.test_fix(&applied(), &project_id, "err").await;
        let regression = report
            .cases
            .iter()
            .find(|c| c.name == "Regression Check")
            .unwrap();
        assert!(!regression.passed);
    }
}
