//! Shared test doubles for pipeline integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mender::domain::errors::DomainResult;
use mender::domain::models::Config;
use mender::domain::ports::{
    FixRequest, FixResponse, FixService, FixServiceError, ProbeReport, RuntimeProbe, SuiteOutcome,
};
use mender::infrastructure::analyzer::HeuristicAnalyzer;
use mender::infrastructure::database::InMemoryFixHistoryRepository;
use mender::infrastructure::store::InMemoryProjectStore;
use mender::services::RepairPipeline;

/// Fix service that replays a fixed script of responses and records every
/// prompt it was sent.
pub struct ScriptedFixService {
    responses: Mutex<VecDeque<FixResponse>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicU32,
}

impl ScriptedFixService {
    pub fn new(responses: Vec<FixResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl FixService for ScriptedFixService {
    async fn request_fix(&self, request: FixRequest) -> Result<FixResponse, FixServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| FixServiceError::ServerError("script exhausted".to_string()))
    }
}

/// Probe whose first `failing_calls` probes report the given console errors,
/// after which the runtime is clean. Never exposes a test suite.
pub struct FlakyProbe {
    failing_calls: u32,
    console_errors: Vec<String>,
    counter: AtomicU32,
}

impl FlakyProbe {
    pub fn clean() -> Self {
        Self::failing_for(0, vec![])
    }

    pub fn failing_for(failing_calls: u32, console_errors: Vec<String>) -> Self {
        Self {
            failing_calls,
            console_errors,
            counter: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl RuntimeProbe for FlakyProbe {
    async fn probe(&self, _project_id: &str) -> DomainResult<ProbeReport> {
        let call = self.counter.fetch_add(1, Ordering::SeqCst);
        if call < self.failing_calls {
            Ok(ProbeReport {
                console_errors: self.console_errors.clone(),
            })
        } else {
            Ok(ProbeReport::default())
        }
    }

    async fn run_test_suite(&self, _project_id: &str) -> DomainResult<Option<SuiteOutcome>> {
        Ok(None)
    }
}

/// Tool-call response proposing a replace fix.
pub fn replace_response(old_code: &str, new_code: &str, confidence: f64) -> FixResponse {
    FixResponse::ToolCall {
        name: "propose_fix".to_string(),
        arguments: serde_json::json!({
            "fix_type": "replace",
            "old_code": old_code,
            "new_code": new_code,
            "explanation": "replace the failing expression",
            "confidence": confidence,
        }),
    }
}

/// Config with no inter-attempt sleeps, suitable for tests.
pub fn test_config(max_attempts: u32, max_requests: u32) -> Config {
    let mut config = Config::default();
    config.engine.max_attempts = max_attempts;
    config.engine.backoff_base_ms = 0;
    config.rate_limit.max_requests = max_requests;
    config
}

/// Assembled pipeline over in-memory collaborators.
pub struct TestHarness {
    pub pipeline: RepairPipeline,
    pub store: Arc<InMemoryProjectStore>,
    pub service: Arc<ScriptedFixService>,
}

pub async fn harness(
    file_content: &str,
    responses: Vec<FixResponse>,
    probe: FlakyProbe,
    config: Config,
) -> TestHarness {
    let store = Arc::new(InMemoryProjectStore::new());
    store.seed("p1", file_content, Default::default()).await;
    let service = Arc::new(ScriptedFixService::new(responses));

    let pipeline = RepairPipeline::new(
        store.clone(),
        service.clone(),
        Arc::new(HeuristicAnalyzer::new()),
        Arc::new(probe),
        Arc::new(InMemoryFixHistoryRepository::new()),
        &config,
    );

    TestHarness {
        pipeline,
        store,
        service,
    }
}
