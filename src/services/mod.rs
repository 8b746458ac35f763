//! Service layer: the repair pipeline proper.

pub mod confidence;
pub mod context_builder;
pub mod coordinator;
pub mod failure_analyzer;
pub mod fix_applicator;
pub mod fix_engine;
pub mod fix_generator;
pub mod fix_tester;
pub mod fix_validator;
pub mod history_service;
pub mod pipeline;
pub mod rate_limiter;
pub mod snapshot_store;

pub use confidence::{ConfidenceScorer, RetryDecision};
pub use context_builder::ContextBuilder;
pub use coordinator::{CoordinationResult, MultiFileCoordinator};
pub use failure_analyzer::FailureAnalyzer;
pub use fix_applicator::{ApplyOptions, FixApplicator};
pub use fix_engine::FixEngine;
pub use fix_generator::FixGenerator;
pub use fix_tester::FixTester;
pub use fix_validator::FixValidator;
pub use history_service::FixHistoryService;
pub use pipeline::RepairPipeline;
pub use rate_limiter::{FixedWindowRateLimiter, RateLimitDecision};
pub use snapshot_store::SnapshotStore;
