//! Domain models for the repair pipeline.

pub mod config;
pub mod context;
pub mod fix;
pub mod history;
pub mod project;
pub mod report;
pub mod validation;

pub use config::{
    Config, DatabaseConfig, EngineConfig, FixServiceConfig, LoggingConfig, PreviewConfig,
    RateLimitConfig, RetryConfig,
};
pub use context::{AppError, AttemptedFix, ErrorContext, RelatedFile};
pub use fix::{AppliedFix, FileOperation, FixSuggestion, FixType, PackageAction};
pub use history::FixHistoryEntry;
pub use project::{ChangeEvent, ProjectMetadata, ProjectState, ProjectUpdate, Snapshot};
pub use report::{
    ApplyOutcome, ApplyPhase, ErrorCategory, FailurePattern, FixAttempt, FixResult, TestCase,
    TestReport,
};
pub use validation::{
    AutoFix, Diagnostic, LintReport, Severity, ValidationCheck, ValidationResult,
};
