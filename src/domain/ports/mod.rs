//! Port trait definitions (hexagonal architecture).
//!
//! These async trait interfaces are the seams between the repair pipeline and
//! its external collaborators:
//! - [`ProjectStore`]: opaque key-value project state store
//! - [`FixService`]: external AI code-fixing service
//! - [`StaticAnalyzer`]: linter / type checker
//! - [`RuntimeProbe`]: headless browser runtime check
//! - [`FixHistoryRepository`]: durable attempt log
//!
//! Services depend on these traits, never on concrete adapters, so every
//! collaborator can be swapped for a scripted implementation in tests.

pub mod fix_service;
pub mod history_repository;
pub mod project_store;
pub mod runtime_probe;
pub mod static_analyzer;

pub use fix_service::{FixRequest, FixResponse, FixService, FixServiceError, ToolSchema};
pub use history_repository::FixHistoryRepository;
pub use project_store::ProjectStore;
pub use runtime_probe::{ProbeReport, RuntimeProbe, SuiteOutcome};
pub use static_analyzer::{is_typed_file, StaticAnalyzer};
