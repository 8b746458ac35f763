//! HTTP adapter for the external AI code-fixing service.

pub mod client;
pub mod retry;
pub mod types;

pub use client::HttpFixService;
pub use retry::RetryPolicy;
