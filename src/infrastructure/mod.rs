//! Infrastructure adapters behind the domain ports.

pub mod analyzer;
pub mod config;
pub mod database;
pub mod fixer;
pub mod probe;
pub mod store;
