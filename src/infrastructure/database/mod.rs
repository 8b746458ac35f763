//! SQLite persistence for the fix-history log.

pub mod connection;
pub mod history_repository;
pub mod memory;

pub use connection::DatabaseConnection;
pub use history_repository::SqliteFixHistoryRepository;
pub use memory::InMemoryFixHistoryRepository;
