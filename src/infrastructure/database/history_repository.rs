//! SQLite implementation of the fix-history repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ErrorCategory, FixHistoryEntry};
use crate::domain::ports::FixHistoryRepository;

/// Fix-history repository backed by the `fix_history` table.
pub struct SqliteFixHistoryRepository {
    pool: SqlitePool,
}

impl SqliteFixHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FixHistoryRow {
    id: String,
    project_id: String,
    error_id: String,
    error_message: String,
    error_category: String,
    fix: String,
    applied_fix: Option<String>,
    success: i64,
    attempts: i64,
    timestamp: String,
}

impl TryFrom<FixHistoryRow> for FixHistoryEntry {
    type Error = DomainError;

    fn try_from(row: FixHistoryRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| DomainError::DatabaseError(format!("invalid entry id: {e}")))?;
        let error_id = Uuid::parse_str(&row.error_id)
            .map_err(|e| DomainError::DatabaseError(format!("invalid error id: {e}")))?;
        let error_category = ErrorCategory::from_str(&row.error_category).ok_or_else(|| {
            DomainError::DatabaseError(format!("unknown error category: {}", row.error_category))
        })?;
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map_err(|e| DomainError::DatabaseError(format!("invalid timestamp: {e}")))?
            .with_timezone(&Utc);

        Ok(Self {
            id,
            project_id: row.project_id,
            error_id,
            error_message: row.error_message,
            error_category,
            fix: serde_json::from_str(&row.fix)?,
            applied_fix: row
                .applied_fix
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            success: row.success != 0,
            attempts: row.attempts as u32,
            timestamp,
        })
    }
}

#[async_trait]
impl FixHistoryRepository for SqliteFixHistoryRepository {
    async fn append(&self, entry: &FixHistoryEntry) -> DomainResult<()> {
        let applied_fix = entry
            .applied_fix
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r"INSERT INTO fix_history
              (id, project_id, error_id, error_message, error_category,
               fix, applied_fix, success, attempts, timestamp)
              VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.id.to_string())
        .bind(&entry.project_id)
        .bind(entry.error_id.to_string())
        .bind(&entry.error_message)
        .bind(entry.error_category.as_str())
        .bind(serde_json::to_string(&entry.fix)?)
        .bind(applied_fix)
        .bind(i64::from(entry.success))
        .bind(i64::from(entry.attempts))
        .bind(entry.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn for_project(&self, project_id: &str) -> DomainResult<Vec<FixHistoryEntry>> {
        let rows: Vec<FixHistoryRow> = sqlx::query_as(
            "SELECT * FROM fix_history WHERE project_id = ? ORDER BY timestamp DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(FixHistoryEntry::try_from).collect()
    }

    async fn failed_for_project(&self, project_id: &str) -> DomainResult<Vec<FixHistoryEntry>> {
        let rows: Vec<FixHistoryRow> = sqlx::query_as(
            "SELECT * FROM fix_history WHERE project_id = ? AND success = 0
             ORDER BY timestamp DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(FixHistoryEntry::try_from).collect()
    }

    async fn success_rate_by_category(
        &self,
        project_id: &str,
    ) -> DomainResult<HashMap<ErrorCategory, f64>> {
        let rows: Vec<(String, f64)> = sqlx::query_as(
            "SELECT error_category, AVG(success) FROM fix_history
             WHERE project_id = ? GROUP BY error_category",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        let mut rates = HashMap::new();
        for (category, rate) in rows {
            if let Some(category) = ErrorCategory::from_str(&category) {
                rates.insert(category, rate);
            }
        }
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::FixSuggestion;
    use crate::infrastructure::database::connection::DatabaseConnection;

    async fn repository() -> SqliteFixHistoryRepository {
        let db = DatabaseConnection::new("sqlite::memory:", 1)
            .await
            .expect("failed to open database");
        db.migrate().await.expect("failed to run migrations");
        SqliteFixHistoryRepository::new(db.pool().clone())
    }

    fn entry(project_id: &str, category: ErrorCategory, success: bool) -> FixHistoryEntry {
        FixHistoryEntry {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            error_id: Uuid::new_v4(),
            error_message: "boom".to_string(),
            error_category: category,
            fix: FixSuggestion::replace("", "a", "b", "swap", 0.8),
            applied_fix: None,
            success,
            attempts: 1,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn append_then_read_round_trips() {
        let repository = repository().await;
        let original = entry("p1", ErrorCategory::Syntax, true);
        repository.append(&original).await.unwrap();

        let entries = repository.for_project("p1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, original.id);
        assert_eq!(entries[0].error_category, ErrorCategory::Syntax);
        assert_eq!(entries[0].fix.new_code, "b");
        assert!(entries[0].success);
    }

    #[tokio::test]
    async fn failed_filter_excludes_successes() {
        let repository = repository().await;
        repository
            .append(&entry("p1", ErrorCategory::Type, true))
            .await
            .unwrap();
        repository
            .append(&entry("p1", ErrorCategory::Type, false))
            .await
            .unwrap();

        let failed = repository.failed_for_project("p1").await.unwrap();
        assert_eq!(failed.len(), 1);
        assert!(!failed[0].success);
    }

    #[tokio::test]
    async fn success_rate_is_averaged_per_category() {
        let repository = repository().await;
        repository
            .append(&entry("p1", ErrorCategory::Runtime, true))
            .await
            .unwrap();
        repository
            .append(&entry("p1", ErrorCategory::Runtime, false))
            .await
            .unwrap();
        repository
            .append(&entry("p1", ErrorCategory::Syntax, true))
            .await
            .unwrap();
        // Another project's entries must not leak in.
        repository
            .append(&entry("p2", ErrorCategory::Runtime, false))
            .await
            .unwrap();

        let rates = repository.success_rate_by_category("p1").await.unwrap();
        assert!((rates[&ErrorCategory::Runtime] - 0.5).abs() < f64::EPSILON);
        assert!((rates[&ErrorCategory::Syntax] - 1.0).abs() < f64::EPSILON);
        assert!(!rates.contains_key(&ErrorCategory::Unknown));
    }
}
