//! In-memory fix-history repository for tests and ephemeral runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ErrorCategory, FixHistoryEntry};
use crate::domain::ports::FixHistoryRepository;

#[derive(Default)]
pub struct InMemoryFixHistoryRepository {
    entries: Mutex<Vec<FixHistoryEntry>>,
}

impl InMemoryFixHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FixHistoryRepository for InMemoryFixHistoryRepository {
    async fn append(&self, entry: &FixHistoryEntry) -> DomainResult<()> {
        self.entries.lock().await.push(entry.clone());
        Ok(())
    }

    async fn for_project(&self, project_id: &str) -> DomainResult<Vec<FixHistoryEntry>> {
        let entries = self.entries.lock().await;
        let mut matching: Vec<_> = entries
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect();
        matching.reverse();
        Ok(matching)
    }

    async fn failed_for_project(&self, project_id: &str) -> DomainResult<Vec<FixHistoryEntry>> {
        Ok(self
            .for_project(project_id)
            .await?
            .into_iter()
            .filter(|e| !e.success)
            .collect())
    }

    async fn success_rate_by_category(
        &self,
        project_id: &str,
    ) -> DomainResult<HashMap<ErrorCategory, f64>> {
        let entries = self.entries.lock().await;
        let mut tallies: HashMap<ErrorCategory, (u32, u32)> = HashMap::new();
        for entry in entries.iter().filter(|e| e.project_id == project_id) {
            let tally = tallies.entry(entry.error_category).or_default();
            tally.1 += 1;
            if entry.success {
                tally.0 += 1;
            }
        }
        Ok(tallies
            .into_iter()
            .map(|(category, (successes, total))| {
                (category, f64::from(successes) / f64::from(total))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::FixSuggestion;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(category: ErrorCategory, success: bool) -> FixHistoryEntry {
        FixHistoryEntry {
            id: Uuid::new_v4(),
            project_id: "p1".to_string(),
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
    async fn rates_reflect_appended_entries() {
        let repository = InMemoryFixHistoryRepository::new();
        repository.append(&entry(ErrorCategory::Type, true)).await.unwrap();
        repository.append(&entry(ErrorCategory::Type, false)).await.unwrap();

        let rates = repository.success_rate_by_category("p1").await.unwrap();
        assert!((rates[&ErrorCategory::Type] - 0.5).abs() < f64::EPSILON);

        assert_eq!(repository.for_project("p1").await.unwrap().len(), 2);
        assert_eq!(repository.failed_for_project("p1").await.unwrap().len(), 1);
        assert!(repository.for_project("other").await.unwrap().is_empty());
    }
}
