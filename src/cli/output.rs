//! Terminal output helpers for CLI commands.

use std::time::Duration;

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::models::FixHistoryEntry;

const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Spinner for indeterminate operations (a running repair session).
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .expect("Invalid spinner template")
            .tick_chars(SPINNER_CHARS),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Format fix-history entries as a table, newest first.
pub fn format_history_table(entries: &[FixHistoryEntry]) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("When").add_attribute(Attribute::Bold),
        Cell::new("Category").add_attribute(Attribute::Bold),
        Cell::new("Result").add_attribute(Attribute::Bold),
        Cell::new("Attempt").add_attribute(Attribute::Bold),
        Cell::new("Error").add_attribute(Attribute::Bold),
        Cell::new("Fix").add_attribute(Attribute::Bold),
    ]);

    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(entry.error_category.as_str()),
            Cell::new(if entry.success { "ok" } else { "failed" }),
            Cell::new(entry.attempts.to_string()),
            Cell::new(truncate(&entry.error_message, 40)),
            Cell::new(truncate(&entry.fix.explanation, 50)),
        ]);
    }

    table.to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ErrorCategory, FixSuggestion};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn truncate_keeps_short_text_intact() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long error message", 10), "a very ...");
    }

    #[test]
    fn history_table_contains_entry_fields() {
        let entry = FixHistoryEntry {
            id: Uuid::new_v4(),
            project_id: "p1".to_string(),
            error_id: Uuid::new_v4(),
            error_message: "TypeError: x is not a function".to_string(),
            error_category: ErrorCategory::Type,
            fix: FixSuggestion::replace("", "a", "b", "swap the call", 0.8),
            applied_fix: None,
            success: true,
            attempts: 2,
            timestamp: Utc::now(),
        };

        let rendered = format_history_table(&[entry]);
        assert!(rendered.contains("type_error"));
        assert!(rendered.contains("ok"));
        assert!(rendered.contains("swap the call"));
    }
}
