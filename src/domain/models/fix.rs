//! Fix domain models.
//!
//! A [`FixSuggestion`] is the canonical repair unit produced by the generator.
//! Application translates it into [`FileOperation`]s, and a committed
//! application is recorded as an [`AppliedFix`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of repair a suggestion describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixType {
    /// Replace `old_code` with `new_code` in the target file
    Replace,
    /// Insert `new_code` at a position in the target file
    Insert,
    /// Remove `old_code` from the target file
    Delete,
    /// Add or update a dependency in the project manifest
    InstallPackage,
    /// Rewrite an import statement
    UpdateImport,
}

impl FixType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::InstallPackage => "install_package",
            Self::UpdateImport => "update_import",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "replace" => Some(Self::Replace),
            "insert" => Some(Self::Insert),
            "delete" => Some(Self::Delete),
            "install_package" => Some(Self::InstallPackage),
            "update_import" => Some(Self::UpdateImport),
            _ => None,
        }
    }
}

/// A proposed code change, as produced by the fix generator.
///
/// Invariant: for [`FixType::Replace`] and [`FixType::Delete`], `old_code`
/// must be a verbatim substring of the target file's current content at
/// application time, otherwise pre-application validation rejects the
/// suggestion before any state is touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixSuggestion {
    pub id: Uuid,
    pub fix_type: FixType,
    /// Target file path, or empty for the project's primary file
    pub target_file: String,
    /// Code to be replaced or removed (required for replace/delete)
    pub old_code: Option<String>,
    /// Replacement or inserted code
    pub new_code: String,
    /// Human-readable rationale from the generator
    pub explanation: String,
    /// Generator-reported confidence in [0, 1]
    pub confidence: f64,
    /// Insert offset for `insert` fixes
    pub position: Option<usize>,
    /// Package name for `install_package` fixes
    pub package: Option<String>,
    /// Package version for `install_package` fixes
    pub version: Option<String>,
    /// Import line being rewritten for `update_import` fixes
    pub old_import: Option<String>,
    pub new_import: Option<String>,
}

impl FixSuggestion {
    /// Create a minimal replace suggestion.
    pub fn replace(
        target_file: impl Into<String>,
        old_code: impl Into<String>,
        new_code: impl Into<String>,
        explanation: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            fix_type: FixType::Replace,
            target_file: target_file.into(),
            old_code: Some(old_code.into()),
            new_code: new_code.into(),
            explanation: explanation.into(),
            confidence,
            position: None,
            package: None,
            version: None,
            old_import: None,
            new_import: None,
        }
    }

    /// Structural sanity check: required fields present for the fix type.
    ///
    /// This is the input-error gate of the error taxonomy: shape problems are
    /// rejected here, before any validation or application, and never retried.
    pub fn check_shape(&self) -> Result<(), String> {
        match self.fix_type {
            FixType::Replace | FixType::Delete => {
                if self.old_code.as_deref().unwrap_or("").is_empty() {
                    return Err(format!(
                        "{} fix requires non-empty old_code",
                        self.fix_type.as_str()
                    ));
                }
            }
            FixType::Insert => {
                if self.new_code.is_empty() {
                    return Err("insert fix requires non-empty new_code".to_string());
                }
            }
            FixType::InstallPackage => {
                if self.package.as_deref().unwrap_or("").is_empty() {
                    return Err("install_package fix requires a package name".to_string());
                }
            }
            FixType::UpdateImport => {
                if self.old_import.is_none() || self.new_import.is_none() {
                    return Err("update_import fix requires old_import and new_import".to_string());
                }
            }
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} out of [0, 1]", self.confidence));
        }
        Ok(())
    }
}

/// Action taken on a package manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageAction {
    Install,
    Update,
    Remove,
}

/// One concrete mutation derived from a fix suggestion.
///
/// A single suggestion may expand into several operations when project
/// metadata needs a parallel update (file content plus dependency manifest).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileOperation {
    /// Substring replacement; `file: None` targets the primary file, where a
    /// missed match degrades to a full overwrite
    Update {
        file: Option<String>,
        old_content: String,
        new_content: String,
    },
    /// Positional insert into the primary file
    Insert { content: String, position: usize },
    /// Content removal from the primary file
    Delete { content: String },
    /// Dependency manifest change
    Package {
        action: PackageAction,
        name: String,
        version: Option<String>,
    },
}

/// Committed record of an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedFix {
    pub id: Uuid,
    pub fix_type: FixType,
    pub operations: Vec<FileOperation>,
    pub applied_at: DateTime<Utc>,
    /// Message of the error this fix was generated for
    pub original_error: String,
}
