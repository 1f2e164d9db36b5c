//! Error categories assigned from console output

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Category of a failure, as recognised from a command's console output
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCategory {
    /// Nothing was recognised
    #[default]
    Undefined,
    /// Build or compilation failure
    Build,
    /// Compliance check failure
    Compliance,
    /// Misconfiguration on the caller's side
    Configuration,
    /// Failure in custom, user supplied code
    Custom,
    /// Failure of the surrounding infrastructure
    Infrastructure,
    /// Failure of a remote service
    Service,
    /// Test failure
    Test,
    /// A configured category outside the well-known set
    Other(String),
}

impl ErrorCategory {
    /// Resolve a category name as it appears in a category mapping.
    ///
    /// Names are case-insensitive; `config` is accepted for `configuration`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "undefined" => Self::Undefined,
            "build" => Self::Build,
            "compliance" => Self::Compliance,
            "config" | "configuration" => Self::Configuration,
            "custom" => Self::Custom,
            "infrastructure" => Self::Infrastructure,
            "service" => Self::Service,
            "test" => Self::Test,
            _ => Self::Other(name.trim().to_string()),
        }
    }

    /// Canonical name of the category
    pub fn as_str(&self) -> &str {
        match self {
            Self::Undefined => "undefined",
            Self::Build => "build",
            Self::Compliance => "compliance",
            Self::Configuration => "configuration",
            Self::Custom => "custom",
            Self::Infrastructure => "infrastructure",
            Self::Service => "service",
            Self::Test => "test",
            Self::Other(name) => name,
        }
    }

    /// Returns true if no category has been recognised
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ErrorCategory {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<String> for ErrorCategory {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<ErrorCategory> for String {
    fn from(category: ErrorCategory) -> Self {
        category.as_str().to_string()
    }
}

/// Shared, cloneable holder of the most recently recognised category.
///
/// All clones observe the same value; the last writer wins. Runners never
/// clear it on their own, so callers that want fresh results reset it
/// before a run.
#[derive(Debug, Clone, Default)]
pub struct ErrorCategoryState {
    inner: Arc<Mutex<ErrorCategory>>,
}

impl ErrorCategoryState {
    /// Create a new state holding [`ErrorCategory::Undefined`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current category
    pub fn get(&self) -> ErrorCategory {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Overwrite the current category
    pub fn set(&self, category: ErrorCategory) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = category;
    }

    /// Set the category back to [`ErrorCategory::Undefined`]
    pub fn reset(&self) {
        self.set(ErrorCategory::Undefined);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_resolve() {
        assert_eq!(ErrorCategory::from_name("config"), ErrorCategory::Configuration);
        assert_eq!(
            ErrorCategory::from_name("Configuration"),
            ErrorCategory::Configuration
        );
        assert_eq!(ErrorCategory::from_name("build"), ErrorCategory::Build);
        assert_eq!(ErrorCategory::from_name(""), ErrorCategory::Undefined);
        assert_eq!(
            ErrorCategory::from_name("network"),
            ErrorCategory::Other("network".to_string())
        );
    }

    #[test]
    fn test_display_uses_canonical_name() {
        assert_eq!(ErrorCategory::from("config").to_string(), "configuration");
        assert_eq!(ErrorCategory::Other("network".into()).to_string(), "network");
    }

    #[test]
    fn test_state_is_shared_between_clones() {
        let state = ErrorCategoryState::new();
        let other = state.clone();
        assert!(state.get().is_undefined());

        other.set(ErrorCategory::Build);
        assert_eq!(state.get(), ErrorCategory::Build);

        state.reset();
        assert!(other.get().is_undefined());
    }
}
