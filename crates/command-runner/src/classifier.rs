//! Classification of console lines into error categories

use crate::category::{ErrorCategory, ErrorCategoryState};
use crate::pattern;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Ordered mapping from category name to the patterns that indicate it.
///
/// Categories are consulted in insertion order and patterns in list order;
/// the first matching pattern decides the category of a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCategoryMapping {
    categories: IndexMap<String, Vec<String>>,
}

impl ErrorCategoryMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Add patterns for a category, appending to any already present
    pub fn insert<I, S>(&mut self, category: impl Into<String>, patterns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories
            .entry(category.into())
            .or_default()
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with<I, S>(mut self, category: impl Into<String>, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(category, patterns);
        self
    }

    /// Returns true if no category is configured
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Iterate over categories and their patterns in configured order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(name, patterns)| (name.as_str(), patterns.as_slice()))
    }

    /// Category of the first pattern matching `line`, if any
    pub fn category_for(&self, line: &str) -> Option<ErrorCategory> {
        self.iter()
            .find(|(_, patterns)| patterns.iter().any(|p| pattern::matches(line, p)))
            .map(|(name, _)| ErrorCategory::from_name(name))
    }
}

impl<K, I, S> FromIterator<(K, I)> for ErrorCategoryMapping
where
    K: Into<String>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        let mut mapping = Self::new();
        for (category, patterns) in iter {
            mapping.insert(category, patterns);
        }
        mapping
    }
}

/// Records the categories of console lines for a single run.
///
/// Every match is written both to the caller's shared
/// [`ErrorCategoryState`] and to a state private to the run, so the outcome
/// of a run is not affected by other runs writing the shared state.
#[derive(Debug, Clone)]
pub struct Classifier {
    mapping: ErrorCategoryMapping,
    shared: ErrorCategoryState,
    run: ErrorCategoryState,
}

impl Classifier {
    /// Create a classifier reporting into `shared`
    pub fn new(mapping: ErrorCategoryMapping, shared: ErrorCategoryState) -> Self {
        Self {
            mapping,
            shared,
            run: ErrorCategoryState::new(),
        }
    }

    /// Classify one console line.
    ///
    /// A line matching no pattern leaves both states untouched.
    pub fn classify(&self, line: &str) {
        if let Some(category) = self.mapping.category_for(line) {
            warn!(category = %category, line, "Console output matched error category");
            self.shared.set(category.clone());
            self.run.set(category);
        }
    }

    /// Last category recognised by this classifier
    pub fn run_category(&self) -> ErrorCategory {
        self.run.get()
    }
}
