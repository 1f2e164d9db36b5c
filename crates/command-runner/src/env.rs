//! Environment overlay for child processes and `$VAR` interpolation

use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("environment reference pattern is valid")
});

/// Ordered list of `KEY=VALUE` entries handed to a child process.
///
/// The overlay is also the only source consulted when interpolating
/// arguments; the parent's environment is never read implicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    entries: Vec<String>,
}

impl EnvOverlay {
    /// Create an empty overlay
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay holding the current process environment.
    ///
    /// Variables that are not valid UTF-8 are left out.
    pub fn inherited() -> Self {
        Self {
            entries: std::env::vars_os()
                .filter_map(|(key, value)| Some(format!("{}={}", key.to_str()?, value.to_str()?)))
                .collect(),
        }
    }

    /// Replace all entries
    pub fn set<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries = entries.into_iter().map(Into::into).collect();
    }

    /// Append entries; later entries win over earlier ones with the same key
    pub fn append<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.extend(entries.into_iter().map(Into::into));
    }

    /// Returns true if no entry has been set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The raw `KEY=VALUE` entries
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Key/value pairs in order. Entries without `=` are skipped.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|entry| {
            let pair = entry.split_once('=');
            if pair.is_none() {
                debug!(entry = %entry, "Ignoring environment entry without '='");
            }
            pair
        })
    }

    /// Value of `name`, taking the last entry when a key repeats
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.pairs()
            .filter(|(key, _)| *key == name)
            .map(|(_, value)| value)
            .last()
    }

    /// Replace `$NAME` and `${NAME}` references in `arg` with overlay values.
    ///
    /// References to names missing from the overlay are kept verbatim.
    pub fn interpolate(&self, arg: &str) -> String {
        ENV_REFERENCE
            .replace_all(arg, |caps: &Captures<'_>| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map_or("", |m| m.as_str());
                match self.lookup(name) {
                    Some(value) => value.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(entries: &[&str]) -> EnvOverlay {
        let mut env = EnvOverlay::new();
        env.set(entries.iter().copied());
        env
    }

    #[test]
    fn test_interpolates_one() {
        let env = overlay(&["TEST=ThisCanBeAnything123"]);
        assert_eq!(env.interpolate("$TEST"), "ThisCanBeAnything123");
        assert_eq!(env.interpolate("--some-arg"), "--some-arg");
    }

    #[test]
    fn test_both_forms_resolve_identically() {
        let env = overlay(&["TEST1=FirstOne", "TEST2=SecondOne"]);
        assert_eq!(env.interpolate("$TEST1"), "FirstOne");
        assert_eq!(env.interpolate("${TEST1}"), "FirstOne");
        assert_eq!(env.interpolate("${TEST1}-$TEST2"), "FirstOne-SecondOne");
        assert_eq!(env.interpolate("prefix${TEST2}suffix"), "prefixSecondOnesuffix");
    }

    #[test]
    fn test_unresolved_reference_kept_verbatim() {
        let env = overlay(&["TEST=value"]);
        assert_eq!(env.interpolate("$MISSING"), "$MISSING");
        assert_eq!(env.interpolate("${MISSING}/bin"), "${MISSING}/bin");
        assert_eq!(env.interpolate("costs $5"), "costs $5");
    }

    #[test]
    fn test_last_entry_wins() {
        let mut env = overlay(&["MODE=debug"]);
        env.append(["MODE=release"]);
        assert_eq!(env.lookup("MODE"), Some("release"));
    }

    #[test]
    fn test_values_may_contain_equals() {
        let env = overlay(&["OPTS=-Dkey=value", "BROKEN"]);
        assert_eq!(env.lookup("OPTS"), Some("-Dkey=value"));
        assert_eq!(env.pairs().count(), 1);
        assert_eq!(env.entries().len(), 2);
    }
}
