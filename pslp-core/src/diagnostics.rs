//! A dedicated, headless diagnostics sink (spec §7: "Diagnostic output is
//! separated from error returns and uses a dedicated sink ... so the core
//! remains headless and testable").
//!
//! Components that can degrade gracefully (RT alignment falling back to
//! `identity`, clustering reporting cluster-size histograms) push
//! [`Diagnostic`] values here instead of logging or failing. Callers decide
//! what to do with them — print, ignore, or assert on in tests.

use std::fmt;

/// Severity of a recorded diagnostic.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Level {
    /// Informational, e.g. a cluster-size histogram.
    Info,
    /// Something degraded but the computation still produced a usable result.
    Warning,
}

/// A single diagnostic message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    /// Severity of this diagnostic.
    pub level: Level,
    /// Human-readable message; never parsed by callers.
    pub message: String,
}

impl Diagnostic {
    /// Build an informational diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    /// Build a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            Level::Info => "info",
            Level::Warning => "warning",
        };
        write!(f, "[{level}] {}", self.message)
    }
}

/// An ordered collection of [`Diagnostic`]s accumulated while running an
/// algorithm. Threaded through by `&mut` reference rather than returned as a
/// side channel, so call sites stay explicit about what can warn.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an informational diagnostic.
    pub fn info(&mut self, message: impl Into<String>) {
        self.0.push(Diagnostic::info(message));
    }

    /// Record a warning diagnostic.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.0.push(Diagnostic::warning(message));
    }

    /// All recorded diagnostics, in recording order.
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.0
    }

    /// True if no diagnostic of [`Level::Warning`] or above was recorded.
    pub fn is_clean(&self) -> bool {
        !self.0.iter().any(|d| d.level >= Level::Warning)
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no diagnostics were recorded at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_until_a_warning_is_pushed() {
        let mut d = Diagnostics::new();
        assert!(d.is_clean());
        d.info("just fyi");
        assert!(d.is_clean());
        d.warn("something degraded");
        assert!(!d.is_clean());
        assert_eq!(d.len(), 2);
    }
}
