//! Per-specifier outcome reporting.
//!
//! The transform driver emits one outcome per declared specifier through
//! an injected reporter, keeping the core free of any output policy. The
//! CLI collects outcomes for its summaries; library embedders can pass
//! [`NullReporter`].

use std::path::Path;

use crate::resolver::EntryReason;

/// Why a specifier was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The specifier already ends in a recognized extension.
    HasExtension,
    /// The specifier names a platform builtin.
    Builtin,
    /// The owning package's exports map resolves the specifier as-is.
    ExportsMapResolves,
    /// The computed find text has no occurrence in the chunk.
    NoMatchInText,
    /// No owning package and the resolved path is not an absolute
    /// filesystem path; there is nothing on disk to point the specifier at.
    NotRewritable,
}

impl SkipReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HasExtension => "HAS_EXTENSION",
            Self::Builtin => "BUILTIN",
            Self::ExportsMapResolves => "EXPORTS_MAP_RESOLVES",
            Self::NoMatchInText => "NO_MATCH_IN_TEXT",
            Self::NotRewritable => "NOT_REWRITABLE",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened to one declared specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecifierOutcome {
    Rewritten {
        find: String,
        replace: String,
        occurrences: usize,
    },
    Skipped(SkipReason),
    /// Resolution failed; the specifier is left as written.
    Failed { reason: EntryReason },
}

/// Sink for per-specifier outcomes.
pub trait Reporter: Send + Sync {
    fn specifier(&self, chunk: &Path, specifier: &str, outcome: &SpecifierOutcome);
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn specifier(&self, _chunk: &Path, _specifier: &str, _outcome: &SpecifierOutcome) {}
}
