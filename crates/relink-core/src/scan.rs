//! Import scanning for chunk sources.
//!
//! Walks JavaScript source and extracts the specifier of every import
//! statement, export-from statement, dynamic `import()` call, and
//! `require()` call, skipping comments and unrelated string literals.

use std::collections::HashSet;

use crate::rewrite::statement::walk_import_literals;

/// The statement shape a specifier was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// `import ... from '<spec>'` or `import '<spec>'`
    EsmImport,
    /// `export ... from '<spec>'`
    EsmExport,
    /// `import('<spec>')`
    DynamicImport,
    /// `require('<spec>')`
    CjsRequire,
}

impl ImportKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EsmImport => "esm_import",
            Self::EsmExport => "esm_export",
            Self::DynamicImport => "dynamic_import",
            Self::CjsRequire => "cjs_require",
        }
    }
}

impl std::fmt::Display for ImportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A specifier occurrence found in chunk source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// The specifier text exactly as written between the quotes.
    pub raw: String,
    pub kind: ImportKind,
    /// Line number (1-indexed, best-effort).
    pub line: Option<u32>,
}

/// Scan source code and collect each distinct specifier once, in order of
/// first appearance.
#[must_use]
pub fn scan_imports(source: &str) -> Vec<ImportSpec> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut specs = Vec::new();

    for site in walk_import_literals(source) {
        let raw = &source[site.range.clone()];
        if raw.is_empty() || !seen.insert(raw.to_string()) {
            continue;
        }
        specs.push(ImportSpec {
            raw: raw.to_string(),
            kind: site.kind,
            line: Some(site.line),
        });
    }

    specs
}
