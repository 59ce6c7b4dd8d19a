//! Package.json `exports` field evaluation.
//!
//! Implements the Node-compatible subset the rewriter needs:
//! - root exports (string shorthand, `"."` key, bare condition object)
//! - subpath keys (`"./feature"`)
//! - single-`*` pattern keys (`"./*"`, `"./features/*"`), most specific wins
//! - conditional targets (`import`/`require`/`default`), one nesting level
//!
//! A non-empty result means the package already declares a loadable entry
//! for the specifier, so the rewriter must leave it alone.

use serde_json::Value;

use crate::options::ModuleFormat;

/// Which conditional export to prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionKind {
    /// ESM import (prefer the `import` condition).
    Import,
    /// CJS require (prefer the `require` condition).
    Require,
    /// Unknown caller (prefer `default`, then `import`, then `require`).
    #[default]
    Unknown,
}

impl From<ModuleFormat> for ResolutionKind {
    fn from(format: ModuleFormat) -> Self {
        match format {
            ModuleFormat::Esm => Self::Import,
            ModuleFormat::Cjs => Self::Require,
        }
    }
}

impl std::fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::Require => write!(f, "require"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Resolve the `exports` field of a parsed manifest for a subpath.
///
/// `subpath` is `None` for the package root, or a `"./..."` form for a
/// subpath (`lodash/map` becomes `Some("./map")`). Returns the target
/// path starting with `"./"`, relative to the package root, or `None`
/// when the export map does not declare the entry.
#[must_use]
pub fn resolve_exports(manifest: &Value, subpath: Option<&str>, kind: ResolutionKind) -> Option<String> {
    match subpath {
        None => resolve_root(manifest, kind),
        Some(sub) => {
            // exact subpath keys shadow patterns
            resolve_subpath(manifest, sub, kind).or_else(|| resolve_pattern(manifest, sub, kind))
        }
    }
}

fn resolve_root(manifest: &Value, kind: ResolutionKind) -> Option<String> {
    let exports = manifest.get("exports")?;

    if let Some(target) = exports.as_str() {
        return validate_target(target);
    }

    let obj = exports.as_object()?;

    if let Some(dot) = obj.get(".") {
        return resolve_target(dot, kind);
    }

    // a bare condition object at the top level also addresses the root
    if obj.contains_key("import") || obj.contains_key("require") || obj.contains_key("default") {
        return resolve_target(exports, kind);
    }

    None
}

fn resolve_subpath(manifest: &Value, subpath: &str, kind: ResolutionKind) -> Option<String> {
    if !subpath.starts_with("./") {
        return None;
    }

    let obj = manifest.get("exports")?.as_object()?;

    // string shorthand and bare condition objects declare the root only
    if !has_subpath_keys(obj) {
        return None;
    }

    resolve_target(obj.get(subpath)?, kind)
}

fn resolve_pattern(manifest: &Value, subpath: &str, kind: ResolutionKind) -> Option<String> {
    if !subpath.starts_with("./") {
        return None;
    }

    let obj = manifest.get("exports")?.as_object()?;

    let mut candidates: Vec<(&str, &Value, String)> = Vec::new();
    for (key, value) in obj {
        if key.chars().filter(|&c| c == '*').count() != 1 || !key.starts_with("./") {
            continue;
        }
        if let Some(star) = match_pattern(key, subpath) {
            candidates.push((key.as_str(), value, star));
        }
    }

    // longest key is the most specific; lexicographic order breaks ties
    candidates.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

    let (_, target_value, star) = candidates.first()?;
    let target = resolve_target(target_value, kind)?;
    substitute_star(&target, star)
}

fn has_subpath_keys(obj: &serde_json::Map<String, Value>) -> bool {
    obj.keys().any(|k| k.starts_with("./") && k != ".")
}

/// Match a single-`*` pattern key against a subpath, returning the text
/// the `*` captured. Empty captures are rejected, so `"./features/*"`
/// does not match `"./features/"`.
fn match_pattern(pattern: &str, subpath: &str) -> Option<String> {
    let star_pos = pattern.find('*')?;
    let prefix = &pattern[..star_pos];
    let suffix = &pattern[star_pos + 1..];

    if !subpath.starts_with(prefix) {
        return None;
    }
    if !suffix.is_empty() && !subpath.ends_with(suffix) {
        return None;
    }

    let end = subpath.len().checked_sub(suffix.len())?;
    if prefix.len() >= end {
        return None;
    }

    Some(subpath[prefix.len()..end].to_string())
}

/// Substitute the captured text into a single-`*` target. The result must
/// stay inside the package: it keeps its `./` prefix and may not contain
/// a `..` segment.
fn substitute_star(target: &str, star: &str) -> Option<String> {
    if target.chars().filter(|&c| c == '*').count() != 1 {
        return None;
    }

    let result = target.replace('*', star);
    if !result.starts_with("./") {
        return None;
    }
    if result.split('/').any(|segment| segment == "..") {
        return None;
    }

    Some(result)
}

/// Resolve a target that is either a string or a condition object.
fn resolve_target(target: &Value, kind: ResolutionKind) -> Option<String> {
    if let Some(s) = target.as_str() {
        return validate_target(s);
    }

    let conditions = target.as_object()?;
    let picked = pick_condition(conditions, kind)?;

    if let Some(s) = picked.as_str() {
        return validate_target(s);
    }

    // one more level of nesting, string targets only
    if let Some(nested) = picked.as_object() {
        if let Some(s) = pick_condition(nested, kind).and_then(Value::as_str) {
            return validate_target(s);
        }
    }

    None
}

fn pick_condition<'a>(
    conditions: &'a serde_json::Map<String, Value>,
    kind: ResolutionKind,
) -> Option<&'a Value> {
    match kind {
        ResolutionKind::Import => conditions.get("import").or_else(|| conditions.get("default")),
        ResolutionKind::Require => conditions
            .get("require")
            .or_else(|| conditions.get("default")),
        ResolutionKind::Unknown => conditions
            .get("default")
            .or_else(|| conditions.get("import"))
            .or_else(|| conditions.get("require")),
    }
}

/// Export targets must be package-relative (`"./..."`); URLs, absolute
/// paths, and bare specifiers are ignored as Node does.
fn validate_target(target: &str) -> Option<String> {
    if target.starts_with("./") {
        Some(target.to_string())
    } else {
        None
    }
}
