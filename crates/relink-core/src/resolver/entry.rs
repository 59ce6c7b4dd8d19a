//! Two-stage entry-point resolution.
//!
//! Stage one is a self-contained Node-style lookup: relative and absolute
//! paths with extension probing, directory `main`/`index.*` resolution,
//! and a `node_modules` ancestor walk honoring export maps. Stage two
//! strips the found file's extension and probes a fixed list of
//! module-format variants, so an `.mjs` or `.cjs` sibling wins over the
//! plain `.js` entry when bundling for that format.

use std::path::{Path, PathBuf};

use serde_json::Value;

use super::exports::{resolve_exports, ResolutionKind};
use crate::package::{MANIFEST_FILE, MODULES_DIR};
use crate::paths::normalize_path;
use crate::specifier;

/// Module-format variants probed after base resolution, in preference order.
pub const PROBE_EXTENSIONS: &[&str] = &[".mjs", ".js", ".jsx", ".cjs"];

/// Extensions probed during the Node-style lookup itself. `.json` is
/// included for parity with CommonJS resolution.
const LOOKUP_EXTENSIONS: &[&str] = &[".mjs", ".js", ".jsx", ".cjs", ".json"];

/// Maximum number of tried paths to record.
const MAX_TRIED_PATHS: usize = 20;

/// Node core modules, matched on the package-name segment so `fs/promises`
/// and friends are covered.
const BUILTIN_MODULES: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Context for one chunk's resolutions.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// Directory containing the chunk's originating source file.
    pub base_dir: PathBuf,
    /// Which conditional exports to prefer.
    pub kind: ResolutionKind,
}

impl ResolveContext {
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, kind: ResolutionKind) -> Self {
        Self {
            base_dir: base_dir.into(),
            kind,
        }
    }
}

/// Resolution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Resolved,
    Unresolved,
}

/// Reason codes for unresolved specifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryReason {
    SpecifierInvalid,
    UnsupportedScheme,
    NotFound,
    IsDirectory,
    ModulesDirNotFound,
    /// An export map exists but declares no entry for the subpath.
    ExportsNotFound,
    /// An export map names a target that does not exist on disk.
    ExportsTargetNotFound,
}

impl EntryReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpecifierInvalid => "SPECIFIER_INVALID",
            Self::UnsupportedScheme => "UNSUPPORTED_SCHEME",
            Self::NotFound => "NOT_FOUND",
            Self::IsDirectory => "IS_DIRECTORY",
            Self::ModulesDirNotFound => "NODE_MODULES_NOT_FOUND",
            Self::ExportsNotFound => "EXPORTS_NOT_FOUND",
            Self::ExportsTargetNotFound => "EXPORTS_TARGET_NOT_FOUND",
        }
    }
}

impl std::fmt::Display for EntryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A successfully resolved entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedEntry {
    /// Concrete file, with the format-variant extension that matched
    /// during stage-two probing, if any.
    File {
        path: PathBuf,
        probed: Option<&'static str>,
    },
    /// Platform builtin such as `fs` or `node:path`. Loadable as-is.
    Builtin,
}

/// Result of resolving one specifier.
#[derive(Debug, Clone)]
pub struct EntryResolution {
    /// The entry point, when resolution succeeded.
    pub entry: Option<ResolvedEntry>,
    /// Status.
    pub status: EntryStatus,
    /// Reason code if unresolved.
    pub reason: Option<EntryReason>,
    /// Candidate paths tried (capped).
    pub tried: Vec<PathBuf>,
}

impl EntryResolution {
    fn file(path: PathBuf, probed: Option<&'static str>, tried: Vec<PathBuf>) -> Self {
        Self {
            entry: Some(ResolvedEntry::File { path, probed }),
            status: EntryStatus::Resolved,
            reason: None,
            tried,
        }
    }

    fn builtin() -> Self {
        Self {
            entry: Some(ResolvedEntry::Builtin),
            status: EntryStatus::Resolved,
            reason: None,
            tried: Vec::new(),
        }
    }

    fn unresolved(reason: EntryReason, tried: Vec<PathBuf>) -> Self {
        Self {
            entry: None,
            status: EntryStatus::Unresolved,
            reason: Some(reason),
            tried,
        }
    }

    /// Path of the resolved file, when the entry is a concrete file.
    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        match &self.entry {
            Some(ResolvedEntry::File { path, .. }) => Some(path),
            _ => None,
        }
    }
}

/// Resolve a specifier to its entry point.
///
/// Expects the specifier in normalized form (trailing-dot references
/// already coerced to directory form, see [`crate::specifier::normalize`]).
#[must_use]
pub fn resolve_entry(ctx: &ResolveContext, spec: &str) -> EntryResolution {
    let mut tried = Vec::new();

    if spec.is_empty() {
        return EntryResolution::unresolved(EntryReason::SpecifierInvalid, tried);
    }

    if let Some(rest) = spec.strip_prefix("node:") {
        let name = rest.split('/').next().unwrap_or(rest);
        if is_builtin_module(name) {
            return EntryResolution::builtin();
        }
        return EntryResolution::unresolved(EntryReason::NotFound, tried);
    }

    if spec.contains("://") || spec.starts_with("data:") {
        return EntryResolution::unresolved(EntryReason::UnsupportedScheme, tried);
    }

    // package-internal import maps (`#feature`) are not consulted by this pass
    if spec.starts_with('#') {
        return EntryResolution::unresolved(EntryReason::NotFound, tried);
    }

    if specifier::is_relative(spec) {
        let base = normalize_path(&ctx.base_dir.join(spec));
        // a trailing slash is an explicit directory reference
        if spec.ends_with('/') {
            return resolve_directory(&base, &mut tried);
        }
        return resolve_path(&base, &mut tried);
    }

    if specifier::is_absolute_specifier(spec) {
        return resolve_path(Path::new(spec), &mut tried);
    }

    resolve_bare(ctx, spec, &mut tried)
}

/// Resolve a filesystem path: exact file, then extension probing, then
/// directory resolution. A file wins over a same-named directory, matching
/// the runtime loader.
fn resolve_path(base: &Path, tried: &mut Vec<PathBuf>) -> EntryResolution {
    if base.is_file() {
        return finish(base.to_path_buf(), tried);
    }

    for ext in LOOKUP_EXTENSIONS {
        let candidate = append_extension(base, ext);
        add_tried(tried, &candidate);
        if candidate.is_file() {
            return finish(candidate, tried);
        }
    }

    resolve_directory(base, tried)
}

/// Resolve a directory entry point: manifest `main`, then `index.*`.
fn resolve_directory(dir: &Path, tried: &mut Vec<PathBuf>) -> EntryResolution {
    let manifest_path = dir.join(MANIFEST_FILE);
    if manifest_path.is_file() {
        add_tried(tried, &manifest_path);

        if let Some(manifest) = read_manifest_lenient(&manifest_path) {
            if let Some(main) = manifest.get("main").and_then(Value::as_str) {
                let main_path = normalize_path(&dir.join(main));
                if main_path.is_file() {
                    return finish(main_path, tried);
                }
                for ext in LOOKUP_EXTENSIONS {
                    let candidate = append_extension(&main_path, ext);
                    add_tried(tried, &candidate);
                    if candidate.is_file() {
                        return finish(candidate, tried);
                    }
                }
                if main_path.is_dir() {
                    for ext in LOOKUP_EXTENSIONS {
                        let index = main_path.join(format!("index{ext}"));
                        add_tried(tried, &index);
                        if index.is_file() {
                            return finish(index, tried);
                        }
                    }
                }
                // dangling main falls through to index probing
            }
        }
    }

    for ext in LOOKUP_EXTENSIONS {
        let index = dir.join(format!("index{ext}"));
        add_tried(tried, &index);
        if index.is_file() {
            return finish(index, tried);
        }
    }

    if dir.is_dir() {
        EntryResolution::unresolved(EntryReason::IsDirectory, tried.clone())
    } else {
        EntryResolution::unresolved(EntryReason::NotFound, tried.clone())
    }
}

/// Resolve a bare specifier through the `node_modules` ancestor walk.
fn resolve_bare(ctx: &ResolveContext, spec: &str, tried: &mut Vec<PathBuf>) -> EntryResolution {
    let (pkg_name, subpath) = parse_bare_specifier(spec);

    if is_builtin_module(pkg_name) {
        return EntryResolution::builtin();
    }

    let mut found_modules_dir = false;
    let mut specific_error: Option<EntryReason> = None;
    let mut current = Some(ctx.base_dir.as_path());

    while let Some(dir) = current {
        let modules_dir = dir.join(MODULES_DIR);

        if modules_dir.is_dir() {
            found_modules_dir = true;

            let pkg_dir = modules_dir.join(pkg_name);
            add_tried(tried, &pkg_dir);

            if pkg_dir.is_dir() {
                let result = match subpath {
                    Some(sub) => resolve_package_subpath(ctx, &pkg_dir, sub, tried),
                    None => resolve_package_root(ctx, &pkg_dir, tried),
                };
                if result.status == EntryStatus::Resolved {
                    return result;
                }
                // keep the closest package's export-map verdict for diagnostics
                if let Some(
                    reason @ (EntryReason::ExportsNotFound | EntryReason::ExportsTargetNotFound),
                ) = result.reason
                {
                    specific_error.get_or_insert(reason);
                }
            }
        }

        current = dir.parent();
    }

    if let Some(reason) = specific_error {
        return EntryResolution::unresolved(reason, tried.clone());
    }
    if found_modules_dir {
        EntryResolution::unresolved(EntryReason::NotFound, tried.clone())
    } else {
        EntryResolution::unresolved(EntryReason::ModulesDirNotFound, tried.clone())
    }
}

/// Resolve a package root. An export map, when present, is authoritative:
/// a miss fails the resolution instead of falling back to `main`, since a
/// rewrite to an unexported file would not load at runtime.
fn resolve_package_root(
    ctx: &ResolveContext,
    pkg_dir: &Path,
    tried: &mut Vec<PathBuf>,
) -> EntryResolution {
    let manifest_path = pkg_dir.join(MANIFEST_FILE);
    if manifest_path.is_file() {
        add_tried(tried, &manifest_path);

        if let Some(manifest) = read_manifest_lenient(&manifest_path) {
            if manifest.get("exports").is_some() {
                return match resolve_exports(&manifest, None, ctx.kind) {
                    Some(target) => resolve_export_target(pkg_dir, &target, tried),
                    None => EntryResolution::unresolved(EntryReason::ExportsNotFound, tried.clone()),
                };
            }
        }
    }

    resolve_directory(pkg_dir, tried)
}

/// Resolve a package subpath, honoring the export map when one exists.
fn resolve_package_subpath(
    ctx: &ResolveContext,
    pkg_dir: &Path,
    subpath: &str,
    tried: &mut Vec<PathBuf>,
) -> EntryResolution {
    let manifest_path = pkg_dir.join(MANIFEST_FILE);
    if manifest_path.is_file() {
        add_tried(tried, &manifest_path);

        if let Some(manifest) = read_manifest_lenient(&manifest_path) {
            if manifest.get("exports").is_some() {
                let exports_subpath = format!("./{subpath}");
                return match resolve_exports(&manifest, Some(&exports_subpath), ctx.kind) {
                    Some(target) => resolve_export_target(pkg_dir, &target, tried),
                    None => EntryResolution::unresolved(EntryReason::ExportsNotFound, tried.clone()),
                };
            }
        }
    }

    resolve_path(&normalize_path(&pkg_dir.join(subpath)), tried)
}

/// Land an export-map target on a concrete file.
fn resolve_export_target(
    pkg_dir: &Path,
    target: &str,
    tried: &mut Vec<PathBuf>,
) -> EntryResolution {
    let target_path = normalize_path(&pkg_dir.join(target.trim_start_matches("./")));
    add_tried(tried, &target_path);

    if target_path.is_file() {
        return finish(target_path, tried);
    }
    for ext in LOOKUP_EXTENSIONS {
        let candidate = append_extension(&target_path, ext);
        add_tried(tried, &candidate);
        if candidate.is_file() {
            return finish(candidate, tried);
        }
    }

    EntryResolution::unresolved(EntryReason::ExportsTargetNotFound, tried.clone())
}

/// Run stage-two variant probing on a found file and build the result.
fn finish(path: PathBuf, tried: &mut Vec<PathBuf>) -> EntryResolution {
    let (path, probed) = probe_variant(path, tried);
    EntryResolution::file(path, probed, tried.clone())
}

/// Strip the found file's extension and try each format variant in order.
/// The first sibling confirmed on disk wins; otherwise the original file
/// is kept with no variant recorded.
fn probe_variant(path: PathBuf, tried: &mut Vec<PathBuf>) -> (PathBuf, Option<&'static str>) {
    let stem = path.with_extension("");

    for ext in PROBE_EXTENSIONS {
        let candidate = append_extension(&stem, ext);
        if candidate == path {
            return (path, Some(*ext));
        }
        add_tried(tried, &candidate);
        if candidate.is_file() {
            return (candidate, Some(*ext));
        }
    }

    (path, None)
}

/// Append an extension without replacing an existing one, so probing
/// `./app.config` tries `./app.config.js` rather than `./app.js`.
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(ext);
    PathBuf::from(os)
}

/// Parse a bare specifier into package name and optional subpath.
/// `lodash/fp` splits at the first slash; `@scope/pkg/sub` at the second.
fn parse_bare_specifier(spec: &str) -> (&str, Option<&str>) {
    if spec.starts_with('@') {
        let mut slashes = 0;
        for (i, c) in spec.char_indices() {
            if c == '/' {
                slashes += 1;
                if slashes == 2 {
                    return (&spec[..i], non_empty(&spec[i + 1..]));
                }
            }
        }
        return (spec, None);
    }

    match spec.find('/') {
        Some(pos) => (&spec[..pos], non_empty(&spec[pos + 1..])),
        None => (spec, None),
    }
}

fn non_empty(sub: &str) -> Option<&str> {
    if sub.is_empty() {
        None
    } else {
        Some(sub)
    }
}

fn is_builtin_module(name: &str) -> bool {
    BUILTIN_MODULES.contains(&name)
}

/// Manifest reads during resolution are lenient: a broken manifest falls
/// back to plain directory resolution instead of failing the specifier.
fn read_manifest_lenient(path: &Path) -> Option<Value> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Add a path to the tried list (with cap).
fn add_tried(tried: &mut Vec<PathBuf>, path: &Path) {
    if tried.len() < MAX_TRIED_PATHS {
        tried.push(path.to_path_buf());
    }
}
