//! Classification of raw import specifiers.
//!
//! A specifier is the string exactly as written in the chunk source, e.g.
//! `./util`, `../../lib`, or `react/jsx-runtime`. Classification decides
//! whether the rewriter needs to touch it at all, and if so, which
//! resolution path applies.

/// Extensions the rewriter treats as already concrete. A specifier whose
/// final segment ends in one of these is loadable as-is and never rewritten.
pub const KNOWN_EXTENSIONS: &[&str] = &[".mjs", ".js", ".jsx", ".cjs", ".json", ".node"];

/// How a raw specifier should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Final segment already carries a recognized extension.
    Extensioned,
    /// Relative (`./x`, `../x`, `.`, `..`) or absolute filesystem path.
    Relative,
    /// Package reference such as `lodash/map` or `@scope/pkg`.
    Bare,
}

/// Classify a raw specifier. Pure; no filesystem access.
#[must_use]
pub fn classify(specifier: &str) -> Classification {
    if has_known_extension(specifier) {
        Classification::Extensioned
    } else if is_relative(specifier) || is_absolute_specifier(specifier) {
        Classification::Relative
    } else {
        Classification::Bare
    }
}

/// True when the specifier's final path segment ends in one of
/// [`KNOWN_EXTENSIONS`]. A segment that *is* an extension (`./.js`) does
/// not count, matching how module loaders treat dotfiles.
#[must_use]
pub fn has_known_extension(specifier: &str) -> bool {
    let segment = specifier.rsplit('/').next().unwrap_or(specifier);
    KNOWN_EXTENSIONS
        .iter()
        .any(|ext| segment.ends_with(ext) && segment.len() > ext.len())
}

/// True for `.`, `..`, and `./`/`../`-prefixed specifiers.
#[must_use]
pub fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// True for absolute filesystem paths: Unix `/`, Windows drive (`C:\` or
/// `C:/`), or UNC (`\\server\share`).
#[must_use]
pub fn is_absolute_specifier(specifier: &str) -> bool {
    if specifier.starts_with('/') || specifier.starts_with("\\\\") {
        return true;
    }
    let bytes = specifier.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}

/// Coerce trailing-dot references into explicit directory form, so `.`
/// becomes `./` and `../..` becomes `../../`. Module resolution treats
/// the slash-terminated form as a directory reference; the bare form is
/// ambiguous.
#[must_use]
pub fn normalize(specifier: &str) -> String {
    if specifier.ends_with('.') {
        format!("{specifier}/")
    } else {
        specifier.to_string()
    }
}
