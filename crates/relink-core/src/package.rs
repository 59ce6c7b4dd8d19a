//! Locating the installed package that owns a resolved file.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use crate::error::Error;

/// Directory name marking an installed-dependency tree.
pub const MODULES_DIR: &str = "node_modules";

/// Manifest file name at every package root.
pub const MANIFEST_FILE: &str = "package.json";

/// The installed package enclosing a resolved file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageBoundary {
    /// Package name, `@scope/name` for scoped packages.
    pub name: String,

    /// Directory of the installed package, `<...>/node_modules/<name>`.
    pub root: PathBuf,

    /// `<root>/package.json`. Not guaranteed to exist.
    pub manifest_path: PathBuf,
}

impl PackageBoundary {
    /// Express a bare specifier as an exports-map request for this
    /// package: the name alone means the root entry (`None`), a
    /// `name/rest` specifier means `Some("./rest")`. Returns `None` when
    /// the specifier does not address this package by name, such as a
    /// relative import that resolved into the package directory.
    #[must_use]
    pub fn subpath_request(&self, specifier: &str) -> Option<Option<String>> {
        if specifier == self.name {
            return Some(None);
        }
        let rest = specifier.strip_prefix(&self.name)?.strip_prefix('/')?;
        if rest.is_empty() {
            return Some(None);
        }
        Some(Some(format!("./{rest}")))
    }
}

/// Find the nearest installed package enclosing `path`.
///
/// Looks for the *rightmost* `node_modules` component, so a dependency
/// nested inside another dependency's tree is attributed to the inner
/// package. Returns `None` when the path sits outside any dependency
/// tree, which signals project-owned source.
#[must_use]
pub fn locate_boundary(path: &Path) -> Option<PackageBoundary> {
    let components: Vec<Component> = path.components().collect();
    let marker = components
        .iter()
        .rposition(|c| matches!(c, Component::Normal(name) if *name == OsStr::new(MODULES_DIR)))?;

    let first = match components.get(marker + 1) {
        Some(Component::Normal(name)) => name.to_str()?,
        _ => return None,
    };

    let name = if first.starts_with('@') {
        let second = match components.get(marker + 2) {
            Some(Component::Normal(name)) => name.to_str()?,
            _ => return None,
        };
        format!("{first}/{second}")
    } else {
        first.to_string()
    };

    let mut root: PathBuf = components[..=marker].iter().collect();
    root.push(&name);
    let manifest_path = root.join(MANIFEST_FILE);

    Some(PackageBoundary {
        name,
        root,
        manifest_path,
    })
}

/// Read and parse a package manifest.
///
/// A missing or unreadable file maps to [`Error::ManifestRead`], malformed
/// JSON to [`Error::ManifestParse`]. Callers that can tolerate a broken
/// manifest must check existence first.
pub fn read_manifest(path: &Path) -> Result<Value, Error> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| Error::ManifestParse {
        path: path.to_path_buf(),
        source,
    })
}
