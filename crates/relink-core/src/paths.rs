use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically by dropping `.` components and folding `..`
/// into the preceding component where one exists.
///
/// No filesystem access happens here. Symlinked `node_modules` layouts keep
/// whatever shape the bundler saw, and paths that escape their starting
/// point keep their leading `..` components.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Compute a lexical relative path from the directory `base` to `target`.
///
/// Both paths are normalized first; the shared prefix is dropped and each
/// remaining `base` component becomes a `..`. Returns `.` when the paths
/// are equal.
#[must_use]
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base = normalize_path(base);
    let target = normalize_path(target);

    let base_parts: Vec<Component> = base.components().collect();
    let target_parts: Vec<Component> = target.components().collect();

    let common = base_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base_parts.len() {
        result.push("..");
    }
    for part in &target_parts[common..] {
        result.push(part);
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}

/// Render a path as a `/`-separated string for use in an import specifier.
#[must_use]
pub fn forward_slashes(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::RootDir => out.push('/'),
            Component::CurDir => {
                if !out.is_empty() {
                    out.push('/');
                }
                out.push('.');
            }
            Component::ParentDir => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str("..");
            }
            Component::Prefix(prefix) => {
                out.push_str(&prefix.as_os_str().to_string_lossy());
            }
            Component::Normal(name) => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&name.to_string_lossy());
            }
        }
    }
    out
}
