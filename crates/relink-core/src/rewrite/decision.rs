//! Computation of the find/replace pair for one resolved specifier.

use std::path::Path;

use crate::options::ModuleFormat;
use crate::package::PackageBoundary;
use crate::paths::{forward_slashes, relative_path};

/// The exact specifier text to look for in the chunk and the text to put
/// in its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteDecision {
    pub find: String,
    pub replace: String,
}

impl RewriteDecision {
    /// Rewrite for an entry point owned by an installed package without a
    /// usable exports map. The replacement is the entry path expressed
    /// from the package's installed-dependency root, so the runtime walks
    /// the same dependency tree and lands on the concrete file.
    #[must_use]
    pub fn package_owned(
        specifier: &str,
        boundary: &PackageBoundary,
        abs_entry: &Path,
    ) -> RewriteDecision {
        let inner = relative_path(&boundary.root, abs_entry);
        RewriteDecision {
            find: specifier.to_string(),
            replace: format!("{}/{}", boundary.name, forward_slashes(&inner)),
        }
    }

    /// Rewrite for an entry point inside the project tree. The find text
    /// is the entry path relative to the chunk's directory with the final
    /// extension stripped and a trailing `/index` collapsed, which is the
    /// form compiled output uses to reference the module. The replacement
    /// appends the concrete extension to the collapsed path.
    ///
    /// Returns `None` when the entry path is not absolute.
    #[must_use]
    pub fn project_relative(
        base_dir: &Path,
        abs_entry: &Path,
        probed: Option<&'static str>,
        format: ModuleFormat,
    ) -> Option<RewriteDecision> {
        if !abs_entry.is_absolute() {
            return None;
        }

        let rel = forward_slashes(&relative_path(base_dir, abs_entry));
        let prefixed = if rel.starts_with("../") {
            rel
        } else {
            format!("./{rel}")
        };

        let extension = probed.map(str::to_string).or_else(|| {
            abs_entry
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
        });
        let extension = extension.unwrap_or_else(|| format.output_extension().to_string());

        let stem = strip_final_extension(&prefixed);
        let find = stem
            .strip_suffix("/index")
            .map_or_else(|| stem.clone(), str::to_string);

        // a collapse that leaves only dot segments would produce an
        // unloadable path once the extension lands, so the replacement
        // keeps the index file spelled out
        let replace_stem = if is_dot_segments(&find) { &stem } else { &find };
        let replace = format!("{replace_stem}{extension}");

        Some(RewriteDecision { find, replace })
    }
}

/// Strip the extension of the final path segment, leaving dotfiles and
/// extensionless segments untouched.
fn strip_final_extension(path: &str) -> String {
    let seg_start = path.rfind('/').map_or(0, |i| i + 1);
    let segment = &path[seg_start..];
    match segment.rfind('.') {
        Some(dot) if dot > 0 => path[..seg_start + dot].to_string(),
        _ => path.to_string(),
    }
}

fn is_dot_segments(path: &str) -> bool {
    path.split('/').all(|seg| seg == "." || seg == "..")
}
