pub mod resolve;
pub mod rewrite;
pub mod scan;

use std::path::{Path, PathBuf};

/// Resolve a possibly-relative CLI path argument against the working
/// directory.
pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
