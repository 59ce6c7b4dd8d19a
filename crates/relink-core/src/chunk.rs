use std::path::{Path, PathBuf};

use crate::scan::scan_imports;

/// One bundled output chunk handed to the rewriting pass.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Absolute path of the module this chunk was generated from. Its
    /// parent directory is the base for all relative resolution.
    pub source_path: PathBuf,

    /// Full chunk source text.
    pub code: String,

    /// Specifiers the chunk references, in source order, deduplicated.
    pub imports: Vec<String>,
}

impl Chunk {
    /// Build a chunk from bundler-provided metadata.
    #[must_use]
    pub fn new(source_path: impl Into<PathBuf>, code: impl Into<String>, imports: Vec<String>) -> Self {
        Self {
            source_path: source_path.into(),
            code: code.into(),
            imports,
        }
    }

    /// Build a chunk whose import list is discovered by scanning the code.
    ///
    /// Used when no bundler metadata is available, e.g. when rewriting
    /// already-emitted files on disk.
    #[must_use]
    pub fn from_source(source_path: impl Into<PathBuf>, code: impl Into<String>) -> Self {
        let code = code.into();
        let imports = scan_imports(&code).into_iter().map(|spec| spec.raw).collect();
        Self {
            source_path: source_path.into(),
            code,
            imports,
        }
    }

    /// Directory all relative specifiers in this chunk resolve from.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        self.source_path.parent().unwrap_or(Path::new("/"))
    }
}

/// Result of rewriting one chunk: the updated text plus a position-map
/// slot. The map is always `None` since this pass does not track text
/// positions precisely.
#[derive(Debug, Clone)]
pub struct RenderedChunk {
    pub code: String,
    pub map: Option<String>,
}

impl RenderedChunk {
    #[must_use]
    pub fn new(code: String) -> Self {
        Self { code, map: None }
    }
}
