#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod chunk;
pub mod error;
pub mod options;
pub mod package;
pub mod paths;
pub mod report;
pub mod resolver;
pub mod rewrite;
pub mod scan;
pub mod specifier;
pub mod transform;

pub use chunk::{Chunk, RenderedChunk};
pub use error::Error;
pub use options::{ModuleFormat, OutputOptions};
pub use package::PackageBoundary;
pub use report::{NullReporter, Reporter, SkipReason, SpecifierOutcome};
pub use resolver::{
    resolve_entry, resolve_exports, EntryReason, EntryResolution, EntryStatus, ResolutionKind,
    ResolveContext, ResolvedEntry,
};
pub use rewrite::{convert_static_import, replace_specifier, RewriteDecision};
pub use scan::{scan_imports, ImportKind, ImportSpec};
pub use transform::transform_chunk;
