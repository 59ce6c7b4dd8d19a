//! Specifier resolution: a self-contained Node-style lookup plus
//! module-format variant probing.

mod entry;
mod exports;

pub use entry::{
    resolve_entry, EntryReason, EntryResolution, EntryStatus, ResolveContext, ResolvedEntry,
    PROBE_EXTENSIONS,
};
pub use exports::{resolve_exports, ResolutionKind};
