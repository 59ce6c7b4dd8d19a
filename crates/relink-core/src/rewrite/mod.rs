//! Textual rewriting of import statements.

mod decision;
mod dynamic;
pub(crate) mod statement;

pub use decision::RewriteDecision;
pub use dynamic::convert_static_import;
pub use statement::replace_specifier;
