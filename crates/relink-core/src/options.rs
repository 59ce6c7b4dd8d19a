use serde::{Deserialize, Serialize};

/// Module format of the bundled output being rewritten - decides which
/// export-map conditions apply and which extension is used when no probed
/// variant exists on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    #[default]
    Esm,
    Cjs,
}

impl ModuleFormat {
    /// Extension appended as a last resort when neither an extension probe
    /// nor the resolved file itself supplies one.
    #[must_use]
    pub fn output_extension(&self) -> &'static str {
        match self {
            Self::Esm => ".mjs",
            Self::Cjs => ".js",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Esm => "esm",
            Self::Cjs => "cjs",
        }
    }
}

/// Options for one rewriting pass over a set of chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Target module format of the bundled output.
    pub format: ModuleFormat,
}

impl OutputOptions {
    #[must_use]
    pub fn new(format: ModuleFormat) -> Self {
        Self { format }
    }
}
