//! `relink scan` command implementation.

use miette::{IntoDiagnostic, Result};
use relink_core::{scan_imports, ImportSpec};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct ScanSummaryJson {
    ok: bool,
    file: String,
    imports: Vec<ImportJson>,
}

#[derive(Serialize)]
struct ImportJson {
    specifier: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
}

/// Run the scan command.
pub fn run(cwd: &Path, file: &Path, json: bool) -> Result<()> {
    let path = super::absolutize(cwd, file);
    let code = fs::read_to_string(&path).into_diagnostic()?;
    let specs = scan_imports(&code);

    if json {
        let summary = ScanSummaryJson {
            ok: true,
            file: path.display().to_string(),
            imports: specs.iter().map(import_json).collect(),
        };
        println!("{}", serde_json::to_string(&summary).into_diagnostic()?);
        return Ok(());
    }

    for spec in &specs {
        let line = spec.line.map_or_else(|| "?".to_string(), |l| l.to_string());
        println!("{line:>5}  {:<15} {}", spec.kind.as_str(), spec.raw);
    }
    println!("{} import(s) in {}", specs.len(), path.display());
    Ok(())
}

fn import_json(spec: &ImportSpec) -> ImportJson {
    ImportJson {
        specifier: spec.raw.clone(),
        kind: spec.kind.as_str(),
        line: spec.line,
    }
}
