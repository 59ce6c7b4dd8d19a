//! `relink resolve` command implementation.
//!
//! Runs the same pipeline the rewrite pass runs for a single specifier and
//! prints what it decided, which makes resolution behavior inspectable
//! without touching any chunk file.

use miette::{IntoDiagnostic, Result};
use relink_core::package::{self, locate_boundary};
use relink_core::specifier::{self, Classification};
use relink_core::{
    resolve_entry, resolve_exports, EntryReason, ModuleFormat, ResolutionKind, ResolveContext,
    ResolvedEntry, RewriteDecision,
};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ResolveReportJson {
    ok: bool,
    specifier: String,
    classification: &'static str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    find: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    replace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tried: Vec<String>,
}

/// Run the resolve command.
pub fn run(
    cwd: &Path,
    raw: &str,
    base: Option<&Path>,
    format: ModuleFormat,
    json: bool,
) -> Result<()> {
    let base_dir = base.map_or_else(|| cwd.to_path_buf(), |b| super::absolutize(cwd, b));
    let report = resolve_one(&base_dir, raw, format)?;

    if json {
        println!("{}", serde_json::to_string(&report).into_diagnostic()?);
    } else {
        print_human(&report);
    }

    if !report.ok {
        std::process::exit(1);
    }
    Ok(())
}

fn resolve_one(base_dir: &Path, raw: &str, format: ModuleFormat) -> Result<ResolveReportJson> {
    let classification = specifier::classify(raw);
    let mut report = ResolveReportJson {
        ok: true,
        specifier: raw.to_string(),
        classification: classification_str(classification),
        format: format.as_str(),
        resolved: None,
        package: None,
        find: None,
        replace: None,
        reason: None,
        tried: Vec::new(),
    };

    if classification == Classification::Extensioned {
        report.reason = Some("HAS_EXTENSION");
        return Ok(report);
    }

    let kind = ResolutionKind::from(format);
    let ctx = ResolveContext::new(base_dir, kind);
    let resolution = resolve_entry(&ctx, &specifier::normalize(raw));
    report.tried = resolution
        .tried
        .iter()
        .map(|p| p.display().to_string())
        .collect();

    let (path, probed) = match resolution.entry {
        Some(ResolvedEntry::File { path, probed }) => (path, probed),
        Some(ResolvedEntry::Builtin) => {
            report.reason = Some("BUILTIN");
            return Ok(report);
        }
        None => {
            report.ok = false;
            report.reason = Some(resolution.reason.unwrap_or(EntryReason::NotFound).as_str());
            return Ok(report);
        }
    };
    report.resolved = Some(path.display().to_string());

    let bare = classification == Classification::Bare;
    let decision = match locate_boundary(&path) {
        Some(boundary) if bare && boundary.manifest_path.is_file() => {
            report.package = Some(boundary.name.clone());
            let manifest = package::read_manifest(&boundary.manifest_path).into_diagnostic()?;
            let exported = boundary
                .subpath_request(raw)
                .and_then(|subpath| resolve_exports(&manifest, subpath.as_deref(), kind));
            if exported.is_some() {
                report.reason = Some("EXPORTS_MAP_RESOLVES");
                return Ok(report);
            }
            Some(RewriteDecision::package_owned(raw, &boundary, &path))
        }
        _ => RewriteDecision::project_relative(base_dir, &path, probed, format),
    };

    if let Some(decision) = decision {
        report.find = Some(decision.find);
        report.replace = Some(decision.replace);
    }
    Ok(report)
}

fn classification_str(classification: Classification) -> &'static str {
    match classification {
        Classification::Extensioned => "extensioned",
        Classification::Relative => "relative",
        Classification::Bare => "bare",
    }
}

fn print_human(report: &ResolveReportJson) {
    println!("specifier:      {}", report.specifier);
    println!("classification: {}", report.classification);
    if let Some(resolved) = &report.resolved {
        println!("resolved:       {resolved}");
    }
    if let Some(package) = &report.package {
        println!("package:        {package}");
    }
    match (&report.find, &report.replace) {
        (Some(find), Some(replace)) => println!("rewrite:        '{find}' -> '{replace}'"),
        _ => {
            let reason = report.reason.unwrap_or("NO_REWRITE");
            if report.ok {
                println!("rewrite:        none ({reason})");
            } else {
                println!("error:          {reason}");
                for tried in &report.tried {
                    println!("  tried: {tried}");
                }
            }
        }
    }
}
