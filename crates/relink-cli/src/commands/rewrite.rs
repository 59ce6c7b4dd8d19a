//! `relink rewrite` command implementation.

use miette::{IntoDiagnostic, Result};
use rayon::prelude::*;
use relink_core::{
    transform_chunk, Chunk, Error, ModuleFormat, OutputOptions, Reporter, SpecifierOutcome,
};
use serde::Serialize;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use walkdir::WalkDir;

/// Extensions of files treated as rewritable chunks.
const CHUNK_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx"];

/// Rewrite summary for JSON output.
#[derive(Serialize)]
struct RewriteSummaryJson {
    ok: bool,
    dry_run: bool,
    format: &'static str,
    duration_ms: u64,
    counts: RewriteCountsJson,
    chunks: Vec<ChunkReportJson>,
}

#[derive(Serialize, Default)]
struct RewriteCountsJson {
    chunks: usize,
    chunks_changed: usize,
    chunks_failed: usize,
    rewritten: usize,
    skipped: usize,
    failed: usize,
}

#[derive(Serialize)]
struct ChunkReportJson {
    path: String,
    changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    specifiers: Vec<SpecifierReportJson>,
}

#[derive(Serialize)]
struct SpecifierReportJson {
    specifier: String,
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    find: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    replace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    occurrences: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

struct RecordedOutcome {
    chunk: PathBuf,
    specifier: String,
    outcome: SpecifierOutcome,
}

/// Collects per-specifier outcomes across worker threads.
#[derive(Default)]
struct RecordingReporter {
    events: Mutex<Vec<RecordedOutcome>>,
}

impl Reporter for RecordingReporter {
    fn specifier(&self, chunk: &Path, specifier: &str, outcome: &SpecifierOutcome) {
        if let Ok(mut events) = self.events.lock() {
            events.push(RecordedOutcome {
                chunk: chunk.to_path_buf(),
                specifier: specifier.to_string(),
                outcome: outcome.clone(),
            });
        }
    }
}

struct ChunkOutcome {
    path: PathBuf,
    changed: bool,
    error: Option<String>,
}

/// Run the rewrite command.
pub fn run(
    cwd: &Path,
    paths: &[PathBuf],
    format: ModuleFormat,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let started = Instant::now();
    let files = discover_chunks(cwd, paths)?;
    let options = OutputOptions::new(format);
    let reporter = RecordingReporter::default();

    let outcomes: Vec<ChunkOutcome> = files
        .par_iter()
        .map(|path| match process_chunk(path, &options, &reporter, dry_run) {
            Ok(changed) => ChunkOutcome {
                path: path.clone(),
                changed,
                error: None,
            },
            Err(e) => ChunkOutcome {
                path: path.clone(),
                changed: false,
                error: Some(e.to_string()),
            },
        })
        .collect();

    let events = reporter.events.into_inner().unwrap_or_default();

    let mut counts = RewriteCountsJson {
        chunks: outcomes.len(),
        ..RewriteCountsJson::default()
    };
    let mut chunks = Vec::with_capacity(outcomes.len());
    for outcome in &outcomes {
        let specifiers: Vec<SpecifierReportJson> = events
            .iter()
            .filter(|event| event.chunk == outcome.path)
            .map(|event| specifier_report(&event.specifier, &event.outcome))
            .collect();

        for report in &specifiers {
            match report.action {
                "rewritten" => counts.rewritten += 1,
                "failed" => counts.failed += 1,
                _ => counts.skipped += 1,
            }
        }
        if outcome.changed {
            counts.chunks_changed += 1;
        }
        if outcome.error.is_some() {
            counts.chunks_failed += 1;
        }

        chunks.push(ChunkReportJson {
            path: outcome.path.display().to_string(),
            changed: outcome.changed,
            error: outcome.error.clone(),
            specifiers,
        });
    }

    let duration_ms = started.elapsed().as_millis() as u64;

    if json {
        let summary = RewriteSummaryJson {
            ok: counts.chunks_failed == 0,
            dry_run,
            format: format.as_str(),
            duration_ms,
            counts,
            chunks,
        };
        println!("{}", serde_json::to_string(&summary).into_diagnostic()?);
        if summary.counts.chunks_failed > 0 {
            std::process::exit(1);
        }
        return Ok(());
    }

    for chunk in &chunks {
        if let Some(error) = &chunk.error {
            eprintln!("error: {}: {error}", chunk.path);
        }
        if dry_run {
            for spec in &chunk.specifiers {
                if let (Some(find), Some(replace)) = (&spec.find, &spec.replace) {
                    println!("{}: '{find}' -> '{replace}'", chunk.path);
                }
            }
        }
    }
    println!(
        "{} chunk(s), {} changed: {} import(s) rewritten, {} skipped, {} failed in {duration_ms}ms{}",
        counts.chunks,
        counts.chunks_changed,
        counts.rewritten,
        counts.skipped,
        counts.failed,
        if dry_run { " (dry run)" } else { "" }
    );

    if counts.chunks_failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn process_chunk(
    path: &Path,
    options: &OutputOptions,
    reporter: &RecordingReporter,
    dry_run: bool,
) -> std::result::Result<bool, Error> {
    let code = fs::read_to_string(path)?;
    let chunk = Chunk::from_source(path.to_path_buf(), code);
    let rendered = transform_chunk(&chunk, options, reporter)?;
    let changed = rendered.code != chunk.code;
    if changed && !dry_run {
        fs::write(path, &rendered.code)?;
    }
    Ok(changed)
}

fn specifier_report(specifier: &str, outcome: &SpecifierOutcome) -> SpecifierReportJson {
    match outcome {
        SpecifierOutcome::Rewritten {
            find,
            replace,
            occurrences,
        } => SpecifierReportJson {
            specifier: specifier.to_string(),
            action: "rewritten",
            find: Some(find.clone()),
            replace: Some(replace.clone()),
            occurrences: Some(*occurrences),
            reason: None,
        },
        SpecifierOutcome::Skipped(reason) => SpecifierReportJson {
            specifier: specifier.to_string(),
            action: "skipped",
            find: None,
            replace: None,
            occurrences: None,
            reason: Some(reason.as_str()),
        },
        SpecifierOutcome::Failed { reason } => SpecifierReportJson {
            specifier: specifier.to_string(),
            action: "failed",
            find: None,
            replace: None,
            occurrences: None,
            reason: Some(reason.as_str()),
        },
    }
}

/// Collect chunk files under the given paths, skipping installed
/// dependency trees.
fn discover_chunks(cwd: &Path, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let roots: Vec<PathBuf> = if paths.is_empty() {
        vec![cwd.to_path_buf()]
    } else {
        paths.iter().map(|p| super::absolutize(cwd, p)).collect()
    };

    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            files.push(root);
            continue;
        }
        for entry in WalkDir::new(&root)
            .into_iter()
            .filter_entry(|e| e.file_name() != OsStr::new("node_modules"))
        {
            let entry = entry.into_diagnostic()?;
            if entry.file_type().is_file() && is_chunk_file(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn is_chunk_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| CHUNK_EXTENSIONS.iter().any(|chunk| OsStr::new(chunk) == ext))
}
