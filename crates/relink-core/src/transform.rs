//! Chunk transform driver.
//!
//! Walks a chunk's declared imports, resolves each specifier against the
//! chunk's directory, and rewrites the chunk text so every resolvable
//! import names a concrete on-disk file. Specifiers the resolver cannot
//! place are left as written.

use tracing::{debug, warn};

use crate::chunk::{Chunk, RenderedChunk};
use crate::error::Error;
use crate::options::OutputOptions;
use crate::package;
use crate::report::{Reporter, SkipReason, SpecifierOutcome};
use crate::resolver::{self, EntryReason, ResolutionKind, ResolveContext, ResolvedEntry};
use crate::rewrite::{replace_specifier, RewriteDecision};
use crate::specifier;

/// Rewrite every declared import of `chunk`. Per-specifier failures are
/// reported and skipped; an unreadable or malformed manifest of an owning
/// package aborts the chunk.
pub fn transform_chunk(
    chunk: &Chunk,
    options: &OutputOptions,
    reporter: &dyn Reporter,
) -> Result<RenderedChunk, Error> {
    let mut code = chunk.code.clone();
    let kind = ResolutionKind::from(options.format);
    let ctx = ResolveContext::new(chunk.base_dir(), kind);

    for raw in &chunk.imports {
        if specifier::has_known_extension(raw) {
            report(reporter, chunk, raw, SpecifierOutcome::Skipped(SkipReason::HasExtension));
            continue;
        }

        let normalized = specifier::normalize(raw);
        let resolution = resolver::resolve_entry(&ctx, &normalized);

        let (path, probed) = match resolution.entry {
            Some(ResolvedEntry::File { ref path, probed }) => (path.clone(), probed),
            Some(ResolvedEntry::Builtin) => {
                report(reporter, chunk, raw, SpecifierOutcome::Skipped(SkipReason::Builtin));
                continue;
            }
            None => {
                let reason = resolution.reason.unwrap_or(EntryReason::NotFound);
                warn!(
                    specifier = %raw,
                    chunk = %chunk.source_path.display(),
                    reason = %reason,
                    tried = ?resolution.tried,
                    "could not resolve import, leaving it as written"
                );
                report(reporter, chunk, raw, SpecifierOutcome::Failed { reason });
                continue;
            }
        };

        // only a specifier that addressed a package by name may be
        // rewritten to a bare package path; a relative import that lands
        // inside an installed package stays relative
        let bare = specifier::classify(raw) == specifier::Classification::Bare;
        let decision = match package::locate_boundary(&path) {
            Some(boundary) if bare && boundary.manifest_path.is_file() => {
                let manifest = package::read_manifest(&boundary.manifest_path)?;
                let exported = boundary
                    .subpath_request(raw)
                    .and_then(|subpath| resolver::resolve_exports(&manifest, subpath.as_deref(), kind));
                if exported.is_some() {
                    report(
                        reporter,
                        chunk,
                        raw,
                        SpecifierOutcome::Skipped(SkipReason::ExportsMapResolves),
                    );
                    continue;
                }
                Some(RewriteDecision::package_owned(raw, &boundary, &path))
            }
            _ => RewriteDecision::project_relative(chunk.base_dir(), &path, probed, options.format),
        };

        let Some(decision) = decision else {
            report(reporter, chunk, raw, SpecifierOutcome::Skipped(SkipReason::NotRewritable));
            continue;
        };

        let (updated, occurrences) = replace_specifier(&code, &decision.find, &decision.replace);
        if occurrences == 0 {
            report(reporter, chunk, raw, SpecifierOutcome::Skipped(SkipReason::NoMatchInText));
            continue;
        }

        debug!(
            specifier = %raw,
            find = %decision.find,
            replace = %decision.replace,
            occurrences,
            "rewrote import"
        );
        code = updated;
        report(
            reporter,
            chunk,
            raw,
            SpecifierOutcome::Rewritten {
                find: decision.find,
                replace: decision.replace,
                occurrences,
            },
        );
    }

    Ok(RenderedChunk::new(code))
}

fn report(reporter: &dyn Reporter, chunk: &Chunk, specifier: &str, outcome: SpecifierOutcome) {
    reporter.specifier(&chunk.source_path, specifier, &outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NullReporter;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        outcomes: Mutex<Vec<(String, SpecifierOutcome)>>,
    }

    impl Reporter for RecordingReporter {
        fn specifier(&self, _chunk: &Path, specifier: &str, outcome: &SpecifierOutcome) {
            self.outcomes
                .lock()
                .unwrap()
                .push((specifier.to_string(), outcome.clone()));
        }
    }

    impl RecordingReporter {
        fn outcome_for(&self, specifier: &str) -> SpecifierOutcome {
            self.outcomes
                .lock()
                .unwrap()
                .iter()
                .find(|(spec, _)| spec == specifier)
                .map(|(_, outcome)| outcome.clone())
                .expect("no outcome recorded")
        }
    }

    fn write_manifest(dir: &Path, manifest: &serde_json::Value) {
        fs::write(dir.join("package.json"), manifest.to_string()).unwrap();
    }

    fn chunk_at(dir: &Path, code: &str) -> Chunk {
        let path = dir.join("chunk.js");
        fs::write(&path, code).unwrap();
        Chunk::from_source(path, code)
    }

    fn transform(chunk: &Chunk) -> RenderedChunk {
        transform_chunk(chunk, &OutputOptions::default(), &NullReporter).unwrap()
    }

    #[test]
    fn test_relative_import_gains_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("util.js"), "export const a = 1;\n").unwrap();

        let chunk = chunk_at(dir.path(), "import { a } from './util';\n");
        let rendered = transform(&chunk);
        assert_eq!(rendered.code, "import { a } from './util.js';\n");
        assert!(rendered.map.is_none());
    }

    #[test]
    fn test_directory_import_collapses_to_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("util")).unwrap();
        fs::write(dir.path().join("util/index.js"), "export const a = 1;\n").unwrap();

        let chunk = chunk_at(dir.path(), "import { a } from './util';\n");
        let rendered = transform(&chunk);
        assert_eq!(rendered.code, "import { a } from './util.js';\n");
    }

    #[test]
    fn test_mjs_variant_wins_over_fixed_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("util")).unwrap();
        fs::write(dir.path().join("util/index.mjs"), "export const a = 1;\n").unwrap();

        let chunk = chunk_at(dir.path(), "import { a } from './util';\n");
        let rendered = transform(&chunk);
        assert_eq!(rendered.code, "import { a } from './util.mjs';\n");
    }

    #[test]
    fn test_import_and_require_both_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.js"), "module.exports = 1;\n").unwrap();

        let code = "import { a } from './x';\nconst b = require('./x');\n";
        let chunk = chunk_at(dir.path(), code);
        let reporter = RecordingReporter::default();
        let rendered =
            transform_chunk(&chunk, &OutputOptions::default(), &reporter).unwrap();
        assert_eq!(
            rendered.code,
            "import { a } from './x.js';\nconst b = require('./x.js');\n"
        );
        assert!(matches!(
            reporter.outcome_for("./x"),
            SpecifierOutcome::Rewritten { occurrences: 2, .. }
        ));
    }

    #[test]
    fn test_trailing_dot_resolves_parent_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("index.js"), "export const root = 1;\n").unwrap();

        let path = dir.path().join("sub/chunk.js");
        let code = "import { root } from '..';\n";
        fs::write(&path, code).unwrap();
        let chunk = Chunk::from_source(path, code);

        let rendered = transform(&chunk);
        assert_eq!(rendered.code, "import { root } from '../index.js';\n");
    }

    #[test]
    fn test_exports_map_blocks_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/react");
        fs::create_dir_all(&pkg).unwrap();
        write_manifest(
            &pkg,
            &json!({
                "name": "react",
                "exports": {
                    ".": "./index.js",
                    "./jsx-runtime": "./jsx-runtime.js"
                }
            }),
        );
        fs::write(pkg.join("index.js"), "").unwrap();
        fs::write(pkg.join("jsx-runtime.js"), "").unwrap();

        let code = "import { jsx } from 'react/jsx-runtime';\n";
        let chunk = chunk_at(dir.path(), code);
        let reporter = RecordingReporter::default();
        let rendered =
            transform_chunk(&chunk, &OutputOptions::default(), &reporter).unwrap();
        assert_eq!(rendered.code, code);
        assert_eq!(
            reporter.outcome_for("react/jsx-runtime"),
            SpecifierOutcome::Skipped(SkipReason::ExportsMapResolves)
        );
    }

    #[test]
    fn test_package_without_exports_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/lodash");
        fs::create_dir_all(&pkg).unwrap();
        write_manifest(&pkg, &json!({ "name": "lodash", "main": "lodash.js" }));
        fs::write(pkg.join("lodash.js"), "").unwrap();
        fs::write(pkg.join("map.js"), "").unwrap();

        let chunk = chunk_at(dir.path(), "import map from 'lodash/map';\n");
        let rendered = transform(&chunk);
        assert_eq!(rendered.code, "import map from 'lodash/map.js';\n");
    }

    #[test]
    fn test_scoped_package_keeps_two_segment_name() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/@scope/icons");
        fs::create_dir_all(&pkg).unwrap();
        write_manifest(&pkg, &json!({ "name": "@scope/icons" }));
        fs::write(pkg.join("arrow.js"), "").unwrap();

        let chunk = chunk_at(dir.path(), "import arrow from '@scope/icons/arrow';\n");
        let rendered = transform(&chunk);
        assert_eq!(rendered.code, "import arrow from '@scope/icons/arrow.js';\n");
    }

    #[test]
    fn test_extensioned_specifier_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let code = "import { a } from './done.js';\n";
        let chunk = chunk_at(dir.path(), code);
        let reporter = RecordingReporter::default();
        let rendered =
            transform_chunk(&chunk, &OutputOptions::default(), &reporter).unwrap();
        assert_eq!(rendered.code, code);
        assert_eq!(
            reporter.outcome_for("./done.js"),
            SpecifierOutcome::Skipped(SkipReason::HasExtension)
        );
    }

    #[test]
    fn test_unresolvable_import_left_as_written() {
        let dir = tempfile::tempdir().unwrap();
        let code = "import { gone } from './missing';\n";
        let chunk = chunk_at(dir.path(), code);
        let reporter = RecordingReporter::default();
        let rendered =
            transform_chunk(&chunk, &OutputOptions::default(), &reporter).unwrap();
        assert_eq!(rendered.code, code);
        assert!(matches!(
            reporter.outcome_for("./missing"),
            SpecifierOutcome::Failed { .. }
        ));
    }

    #[test]
    fn test_builtins_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let code = "import fs from 'fs';\nimport path from 'node:path';\n";
        let chunk = chunk_at(dir.path(), code);
        let reporter = RecordingReporter::default();
        let rendered =
            transform_chunk(&chunk, &OutputOptions::default(), &reporter).unwrap();
        assert_eq!(rendered.code, code);
        assert_eq!(
            reporter.outcome_for("fs"),
            SpecifierOutcome::Skipped(SkipReason::Builtin)
        );
        assert_eq!(
            reporter.outcome_for("node:path"),
            SpecifierOutcome::Skipped(SkipReason::Builtin)
        );
    }

    #[test]
    fn test_malformed_manifest_aborts_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/broken");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), "{ not json").unwrap();
        fs::write(pkg.join("index.js"), "").unwrap();

        let chunk = chunk_at(dir.path(), "import broken from 'broken';\n");
        let result = transform_chunk(&chunk, &OutputOptions::default(), &NullReporter);
        assert!(matches!(result, Err(Error::ManifestParse { .. })));
    }

    #[test]
    fn test_asset_with_unrecognized_extension_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("styles.css"), "body {}\n").unwrap();

        let code = "import './styles.css';\n";
        let chunk = chunk_at(dir.path(), code);
        let reporter = RecordingReporter::default();
        let rendered =
            transform_chunk(&chunk, &OutputOptions::default(), &reporter).unwrap();
        assert_eq!(rendered.code, code);
        assert_eq!(
            reporter.outcome_for("./styles.css"),
            SpecifierOutcome::Skipped(SkipReason::NoMatchInText)
        );
    }

    #[test]
    fn test_transform_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("util.js"), "export const a = 1;\n").unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/index.js"), "export const b = 2;\n").unwrap();

        let chunk = chunk_at(
            dir.path(),
            "import { a } from './util';\nimport { b } from './lib';\n",
        );
        let first = transform(&chunk);
        assert_eq!(
            first.code,
            "import { a } from './util.js';\nimport { b } from './lib.js';\n"
        );

        let again = Chunk::from_source(dir.path().join("chunk.js"), first.code.clone());
        let second = transform(&again);
        assert_eq!(second.code, first.code);
    }

    #[test]
    fn test_cjs_format_prefers_require_condition() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/dual");
        fs::create_dir_all(&pkg).unwrap();
        write_manifest(
            &pkg,
            &json!({
                "name": "dual",
                "exports": { "require": "./index.cjs" }
            }),
        );
        fs::write(pkg.join("index.cjs"), "").unwrap();

        let code = "const dual = require('dual');\n";
        let path = dir.path().join("chunk.js");
        fs::write(&path, code).unwrap();
        let chunk = Chunk::from_source(path, code);

        let reporter = RecordingReporter::default();
        let options = OutputOptions::new(crate::options::ModuleFormat::Cjs);
        let rendered = transform_chunk(&chunk, &options, &reporter).unwrap();
        assert_eq!(rendered.code, code);
        assert_eq!(
            reporter.outcome_for("dual"),
            SpecifierOutcome::Skipped(SkipReason::ExportsMapResolves)
        );
    }

    #[test]
    fn test_chunk_paths_stay_relative_to_chunk_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("dist/sub")).unwrap();
        fs::create_dir_all(dir.path().join("dist/shared")).unwrap();
        fs::write(dir.path().join("dist/shared/math.js"), "").unwrap();

        let path = dir.path().join("dist/sub/chunk.js");
        let code = "import { add } from '../shared/math';\n";
        fs::write(&path, code).unwrap();
        let chunk = Chunk::from_source(path, code);

        let rendered = transform(&chunk);
        assert_eq!(rendered.code, "import { add } from '../shared/math.js';\n");
    }

    #[test]
    fn test_relative_import_inside_package_stays_relative() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/widgets");
        fs::create_dir_all(&pkg).unwrap();
        write_manifest(
            &pkg,
            &json!({ "name": "widgets", "exports": { ".": "./index.js" } }),
        );
        fs::write(pkg.join("index.js"), "").unwrap();
        fs::write(pkg.join("util.js"), "export const a = 1;\n").unwrap();

        let path = pkg.join("chunk.js");
        let code = "import { a } from './util';\n";
        fs::write(&path, code).unwrap();
        let chunk = Chunk::from_source(path, code);

        let rendered = transform(&chunk);
        assert_eq!(rendered.code, "import { a } from './util.js';\n");
    }

    #[test]
    fn test_relative_source_path_reports_not_rewritable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("util.js"), "export const a = 1;\n").unwrap();

        // a relative chunk path makes every resolved path relative too,
        // which the rewriter refuses to touch
        let cwd = std::env::current_dir().unwrap();
        let rel_dir = crate::paths::relative_path(&cwd, dir.path());
        let code = "import { a } from './util';\n";
        let chunk = Chunk::from_source(rel_dir.join("chunk.js"), code);

        let reporter = RecordingReporter::default();
        let rendered =
            transform_chunk(&chunk, &OutputOptions::default(), &reporter).unwrap();
        assert_eq!(rendered.code, code);
        assert_eq!(
            reporter.outcome_for("./util"),
            SpecifierOutcome::Skipped(SkipReason::NotRewritable)
        );
    }
}
