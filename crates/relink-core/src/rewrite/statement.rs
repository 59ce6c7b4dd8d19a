//! Statement-aware specifier matching and replacement.
//!
//! Instead of regex matching, the chunk text is walked once with a
//! lightweight scanner that recognizes the four statement shapes
//! referencing a specifier: `import ... from '<s>'`, `export ... from
//! '<s>'`, `import('<s>')`, and `require('<s>')`. Comments and unrelated
//! string literals are skipped, so specifier text appearing elsewhere in
//! the code is never touched.

use std::ops::Range;

use crate::scan::ImportKind;

/// One specifier literal found inside a recognized statement shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LiteralSite {
    /// Byte range of the literal contents, quotes excluded.
    pub range: Range<usize>,
    pub kind: ImportKind,
    /// Line number (1-indexed, best-effort).
    pub line: u32,
}

/// Walk the source and collect every specifier literal site in order.
pub(crate) fn walk_import_literals(source: &str) -> Vec<LiteralSite> {
    let mut sites = Vec::new();
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let len = chars.len();
    let mut line: u32 = 1;
    let mut i = 0;

    while i < len {
        let c = chars[i].1;

        if c == '\n' {
            line += 1;
            i += 1;
            continue;
        }

        if c == '/' && i + 1 < len && chars[i + 1].1 == '/' {
            while i < len && chars[i].1 != '\n' {
                i += 1;
            }
            continue;
        }

        if c == '/' && i + 1 < len && chars[i + 1].1 == '*' {
            i += 2;
            while i + 1 < len && !(chars[i].1 == '*' && chars[i + 1].1 == '/') {
                if chars[i].1 == '\n' {
                    line += 1;
                }
                i += 1;
            }
            i += 2;
            continue;
        }

        if matches_keyword(&chars, i, "import") {
            let site_line = line;
            if let Some((kind, range, end)) = scan_import(&chars, source.len(), i + 6, &mut line) {
                sites.push(LiteralSite {
                    range,
                    kind,
                    line: site_line,
                });
                i = end;
                continue;
            }
            i += 1;
            continue;
        }

        if matches_keyword(&chars, i, "export") {
            let site_line = line;
            if let Some((range, end)) = scan_export_from(&chars, i + 6, &mut line, source.len()) {
                sites.push(LiteralSite {
                    range,
                    kind: ImportKind::EsmExport,
                    line: site_line,
                });
                i = end;
                continue;
            }
            i += 1;
            continue;
        }

        if matches_keyword(&chars, i, "require") {
            let site_line = line;
            if let Some((range, end)) = scan_require(&chars, i + 7, &mut line, source.len()) {
                sites.push(LiteralSite {
                    range,
                    kind: ImportKind::CjsRequire,
                    line: site_line,
                });
                i = end;
                continue;
            }
            i += 1;
            continue;
        }

        // any other string literal is opaque
        if is_quote(c) {
            i = skip_string(&chars, i, &mut line);
            continue;
        }

        i += 1;
    }

    sites
}

/// Replace every statement-shaped occurrence of the exact specifier text
/// `find` with `replace`. Returns the rewritten source and the number of
/// replacements made.
#[must_use]
pub fn replace_specifier(source: &str, find: &str, replace: &str) -> (String, usize) {
    let mut ranges: Vec<Range<usize>> = walk_import_literals(source)
        .into_iter()
        .filter(|site| &source[site.range.clone()] == find)
        .map(|site| site.range)
        .collect();

    if ranges.is_empty() {
        return (source.to_string(), 0);
    }

    let count = ranges.len();
    let mut code = source.to_string();
    // splice back to front so earlier ranges stay valid
    ranges.sort_by(|a, b| b.start.cmp(&a.start));
    for range in ranges {
        code.replace_range(range, replace);
    }

    (code, count)
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\'' || c == '`'
}

/// Check if chars at position match a keyword with identifier boundaries
/// on both sides.
fn matches_keyword(chars: &[(usize, char)], pos: usize, keyword: &str) -> bool {
    let kw_len = keyword.len();

    if pos + kw_len > chars.len() {
        return false;
    }

    if pos > 0 && is_ident_char(chars[pos - 1].1) {
        return false;
    }

    for (j, kc) in keyword.chars().enumerate() {
        if chars[pos + j].1 != kc {
            return false;
        }
    }

    if pos + kw_len < chars.len() && is_ident_char(chars[pos + kw_len].1) {
        return false;
    }

    true
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Scan the body of an `import` statement. Handles the dynamic call form,
/// the bare side-effect form, and the binding form with a `from` clause.
fn scan_import(
    chars: &[(usize, char)],
    source_len: usize,
    after_kw: usize,
    line: &mut u32,
) -> Option<(ImportKind, Range<usize>, usize)> {
    let len = chars.len();
    let mut i = skip_whitespace(chars, after_kw, line);

    // dynamic import: import('<spec>')
    if i < len && chars[i].1 == '(' {
        i = skip_whitespace(chars, i + 1, line);
        if i < len && is_quote(chars[i].1) {
            let (range, end) = read_literal(chars, source_len, i, line)?;
            return Some((ImportKind::DynamicImport, range, end));
        }
        return None;
    }

    // side-effect import: import '<spec>'
    if i < len && is_quote(chars[i].1) {
        let (range, end) = read_literal(chars, source_len, i, line)?;
        return Some((ImportKind::EsmImport, range, end));
    }

    // binding form: scan ahead for the from clause, bounded by the
    // statement terminator
    let limit = (after_kw + 1000).min(len);
    let (range, end) = find_from_literal(chars, source_len, i, limit, line)?;
    Some((ImportKind::EsmImport, range, end))
}

/// Scan an `export ... from '<spec>'` statement. Exports without a from
/// clause yield nothing.
fn scan_export_from(
    chars: &[(usize, char)],
    after_kw: usize,
    line: &mut u32,
    source_len: usize,
) -> Option<(Range<usize>, usize)> {
    let limit = (after_kw + 500).min(chars.len());
    find_from_literal(chars, source_len, after_kw, limit, line)
}

/// Scan forward for a `from` keyword and its quoted literal, bounded by
/// the statement terminator: a `;`, or a line break outside any brace
/// list. Strings and comments on the way are skipped, so a `from` inside
/// an unrelated literal never anchors a match.
fn find_from_literal(
    chars: &[(usize, char)],
    source_len: usize,
    start: usize,
    limit: usize,
    line: &mut u32,
) -> Option<(Range<usize>, usize)> {
    let len = chars.len();
    let mut depth: u32 = 0;
    let mut i = start;

    while i < limit {
        let c = chars[i].1;

        if c == ';' || (c == '\n' && depth == 0) {
            break;
        }
        if c == '\n' {
            *line += 1;
            i += 1;
            continue;
        }
        if c == '{' {
            depth += 1;
            i += 1;
            continue;
        }
        if c == '}' {
            depth = depth.saturating_sub(1);
            i += 1;
            continue;
        }
        if c == '/' && i + 1 < len && chars[i + 1].1 == '/' {
            while i < len && chars[i].1 != '\n' {
                i += 1;
            }
            continue;
        }
        if c == '/' && i + 1 < len && chars[i + 1].1 == '*' {
            i += 2;
            while i + 1 < len && !(chars[i].1 == '*' && chars[i + 1].1 == '/') {
                if chars[i].1 == '\n' {
                    *line += 1;
                }
                i += 1;
            }
            i += 2;
            continue;
        }
        if is_quote(c) {
            i = skip_string(chars, i, line);
            continue;
        }
        // inside braces `from` can be a binding name, not the keyword
        if depth == 0 && matches_keyword(chars, i, "from") {
            let j = skip_whitespace(chars, i + 4, line);
            if j < len && is_quote(chars[j].1) {
                return read_literal(chars, source_len, j, line);
            }
        }
        i += 1;
    }

    None
}

/// Scan a `require('<spec>')` call.
fn scan_require(
    chars: &[(usize, char)],
    after_kw: usize,
    line: &mut u32,
    source_len: usize,
) -> Option<(Range<usize>, usize)> {
    let len = chars.len();
    let mut i = skip_whitespace(chars, after_kw, line);

    if i >= len || chars[i].1 != '(' {
        return None;
    }
    i = skip_whitespace(chars, i + 1, line);

    if i < len && is_quote(chars[i].1) {
        return read_literal(chars, source_len, i, line);
    }

    None
}

/// Read a quoted literal starting at the opening quote. Returns the byte
/// range of the contents and the index just past the closing quote, or
/// `None` if the literal never closes.
fn read_literal(
    chars: &[(usize, char)],
    source_len: usize,
    open: usize,
    line: &mut u32,
) -> Option<(Range<usize>, usize)> {
    let quote = chars[open].1;
    let len = chars.len();
    let mut i = open + 1;
    let start_byte = byte_at(chars, source_len, i);

    while i < len && chars[i].1 != quote {
        if chars[i].1 == '\\' && i + 1 < len {
            i += 2;
            continue;
        }
        if chars[i].1 == '\n' {
            *line += 1;
        }
        i += 1;
    }

    if i >= len {
        return None;
    }

    Some((start_byte..chars[i].0, i + 1))
}

/// Skip over a string literal outside any import statement.
fn skip_string(chars: &[(usize, char)], start: usize, line: &mut u32) -> usize {
    let quote = chars[start].1;
    let len = chars.len();
    let mut i = start + 1;

    while i < len {
        let c = chars[i].1;
        if c == '\\' && i + 1 < len {
            i += 2;
            continue;
        }
        if c == quote {
            return i + 1;
        }
        if c == '\n' {
            if quote == '`' {
                *line += 1;
            } else {
                // unterminated single-line string, treat as ended
                return i;
            }
        }
        i += 1;
    }

    len
}

fn skip_whitespace(chars: &[(usize, char)], start: usize, line: &mut u32) -> usize {
    let len = chars.len();
    let mut i = start;
    while i < len && chars[i].1.is_whitespace() {
        if chars[i].1 == '\n' {
            *line += 1;
        }
        i += 1;
    }
    i
}

fn byte_at(chars: &[(usize, char)], source_len: usize, i: usize) -> usize {
    chars.get(i).map_or(source_len, |&(byte, _)| byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_import_from() {
        let source = "import { a } from './util';\n";
        let (code, count) = replace_specifier(source, "./util", "./util.js");
        assert_eq!(code, "import { a } from './util.js';\n");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_replace_export_from() {
        let source = "export * from './util';\n";
        let (code, count) = replace_specifier(source, "./util", "./util.js");
        assert_eq!(code, "export * from './util.js';\n");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_replace_dynamic_import() {
        let source = "const mod = await import('./util');\n";
        let (code, count) = replace_specifier(source, "./util", "./util.js");
        assert_eq!(code, "const mod = await import('./util.js');\n");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_replace_require_call() {
        let source = "const util = require('./util');\n";
        let (code, count) = replace_specifier(source, "./util", "./util.js");
        assert_eq!(code, "const util = require('./util.js');\n");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_replace_side_effect_import() {
        let source = "import './polyfill';\n";
        let (code, count) = replace_specifier(source, "./polyfill", "./polyfill.js");
        assert_eq!(code, "import './polyfill.js';\n");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let source = "import { a } from './x';\nconst b = require('./x');\n";
        let (code, count) = replace_specifier(source, "./x", "./x.js");
        assert_eq!(code, "import { a } from './x.js';\nconst b = require('./x.js');\n");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_exact_match_only() {
        let source = "import { a } from './utils';\n";
        let (code, count) = replace_specifier(source, "./util", "./util.js");
        assert_eq!(code, source);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_unrelated_string_untouched() {
        let source = "const hint = 'see ./util for details';\nimport { a } from './util';\n";
        let (code, count) = replace_specifier(source, "./util", "./util.js");
        assert_eq!(
            code,
            "const hint = 'see ./util for details';\nimport { a } from './util.js';\n"
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn test_plain_assignment_untouched() {
        let source = "const path = './util';\n";
        let (code, count) = replace_specifier(source, "./util", "./util.js");
        assert_eq!(code, source);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_comments_untouched() {
        let source = "// import { a } from './util';\n/* require('./util') */\nimport { a } from './util';\n";
        let (code, count) = replace_specifier(source, "./util", "./util.js");
        assert_eq!(count, 1);
        assert!(code.contains("// import { a } from './util';"));
        assert!(code.contains("/* require('./util') */"));
        assert!(code.contains("from './util.js';"));
    }

    #[test]
    fn test_multiline_named_import() {
        let source = "import {\n  alpha,\n  beta,\n} from './util';\n";
        let (code, count) = replace_specifier(source, "./util", "./util.js");
        assert_eq!(code, "import {\n  alpha,\n  beta,\n} from './util.js';\n");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_double_quotes_and_backticks() {
        let source = "import a from \"./x\";\nconst b = await import(`./x`);\n";
        let (code, count) = replace_specifier(source, "./x", "./x.mjs");
        assert_eq!(code, "import a from \"./x.mjs\";\nconst b = await import(`./x.mjs`);\n");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_keyword_requires_word_boundary() {
        let source = "reimport('./x');\nmyrequire('./x');\n";
        let (code, count) = replace_specifier(source, "./x", "./x.js");
        assert_eq!(code, source);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_export_binding_with_from_inside_string() {
        let source = "export const hint = \"copy from './x' first\";\nimport { a } from './x';\n";
        let (code, count) = replace_specifier(source, "./x", "./x.js");
        assert_eq!(count, 1);
        assert_eq!(
            code,
            "export const hint = \"copy from './x' first\";\nimport { a } from './x.js';\n"
        );
    }

    #[test]
    fn test_object_key_named_import_with_from_inside_string() {
        let source = "const cfg = { import: \"from './x'\" };\nimport { a } from './x';\n";
        let (code, count) = replace_specifier(source, "./x", "./x.js");
        assert_eq!(count, 1);
        assert_eq!(
            code,
            "const cfg = { import: \"from './x'\" };\nimport { a } from './x.js';\n"
        );
    }

    #[test]
    fn test_lookahead_skips_comment_inside_binding_list() {
        let source = "import {\n  a, // from './x'\n  b,\n} from './x';\n";
        let (code, count) = replace_specifier(source, "./x", "./x.js");
        assert_eq!(count, 1);
        assert_eq!(code, "import {\n  a, // from './x'\n  b,\n} from './x.js';\n");
    }

    #[test]
    fn test_unterminated_statement_bounded_at_line_end() {
        let source = "export const a = 1\nimport b from './x'\n";
        let sites = walk_import_literals(source);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].kind, ImportKind::EsmImport);

        let (code, count) = replace_specifier(source, "./x", "./x.js");
        assert_eq!(count, 1);
        assert_eq!(code, "export const a = 1\nimport b from './x.js'\n");
    }

    #[test]
    fn test_from_as_binding_name_inside_braces() {
        let source = "import { from } from './x';\n";
        let (code, count) = replace_specifier(source, "./x", "./x.js");
        assert_eq!(count, 1);
        assert_eq!(code, "import { from } from './x.js';\n");
    }

    #[test]
    fn test_parent_specifier_replacement() {
        let source = "import { root } from '..';\n";
        let (code, count) = replace_specifier(source, "..", "../index.js");
        assert_eq!(code, "import { root } from '../index.js';\n");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_sites_report_kind_and_line() {
        let source = "import a from './a';\nexport { b } from './b';\nrequire('./c');\nimport('./d');\n";
        let sites = walk_import_literals(source);
        assert_eq!(sites.len(), 4);
        assert_eq!(sites[0].kind, ImportKind::EsmImport);
        assert_eq!(sites[0].line, 1);
        assert_eq!(sites[1].kind, ImportKind::EsmExport);
        assert_eq!(sites[1].line, 2);
        assert_eq!(sites[2].kind, ImportKind::CjsRequire);
        assert_eq!(sites[2].line, 3);
        assert_eq!(sites[3].kind, ImportKind::DynamicImport);
        assert_eq!(sites[3].line, 4);
    }
}
