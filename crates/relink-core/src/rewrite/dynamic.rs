//! Conversion of static import statements into dynamically-bound form.
//!
//! Some loading contexts cannot keep a static import after rewriting. The
//! converter takes one statement, substitutes the specifier, and rebinds
//! the imported identifiers through `await import()` with the equivalent
//! destructuring shape. Statements that are already dynamic, and
//! `export ... from` statements, only get their specifier substituted.

use crate::error::Error;
use crate::rewrite::statement::walk_import_literals;
use crate::scan::ImportKind;

/// Rewrite one import statement, converting the static binding forms into
/// an `await import()` equivalent. The specifier literal is replaced with
/// `replace` when it equals `find` exactly, otherwise kept as written.
pub fn convert_static_import(statement: &str, find: &str, replace: &str) -> Result<String, Error> {
    let site = walk_import_literals(statement)
        .into_iter()
        .next()
        .ok_or_else(|| unsupported(statement))?;

    let source = if &statement[site.range.clone()] == find {
        replace.to_string()
    } else {
        statement[site.range.clone()].to_string()
    };

    match site.kind {
        ImportKind::EsmExport | ImportKind::DynamicImport | ImportKind::CjsRequire => {
            let mut out = statement.to_string();
            out.replace_range(site.range, &source);
            Ok(out)
        }
        ImportKind::EsmImport => {
            let quote = statement.as_bytes()[site.range.start - 1] as char;
            let terminator = if statement.trim_end().ends_with(';') { ";" } else { "" };
            let import_pos =
                keyword_position(statement, "import").ok_or_else(|| unsupported(statement))?;
            let clause = &statement[import_pos + 6..site.range.start - 1];

            let binding = match parse_binding_clause(clause) {
                Some(binding) => binding,
                None => return Err(unsupported(statement)),
            };

            let loaded = format!("await import({quote}{source}{quote}){terminator}");
            match binding {
                Binding::None => Ok(loaded),
                Binding::Default(ident) => Ok(format!("const {{ default: {ident} }} = {loaded}")),
                Binding::Named(names) => Ok(format!("const {{ {} }} = {loaded}", names.join(", "))),
                Binding::Star(ident) => Ok(format!("const {ident} = {loaded}")),
            }
        }
    }
}

enum Binding {
    /// Side-effect import with no bound identifiers.
    None,
    Default(String),
    Named(Vec<String>),
    Star(String),
}

/// Parse the text between the `import` keyword and the specifier quote.
/// Returns `None` for shapes that cannot be rebound, such as a default
/// binding combined with a named list.
fn parse_binding_clause(clause: &str) -> Option<Binding> {
    let trimmed = clause.trim_end();

    let Some(before_from) = strip_from_keyword(trimmed) else {
        // no from clause: a side-effect import has only whitespace here
        if trimmed.trim().is_empty() {
            return Some(Binding::None);
        }
        return None;
    };

    let binding = before_from.trim();
    if binding.is_empty() {
        return None;
    }

    if let Some(rest) = binding.strip_prefix('*') {
        let after_as = rest.trim().strip_prefix("as")?;
        if !after_as.starts_with(char::is_whitespace) {
            return None;
        }
        let ident = after_as.trim();
        if is_identifier(ident) {
            return Some(Binding::Star(ident.to_string()));
        }
        return None;
    }

    if let Some(inner) = binding.strip_prefix('{') {
        let inner = inner.strip_suffix('}')?;
        let mut names = Vec::new();
        for entry in inner.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            if let Some((name, alias)) = entry.split_once(" as ") {
                let (name, alias) = (name.trim(), alias.trim());
                if !is_identifier(name) || !is_identifier(alias) {
                    return None;
                }
                names.push(format!("{name}: {alias}"));
            } else if is_identifier(entry) {
                names.push(entry.to_string());
            } else {
                return None;
            }
        }
        if names.is_empty() {
            return None;
        }
        return Some(Binding::Named(names));
    }

    if is_identifier(binding) {
        return Some(Binding::Default(binding.to_string()));
    }

    None
}

/// Strip a trailing word-bounded `from` keyword, returning the binding
/// text before it.
fn strip_from_keyword(text: &str) -> Option<&str> {
    let before = text.strip_suffix("from")?;
    match before.chars().last() {
        None => None,
        Some(c) if is_ident_char(c) => None,
        Some(_) => Some(before),
    }
}

fn keyword_position(text: &str, keyword: &str) -> Option<usize> {
    for (pos, _) in text.match_indices(keyword) {
        let before_ok = pos == 0 || !is_ident_byte(text.as_bytes()[pos - 1]);
        let after = pos + keyword.len();
        let after_ok = after >= text.len() || !is_ident_byte(text.as_bytes()[after]);
        if before_ok && after_ok {
            return Some(pos);
        }
    }
    None
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_ident_char)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn unsupported(statement: &str) -> Error {
    Error::UnsupportedImportShape {
        statement: statement.to_string(),
    }
}
