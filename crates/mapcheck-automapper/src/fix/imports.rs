//! `using` directive insertion.

use mapcheck_core::{TextEdit, TextSize};
use std::collections::BTreeSet;

pub const SYSTEM: &str = "System";
pub const LINQ: &str = "System.Linq";
pub const GENERIC: &str = "System.Collections.Generic";
pub const OBJECT_MODEL: &str = "System.Collections.ObjectModel";
pub const AUTOMAPPER: &str = "AutoMapper";

/// Namespace imported by a `using` directive line, including `global using`.
/// Aliases and `using static` are not namespace imports.
fn imported_namespace(line: &str) -> Option<&str> {
    let line = line.trim();
    let rest = line
        .strip_prefix("global ")
        .map(str::trim_start)
        .unwrap_or(line);
    let rest = rest.strip_prefix("using ")?.trim_start();
    let namespace = rest.strip_suffix(';')?.trim();
    if namespace.is_empty()
        || namespace.starts_with("static ")
        || namespace.contains('=')
        || namespace.contains('(')
    {
        return None;
    }
    Some(namespace)
}

/// Namespaces already imported by `text`.
pub fn existing_imports(text: &str) -> BTreeSet<&str> {
    text.lines().filter_map(imported_namespace).collect()
}

/// One insertion adding every namespace in `required` that `text` does not
/// already import, right after the last `using` directive. Directives are
/// added in sorted order.
pub fn import_edit(text: &str, required: &BTreeSet<String>) -> Option<TextEdit> {
    let existing = existing_imports(text);
    let missing: Vec<&str> = required
        .iter()
        .map(String::as_str)
        .filter(|ns| !existing.contains(ns))
        .collect();
    if missing.is_empty() {
        return None;
    }

    let mut offset = 0usize;
    let mut last_using_end = None;
    for line in text.split_inclusive('\n') {
        offset += line.len();
        if imported_namespace(line).is_some() {
            last_using_end = Some(offset);
        }
    }

    let directives: String = missing
        .iter()
        .map(|ns| format!("using {ns};\n"))
        .collect();
    let edit = match last_using_end {
        Some(end) if text[..end].ends_with('\n') => {
            TextEdit::insert(TextSize::from(end as u32), directives)
        }
        Some(end) => TextEdit::insert(
            TextSize::from(end as u32),
            format!("\n{}", directives.trim_end_matches('\n')),
        ),
        None => TextEdit::insert(TextSize::from(0), format!("{directives}\n")),
    };
    Some(edit)
}
