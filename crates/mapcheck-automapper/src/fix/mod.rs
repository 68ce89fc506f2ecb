//! Fix synthesis.
//!
//! A fix extends a declaration's call chain with override clauses inserted
//! right after the `CreateMap` call, one per line. Fixes compose: when several
//! are applied to one declaration, the clause synthesized last ends up nearest
//! the call. Besides the chain rewrite a fix may add `using` directives, a
//! sibling `CreateMap` statement, or a converter class at the end of the file;
//! all of these are separate edits, and a fix whose edits would collide is
//! not offered.

pub mod imports;
mod templates;

pub(crate) use templates::synthesize;

use mapcheck_core::{
    apply_text_edits, slice, EditError, EditSet, FileId, LineIndex, TextEdit, TextRange, TextSize,
};
use mapcheck_types::{ChainedCall, CompilationUnit, MappingInvocation};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fix {
    pub title: String,
    /// Id of the diagnostic the fix addresses.
    pub code: &'static str,
    pub file: FileId,
    /// The declaration expression, `CreateMap` call through the last chained call.
    pub range: TextRange,
    /// Rewritten text for `range`.
    pub replacement: String,
    /// Clauses added to the chain, in the order they were synthesized.
    pub clauses: Vec<ChainedCall>,
    pub required_imports: BTreeSet<String>,
    /// Every edit the fix makes, the chain rewrite included.
    pub edits: Vec<TextEdit>,
}

impl Fix {
    pub fn apply(&self, text: &str) -> Result<String, EditError> {
        apply_text_edits(text, &self.edits)
    }
}

/// What one fix alternative contributes, before it is turned into edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FixParts {
    pub title: String,
    pub clauses: Vec<ChainedCall>,
    pub imports: BTreeSet<String>,
    /// Statements placed after the declaration's statement, e.g. `CreateMap<A, B>();`.
    pub siblings: Vec<String>,
    /// Types appended to the end of the file, by name.
    pub appended_types: Vec<(String, String)>,
}

impl FixParts {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn clause(mut self, clause: ChainedCall) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn import(mut self, namespace: &str) -> Self {
        self.imports.insert(namespace.to_string());
        self
    }

    pub fn imports(mut self, namespaces: impl IntoIterator<Item = &'static str>) -> Self {
        self.imports
            .extend(namespaces.into_iter().map(str::to_string));
        self
    }

    /// Fold `later` into `self`, as if it had been synthesized after `self`.
    pub fn merge(&mut self, later: FixParts) {
        self.clauses.extend(later.clauses);
        self.imports.extend(later.imports);
        for sibling in later.siblings {
            if !self.siblings.contains(&sibling) {
                self.siblings.push(sibling);
            }
        }
        for (name, text) in later.appended_types {
            if !self.appended_types.iter().any(|(existing, _)| *existing == name) {
                self.appended_types.push((name, text));
            }
        }
    }
}

/// Turn parts into edits against the unit text. Returns `None` when the
/// declaration's text does not have the shape the edits assume.
pub(crate) fn build(
    unit: &CompilationUnit,
    invocation: &MappingInvocation,
    code: &'static str,
    parts: FixParts,
    indent_width: usize,
) -> Option<Fix> {
    let text = unit.text.as_str();
    let call = invocation.call_range;
    let expression = invocation.expression_range;
    if !expression.contains_range(call) || call.start() != expression.start() {
        tracing::debug!(target: "mapcheck.automapper", ?call, ?expression, "fix not offered: unexpected ranges");
        return None;
    }
    let expression_text = slice(text, expression)?;
    if !slice(text, call)?.contains("CreateMap") {
        tracing::debug!(target: "mapcheck.automapper", ?call, "fix not offered: call text is not CreateMap");
        return None;
    }

    let line_index = LineIndex::new(text);
    let declaration_indent = line_index.indentation(text, call.start());
    let clause_indent = format!("{declaration_indent}{}", " ".repeat(indent_width));

    let mut edits = EditSet::new();

    let split = u32::from(call.end() - expression.start()) as usize;
    let inserted: String = parts
        .clauses
        .iter()
        .rev()
        .map(|clause| format!("\n{clause_indent}{clause}"))
        .collect();
    let replacement = format!(
        "{}{}{}",
        &expression_text[..split],
        inserted,
        &expression_text[split..]
    );
    if !parts.clauses.is_empty() {
        add(&mut edits, TextEdit::new(expression, replacement.clone()))?;
    }

    if !parts.siblings.is_empty() {
        let statement = invocation.statement_range?;
        if !statement.contains_range(expression) {
            return None;
        }
        // `cfg.CreateMap<..>()` keeps its receiver in the sibling.
        let receiver = slice(text, TextRange::new(statement.start(), call.start()))?;
        if !receiver
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            tracing::debug!(target: "mapcheck.automapper", receiver, "fix not offered: unsupported receiver");
            return None;
        }
        let siblings: String = parts
            .siblings
            .iter()
            .map(|sibling| format!("\n{declaration_indent}{receiver}{sibling}"))
            .collect();
        add(&mut edits, TextEdit::insert(statement.end(), siblings))?;
    }

    let mut appended = String::new();
    for (_, ty) in &parts.appended_types {
        if appended.is_empty() && !text.ends_with('\n') {
            appended.push('\n');
        }
        appended.push('\n');
        appended.push_str(ty);
    }
    if !appended.is_empty() {
        add(&mut edits, TextEdit::insert(TextSize::of(text), appended))?;
    }

    if let Some(edit) = imports::import_edit(text, &parts.imports) {
        add(&mut edits, edit)?;
    }

    Some(Fix {
        title: parts.title,
        code,
        file: unit.file,
        range: expression,
        replacement,
        clauses: parts.clauses,
        required_imports: parts.imports,
        edits: edits.into_edits(),
    })
}

fn add(edits: &mut EditSet, edit: TextEdit) -> Option<()> {
    edits
        .push(edit)
        .map_err(|err| {
            tracing::debug!(target: "mapcheck.automapper", %err, "fix not offered: conflicting edits");
        })
        .ok()
}
