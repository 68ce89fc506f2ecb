//! Shared analysis types: diagnostics, the host symbol model, and the closed
//! expression grammar used for mapping configuration call chains.

pub mod conversions;
pub mod symbols;
pub mod syntax;
pub mod unit;

pub use symbols::{
    MemberDef, MemberKind, MethodDef, ParamDef, SpecialType, TypeDef, TypeEnv, TypeId, TypeKind,
    TypeRef, TypeStore,
};
pub use syntax::{BinaryOp, Expr, InterpolationPart, LambdaBody, Literal, Pattern, Stmt, UnaryOp};
pub use unit::{ChainedCall, CompilationUnit, ConverterDecl, MappingInvocation};

use mapcheck_core::{FileId, LineCol, TextRange};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one diagnostic kind.
///
/// `message_format` uses positional `{0}`..`{n}` placeholders; `arity` is the
/// number of arguments every diagnostic of this kind carries. Both are part of
/// the public contract and must not change between versions.
#[derive(Debug, PartialEq, Eq)]
pub struct DiagnosticDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub title: &'static str,
    pub message_format: &'static str,
    pub default_severity: Severity,
    pub arity: usize,
}

impl DiagnosticDescriptor {
    pub fn format(&self, args: &[String]) -> String {
        let mut out = String::with_capacity(self.message_format.len() + 32);
        let mut rest = self.message_format;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let placeholder = after
                .find('}')
                .and_then(|close| after[..close].parse::<usize>().ok().map(|idx| (idx, close)));
            match placeholder {
                Some((idx, close)) => {
                    out.push_str(args.get(idx).map(String::as_str).unwrap_or(""));
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: FileId,
    pub range: TextRange,
    pub line_col: LineCol,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: &'static str,
    pub name: &'static str,
    pub severity: Severity,
    pub args: Vec<String>,
    pub message: String,
    pub location: Option<Location>,
}

impl Diagnostic {
    pub fn new(
        descriptor: &'static DiagnosticDescriptor,
        args: Vec<String>,
        location: Option<Location>,
    ) -> Self {
        debug_assert_eq!(args.len(), descriptor.arity, "{}", descriptor.name);
        Self {
            code: descriptor.id,
            name: descriptor.name,
            severity: descriptor.default_severity,
            message: descriptor.format(&args),
            args,
            location,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(
                f,
                "{} {} {}: {}",
                self.code, self.severity, location.line_col, self.message
            ),
            None => write!(f, "{} {}: {}", self.code, self.severity, self.message),
        }
    }
}
