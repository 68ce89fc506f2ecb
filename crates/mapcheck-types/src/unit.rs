//! Per-compilation-unit input handed over by the host.

use crate::symbols::TypeId;
use crate::syntax::Expr;
use mapcheck_core::{FileId, TextRange};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub file: FileId,
    pub text: String,
    pub invocations: Vec<MappingInvocation>,
    pub converters: Vec<ConverterDecl>,
}

impl CompilationUnit {
    pub fn new(file: FileId, text: impl Into<String>) -> Self {
        Self {
            file,
            text: text.into(),
            invocations: Vec::new(),
            converters: Vec::new(),
        }
    }
}

/// A candidate mapping declaration: a root call plus the calls chained onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingInvocation {
    /// Type of the receiver the root call binds to (`this` inside a profile,
    /// or the configuration expression parameter). `None` when unresolved.
    pub receiver_type: Option<TypeId>,
    pub method: String,
    pub type_args: Vec<TypeId>,
    pub args: Vec<Expr>,
    /// The root call, e.g. `CreateMap<Source, Destination>()`.
    pub call_range: TextRange,
    /// The root call plus every chained call.
    pub expression_range: TextRange,
    /// The enclosing expression statement, including its `;`.
    pub statement_range: Option<TextRange>,
    pub chain: Vec<ChainedCall>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainedCall {
    pub name: String,
    /// Explicit generic arguments as written (`ConvertUsing<DateConverter>`).
    pub type_args: Vec<String>,
    pub args: Vec<Expr>,
}

impl ChainedCall {
    pub fn new(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            type_args: Vec::new(),
            args,
        }
    }

    pub fn generic(name: impl Into<String>, type_args: Vec<String>, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            type_args,
            args,
        }
    }
}

impl fmt::Display for ChainedCall {
    /// Renders the call with its leading dot, e.g. `.ReverseMap()`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.name)?;
        if !self.type_args.is_empty() {
            write!(f, "<{}>", self.type_args.join(", "))?;
        }
        f.write_str("(")?;
        for (idx, arg) in self.args.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// A type declared in the unit that the host identified as a converter
/// candidate (implements, or is named like, a converter contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConverterDecl {
    pub ty: TypeId,
    pub range: TextRange,
}
