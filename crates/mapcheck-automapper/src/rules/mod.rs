//! The rule catalog.
//!
//! Every rule is an independent evaluator over one declaration: it receives the
//! source and destination shapes, the parsed configuration, and the member
//! match, and pushes zero or more [`Finding`]s. Rules never see each other's
//! output; overlapping findings are settled afterwards by
//! [`crate::precedence`].

mod converters;
mod declarations;
mod expensive;
mod members;
mod pairs;

pub use converters::check_converters;
pub use declarations::{DuplicateDeclarationRule, RecursionRule};
pub use expensive::{ExpensiveOperation, ExpensiveResolverRule};
pub use members::{MissingDestinationRule, RequiredMemberRule};
pub use pairs::{
    CaseSensitivityRule, CollectionRule, MissingConvertUsingRule, NestedMappingRule,
    NullabilityRule, TypeMismatchRule,
};

use crate::index::{Declaration, MappingIndex};
use crate::matcher::MemberMatch;
use crate::profile::MappingConfiguration;
use crate::shape::{is_assignable, ShapeArena, TypeDescriptor, TypeShape};
use mapcheck_config::AnalysisConfig;
use mapcheck_types::conversions::has_implicit_numeric_conversion;
use mapcheck_types::{DiagnosticDescriptor, TypeEnv, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

/// A rule's raw output, before severity configuration and precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub descriptor: &'static DiagnosticDescriptor,
    /// Destination member (or orphaned source member) the finding is about.
    pub member: Option<String>,
    pub args: Vec<String>,
}

impl Finding {
    pub fn new(descriptor: &'static DiagnosticDescriptor, args: Vec<String>) -> Self {
        Self {
            descriptor,
            member: None,
            args,
        }
    }

    pub fn for_member(
        descriptor: &'static DiagnosticDescriptor,
        member: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            descriptor,
            member: Some(member.into()),
            args,
        }
    }
}

pub trait Rule: Send + Sync {
    /// Diagnostic id the rule reports under.
    fn id(&self) -> &'static str;

    fn check(&self, cx: &RuleContext<'_>, out: &mut Vec<Finding>);

    /// A type-level `ConvertUsing` replaces member mapping entirely, so most
    /// rules have nothing to say about such declarations.
    fn runs_with_type_converter(&self) -> bool {
        false
    }
}

const MAX_ELEMENT_DEPTH: usize = 8;

/// Everything a rule may look at for one declaration.
pub struct RuleContext<'a> {
    pub env: &'a dyn TypeEnv,
    pub settings: &'a AnalysisConfig,
    /// Position of the declaration in the analyzed set.
    pub declaration_index: usize,
    pub declaration: &'a Declaration,
    pub source: Rc<TypeShape>,
    pub destination: Rc<TypeShape>,
    pub matches: &'a MemberMatch,
    pub index: &'a MappingIndex,
    arena: RefCell<ShapeArena<'a>>,
}

impl<'a> RuleContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        env: &'a dyn TypeEnv,
        settings: &'a AnalysisConfig,
        declaration_index: usize,
        declaration: &'a Declaration,
        source: Rc<TypeShape>,
        destination: Rc<TypeShape>,
        matches: &'a MemberMatch,
        index: &'a MappingIndex,
        arena: ShapeArena<'a>,
    ) -> Self {
        Self {
            env,
            settings,
            declaration_index,
            declaration,
            source,
            destination,
            matches,
            index,
            arena: RefCell::new(arena),
        }
    }

    pub fn config(&self) -> &'a MappingConfiguration {
        &self.declaration.config
    }

    pub fn describe(&self, id: TypeId) -> TypeDescriptor {
        self.arena.borrow_mut().describe(id)
    }

    pub fn shape(&self, id: TypeId) -> Option<Rc<TypeShape>> {
        self.arena.borrow_mut().shape(id)
    }

    /// `Nullable<T>` is looked through; everything else is returned as is.
    pub fn underlying(&self, descriptor: TypeDescriptor) -> TypeDescriptor {
        match descriptor {
            TypeDescriptor::Nullable(inner) => self.describe(inner),
            descriptor => descriptor,
        }
    }

    pub fn display(&self, id: TypeId) -> String {
        self.env.display(id)
    }

    /// Whether the mapper converts `source` into `destination` on its own.
    ///
    /// Complex types count as compatible when identical, assignable, or when a
    /// mapping between them is declared anywhere in the analyzed set.
    pub fn is_compatible(&self, source: TypeDescriptor, destination: TypeDescriptor) -> bool {
        self.compatible_at(source, destination, 0)
    }

    fn compatible_at(
        &self,
        source: TypeDescriptor,
        destination: TypeDescriptor,
        depth: usize,
    ) -> bool {
        let source = self.underlying(source);
        let destination = self.underlying(destination);
        match (source, destination) {
            (_, TypeDescriptor::Object) => true,
            (TypeDescriptor::Unknown, _) | (_, TypeDescriptor::Unknown) => true,
            (TypeDescriptor::String, TypeDescriptor::String) => true,
            (TypeDescriptor::Primitive(from), TypeDescriptor::Primitive(to)) => {
                has_implicit_numeric_conversion(from, to)
            }
            (TypeDescriptor::WellKnownValue(from), TypeDescriptor::WellKnownValue(to)) => {
                from == to
            }
            (TypeDescriptor::Enum { ty: from, .. }, TypeDescriptor::Enum { ty: to, .. }) => {
                from == to
            }
            (TypeDescriptor::Enum { underlying, .. }, TypeDescriptor::Primitive(to)) => {
                underlying == to
            }
            (TypeDescriptor::Primitive(from), TypeDescriptor::Enum { underlying, .. }) => {
                underlying == from
            }
            // By name, both directions.
            (TypeDescriptor::Enum { .. }, TypeDescriptor::String)
            | (TypeDescriptor::String, TypeDescriptor::Enum { .. }) => true,
            (
                TypeDescriptor::Collection {
                    container: from,
                    element: source_element,
                },
                TypeDescriptor::Collection {
                    container: to,
                    element: destination_element,
                },
            ) => {
                // Element types that are their own collections stop here.
                from.converts_to(to)
                    && (depth >= MAX_ELEMENT_DEPTH
                        || self.compatible_at(
                            self.describe(source_element),
                            self.describe(destination_element),
                            depth + 1,
                        ))
            }
            (from, to) => match (from.complex_id(), to.complex_id()) {
                (Some(from), Some(to)) => {
                    from == to
                        || is_assignable(self.env, from, to)
                        || self.index.has_mapping(from, to)
                }
                _ => false,
            },
        }
    }
}

/// Ordered list of rules run against every declaration.
pub struct RuleCatalog {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    /// Run every applicable rule, in catalog order.
    pub fn check(&self, cx: &RuleContext<'_>) -> Vec<Finding> {
        let has_type_converter = cx.config().type_converter.is_some();
        let mut out = Vec::new();
        for rule in &self.rules {
            if has_type_converter && !rule.runs_with_type_converter() {
                continue;
            }
            rule.check(cx, &mut out);
        }
        out
    }
}

impl Default for RuleCatalog {
    /// The built-in catalog.
    fn default() -> Self {
        let mut catalog = Self::new();
        catalog.register(Box::new(TypeMismatchRule));
        catalog.register(Box::new(NullabilityRule));
        catalog.register(Box::new(CollectionRule));
        catalog.register(Box::new(MissingDestinationRule));
        catalog.register(Box::new(CaseSensitivityRule));
        catalog.register(Box::new(RequiredMemberRule));
        catalog.register(Box::new(NestedMappingRule));
        catalog.register(Box::new(RecursionRule));
        catalog.register(Box::new(MissingConvertUsingRule));
        catalog.register(Box::new(ExpensiveResolverRule));
        catalog.register(Box::new(DuplicateDeclarationRule));
        catalog
    }
}
