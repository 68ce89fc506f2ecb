//! Mapping declarations.
//!
//! One `CreateMap` call chain is lowered into a [`MappingConfiguration`]. The
//! chain is walked left to right; recognized calls update the configuration and
//! everything else is skipped, so newer configuration APIs never break analysis.

use crate::shape::inherits_from;
use indexmap::IndexMap;
use mapcheck_types::{
    ChainedCall, Expr, LambdaBody, Literal, MappingInvocation, Stmt, TypeEnv, TypeId,
};
use std::collections::BTreeSet;

pub const PROFILE: &str = "AutoMapper.Profile";
pub const PROFILE_EXPRESSION: &str = "AutoMapper.IProfileExpression";
pub const CONFIGURATION_EXPRESSION: &str = "AutoMapper.IMapperConfigurationExpression";

const CONFIGURATION_ROOTS: [&str; 3] = [PROFILE, PROFILE_EXPRESSION, CONFIGURATION_EXPRESSION];

/// What an explicit `MapFrom` reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionShape {
    /// `src => src.Name` or `MapFrom("Name")`.
    MemberRead(String),
    /// `MapFrom<TResolver>()` or `MapFrom(new TResolver())`.
    Resolver(String),
    /// Any other expression, with the source members it reads.
    Composite { referenced: BTreeSet<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConverterRef {
    /// `ConvertUsing<T>()` or `ConvertUsing(typeof(T))`.
    Type(String),
    /// `ConvertUsing(new T())`.
    Instance(String),
    /// `ConvertUsing(src => ...)`.
    Inline,
}

impl ConverterRef {
    pub fn type_name(&self) -> Option<&str> {
        match self {
            ConverterRef::Type(name) | ConverterRef::Instance(name) => Some(name),
            ConverterRef::Inline => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideKind {
    ExplicitMapFrom(ExpressionShape),
    Ignore,
    ConvertUsing(ConverterRef),
    MaxDepth(u32),
}

impl OverrideKind {
    /// Overrides that give the destination member a value.
    pub fn supplies_value(&self) -> bool {
        matches!(
            self,
            OverrideKind::ExplicitMapFrom(_) | OverrideKind::ConvertUsing(_)
        )
    }

    /// Overrides that take the member out of name matching.
    pub fn handles_member(&self) -> bool {
        !matches!(self, OverrideKind::MaxDepth(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberOverride {
    pub kind: OverrideKind,
    /// `MaxDepth(n)` given alongside a value-supplying option.
    pub max_depth: Option<u32>,
    /// Source lambdas passed to `MapFrom`/`ConvertUsing`, as written.
    pub resolvers: Vec<Expr>,
}

/// One mapping declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingConfiguration {
    pub source: TypeId,
    pub destination: TypeId,
    /// Keyed by destination member name.
    pub overrides: IndexMap<String, MemberOverride>,
    pub ignored_source_members: BTreeSet<String>,
    /// Source members read inside any override body.
    pub referenced_source_members: BTreeSet<String>,
    pub max_depth: Option<u32>,
    pub preserve_references: bool,
    pub type_converter: Option<ConverterRef>,
    pub reverse_map: bool,
    pub ignore_all_other: bool,
    /// Converter type names referenced anywhere in the chain.
    pub converter_names: Vec<String>,
}

impl MappingConfiguration {
    pub fn new(source: TypeId, destination: TypeId) -> Self {
        Self {
            source,
            destination,
            overrides: IndexMap::new(),
            ignored_source_members: BTreeSet::new(),
            referenced_source_members: BTreeSet::new(),
            max_depth: None,
            preserve_references: false,
            type_converter: None,
            reverse_map: false,
            ignore_all_other: false,
            converter_names: Vec::new(),
        }
    }

    pub fn override_for(&self, member: &str) -> Option<&MemberOverride> {
        self.overrides.get(member)
    }

    /// `MaxDepth` or `PreserveReferences` on the mapping itself.
    pub fn has_recursion_guard(&self) -> bool {
        self.max_depth.is_some() || self.preserve_references
    }

    fn set_override(&mut self, member: String, value: MemberOverride) {
        // A later `ForMember` for the same member replaces the earlier one.
        self.overrides.shift_remove(&member);
        self.overrides.insert(member, value);
    }
}

/// Whether `receiver` is a configuration root: derives from `Profile` or
/// implements one of the configuration expression interfaces.
pub fn is_configuration_receiver(env: &dyn TypeEnv, receiver: Option<TypeId>) -> bool {
    receiver.is_some_and(|ty| inherits_from(env, ty, &CONFIGURATION_ROOTS))
}

/// The `(source, destination)` pair a `CreateMap` call declares, in either the
/// generic or the `typeof` form.
pub fn declared_pair(env: &dyn TypeEnv, invocation: &MappingInvocation) -> Option<(TypeId, TypeId)> {
    if invocation.method != "CreateMap" {
        return None;
    }
    match (invocation.type_args.as_slice(), invocation.args.as_slice()) {
        ([source, destination], _) => Some((*source, *destination)),
        ([], [Expr::TypeOf(source), Expr::TypeOf(destination)]) => {
            Some((env.lookup(source)?, env.lookup(destination)?))
        }
        _ => None,
    }
}

/// Lower a candidate invocation. Returns `None` for calls that are not
/// AutoMapper mapping declarations or whose types cannot be resolved.
pub fn parse_declaration(
    env: &dyn TypeEnv,
    invocation: &MappingInvocation,
) -> Option<MappingConfiguration> {
    if !is_configuration_receiver(env, invocation.receiver_type) {
        return None;
    }
    let Some((source, destination)) = declared_pair(env, invocation) else {
        tracing::debug!(
            target: "mapcheck.automapper",
            method = %invocation.method,
            "skipping declaration with unresolved type arguments"
        );
        return None;
    };
    env.type_def(source)?;
    env.type_def(destination)?;

    let mut config = MappingConfiguration::new(source, destination);
    for call in &invocation.chain {
        if call.name == "ReverseMap" {
            // Everything after `ReverseMap()` configures the reverse pair.
            config.reverse_map = true;
            break;
        }
        apply_call(&mut config, call);
    }
    Some(config)
}

fn apply_call(config: &mut MappingConfiguration, call: &ChainedCall) {
    match call.name.as_str() {
        "ForMember" => {
            let (Some(selector), Some(options)) = (call.args.first(), call.args.get(1)) else {
                return;
            };
            let Some(member) = selected_member(selector) else {
                return;
            };
            apply_member_options(config, member, options);
        }
        "ForSourceMember" => {
            let (Some(selector), Some(options)) = (call.args.first(), call.args.get(1)) else {
                return;
            };
            let Some(member) = selected_member(selector) else {
                return;
            };
            let ignored = option_calls(options)
                .iter()
                .any(|(method, _, _)| matches!(*method, "DoNotValidate" | "Ignore"));
            if ignored {
                config.ignored_source_members.insert(member);
            }
        }
        "ForAllOtherMembers" => {
            if let Some(options) = call.args.first() {
                if option_calls(options)
                    .iter()
                    .any(|(method, _, _)| *method == "Ignore")
                {
                    config.ignore_all_other = true;
                }
            }
        }
        "MaxDepth" => {
            config.max_depth = call
                .args
                .first()
                .and_then(Expr::as_int_literal)
                .and_then(|depth| u32::try_from(depth).ok());
        }
        "PreserveReferences" => config.preserve_references = true,
        "ConvertUsing" => {
            let converter = converter_ref(&call.type_args, &call.args);
            if let Some(name) = converter.type_name() {
                config.converter_names.push(name.to_string());
            }
            config.type_converter = Some(converter);
        }
        _ => {}
    }
}

fn apply_member_options(config: &mut MappingConfiguration, member: String, options: &Expr) {
    let mut kind = None;
    let mut max_depth = None;
    let mut resolvers = Vec::new();

    for (method, type_args, args) in option_calls(options) {
        for arg in args {
            record_references(config, arg);
        }
        match method {
            "MapFrom" => {
                kind = Some(OverrideKind::ExplicitMapFrom(map_from_shape(type_args, args)));
                resolvers.extend(args.iter().filter(|arg| arg.as_lambda().is_some()).cloned());
            }
            "Ignore" => kind = Some(OverrideKind::Ignore),
            "ConvertUsing" => {
                let converter = converter_ref(type_args, args);
                if let Some(name) = converter.type_name() {
                    config.converter_names.push(name.to_string());
                }
                kind = Some(OverrideKind::ConvertUsing(converter));
                resolvers.extend(args.iter().filter(|arg| arg.as_lambda().is_some()).cloned());
            }
            "MaxDepth" => {
                max_depth = args
                    .first()
                    .and_then(Expr::as_int_literal)
                    .and_then(|depth| u32::try_from(depth).ok());
            }
            _ => {}
        }
    }

    let kind = match (kind, max_depth) {
        (Some(kind), _) => kind,
        (None, Some(depth)) => OverrideKind::MaxDepth(depth),
        (None, None) => return,
    };
    config.set_override(
        member,
        MemberOverride {
            kind,
            max_depth,
            resolvers,
        },
    );
}

fn map_from_shape(type_args: &[String], args: &[Expr]) -> ExpressionShape {
    match args.first() {
        Some(Expr::Literal(Literal::String(path))) => {
            ExpressionShape::MemberRead(path_root(path).to_string())
        }
        Some(Expr::New { type_name, .. }) => ExpressionShape::Resolver(type_name.clone()),
        Some(Expr::Lambda { params, body }) => {
            let param = params.first().map(String::as_str).unwrap_or_default();
            if let Some(member) = body.result_expr().and_then(|e| e.as_member_read(param)) {
                return ExpressionShape::MemberRead(member.to_string());
            }
            let mut referenced = BTreeSet::new();
            collect_reads(param, body, &mut referenced);
            ExpressionShape::Composite { referenced }
        }
        None if !type_args.is_empty() => ExpressionShape::Resolver(type_args[0].clone()),
        _ => ExpressionShape::Composite {
            referenced: BTreeSet::new(),
        },
    }
}

fn converter_ref(type_args: &[String], args: &[Expr]) -> ConverterRef {
    if let Some(name) = type_args.first() {
        return ConverterRef::Type(name.clone());
    }
    match args.first() {
        Some(Expr::New { type_name, .. }) => ConverterRef::Instance(type_name.clone()),
        Some(Expr::TypeOf(name)) => ConverterRef::Type(name.clone()),
        _ => ConverterRef::Inline,
    }
}

/// `dest => dest.Member` or `"Member"`.
fn selected_member(selector: &Expr) -> Option<String> {
    if let Some(name) = selector.as_string_literal() {
        return Some(name.to_string());
    }
    let (params, body) = selector.as_lambda()?;
    let param = params.first()?;
    body.result_expr()?
        .as_member_read(param)
        .map(str::to_string)
}

fn path_root(path: &str) -> &str {
    path.split('.').next().unwrap_or(path).trim()
}

fn record_references(config: &mut MappingConfiguration, arg: &Expr) {
    if let Some(path) = arg.as_string_literal() {
        config
            .referenced_source_members
            .insert(path_root(path).to_string());
        return;
    }
    if let Some((params, body)) = arg.as_lambda() {
        if let Some(param) = params.first() {
            collect_reads(param, body, &mut config.referenced_source_members);
        }
    }
}

/// Members of `param` read anywhere in `body`, including `param?.Member`.
fn collect_reads(param: &str, body: &LambdaBody, out: &mut BTreeSet<String>) {
    body.walk(&mut |expr| {
        if let Expr::Member { receiver, name, .. } = expr {
            if matches!(receiver.as_ref(), Expr::Name(n) if n == param) {
                out.insert(name.clone());
            }
        }
    });
}

type OptionCall<'e> = (&'e str, &'e [String], &'e [Expr]);

/// The calls made on the option parameter of `opt => ...`, in source order,
/// including fluent chains (`opt.Condition(..).MapFrom(..)`) and statements of
/// a block body.
fn option_calls(options: &Expr) -> Vec<OptionCall<'_>> {
    let mut out = Vec::new();
    let Some((params, body)) = options.as_lambda() else {
        return out;
    };
    let Some(param) = params.first() else {
        return out;
    };
    match body {
        LambdaBody::Expr(expr) => {
            push_option_calls(param, expr, &mut out);
        }
        LambdaBody::Block(stmts) => {
            for stmt in stmts {
                if let Stmt::Expr(expr) = stmt {
                    push_option_calls(param, expr, &mut out);
                }
            }
        }
    }
    out
}

/// Returns whether `expr` is a call chain rooted at `param`.
fn push_option_calls<'e>(param: &str, expr: &'e Expr, out: &mut Vec<OptionCall<'e>>) -> bool {
    let Expr::Call {
        receiver: Some(receiver),
        method,
        type_args,
        args,
        ..
    } = expr
    else {
        return false;
    };
    let rooted = match receiver.as_ref() {
        Expr::Name(name) => name == param,
        inner => push_option_calls(param, inner, out),
    };
    if rooted {
        out.push((method.as_str(), type_args.as_slice(), args.as_slice()));
    }
    rooted
}
