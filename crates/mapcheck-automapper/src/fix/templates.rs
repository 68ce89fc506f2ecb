//! Per-diagnostic fix templates.
//!
//! Each template either produces valid C# for the exact shape it expects or
//! nothing at all.

use super::imports::{AUTOMAPPER, GENERIC, LINQ, OBJECT_MODEL, SYSTEM};
use super::FixParts;
use crate::descriptors::{
    CASE_SENSITIVITY_MISMATCH, COLLECTION_ELEMENT_MISMATCH, COLLECTION_TYPE_INCOMPATIBILITY,
    INDIRECT_RECURSION, MISSING_CONVERT_USING, MISSING_DESTINATION_PROPERTY,
    NESTED_OBJECT_MAPPING_MISSING, NULLABLE_TO_NON_NULLABLE, PROPERTY_TYPE_MISMATCH,
    SELF_REFERENCING_TYPE, UNMAPPED_REQUIRED_PROPERTY,
};
use crate::matcher::MatchedPair;
use crate::rules::RuleContext;
use crate::shape::{ContainerKind, TypeDescriptor};
use mapcheck_config::FixConfig;
use mapcheck_types::conversions::{convert_method, is_numeric_narrowing, is_parsable};
use mapcheck_types::symbols::simple_name;
use mapcheck_types::{
    BinaryOp, ChainedCall, Expr, Literal, SpecialType, TypeId, TypeKind, TypeRef,
};

/// Fix alternatives for one diagnostic, most preferred first.
pub(crate) fn synthesize(
    cx: &RuleContext<'_>,
    name: &str,
    member: Option<&str>,
    fixes: &FixConfig,
) -> Vec<FixParts> {
    let pair = member.and_then(|member| cx.matches.pair(member));
    let parts = match (name, member, pair) {
        (n, _, Some(pair)) if n == COLLECTION_TYPE_INCOMPATIBILITY.name => {
            collection_fix(cx, pair, false)
        }
        (n, _, Some(pair)) if n == COLLECTION_ELEMENT_MISMATCH.name => collection_fix(cx, pair, true),
        (n, _, Some(pair)) if n == PROPERTY_TYPE_MISMATCH.name => scalar_fix(cx, pair),
        (n, _, Some(pair)) if n == NULLABLE_TO_NON_NULLABLE.name => null_coalescing_fix(cx, pair),
        (n, _, Some(pair)) if n == CASE_SENSITIVITY_MISMATCH.name => Some(
            FixParts::new(format!(
                "Map '{}' from '{}' explicitly",
                pair.destination.name, pair.source.name
            ))
            .clause(for_member(&pair.destination.name, map_from(source_read(pair)))),
        ),
        (n, _, Some(pair)) if n == NESTED_OBJECT_MAPPING_MISSING.name => nested_mapping_fix(cx, pair),
        (n, _, Some(pair)) if n == MISSING_CONVERT_USING.name => {
            return convert_using_fixes(cx, pair);
        }
        (n, Some(member), _) if n == MISSING_DESTINATION_PROPERTY.name => Some(
            FixParts::new(format!("Ignore source member '{member}'")).clause(ChainedCall::new(
                "ForSourceMember",
                vec![
                    Expr::lambda("src", Expr::name("src").member(member)),
                    Expr::lambda("opt", Expr::name("opt").call("DoNotValidate", Vec::new())),
                ],
            )),
        ),
        (n, Some(member), _) if n == UNMAPPED_REQUIRED_PROPERTY.name => {
            required_member_fix(cx, member)
        }
        (n, _, _) if n == SELF_REFERENCING_TYPE.name || n == INDIRECT_RECURSION.name => Some(
            FixParts::new(format!("Limit recursion with MaxDepth({})", fixes.suggested_max_depth))
                .clause(ChainedCall::new(
                    "MaxDepth",
                    vec![Expr::int(i64::from(fixes.suggested_max_depth))],
                )),
        ),
        _ => None,
    };
    parts.into_iter().collect()
}

fn for_member(destination: &str, option: Expr) -> ChainedCall {
    ChainedCall::new(
        "ForMember",
        vec![
            Expr::lambda("dest", Expr::name("dest").member(destination)),
            Expr::lambda("opt", option),
        ],
    )
}

/// `opt.MapFrom(src => body)`.
fn map_from(body: Expr) -> Expr {
    Expr::name("opt").call("MapFrom", vec![Expr::lambda("src", body)])
}

/// `src.A.B` along the matched source path.
fn source_read(pair: &MatchedPair) -> Expr {
    pair.source_path
        .iter()
        .fold(Expr::name("src"), |receiver, member| receiver.member(member))
}

fn keyword(cx: &RuleContext<'_>, descriptor: TypeDescriptor, fallback: TypeId) -> String {
    match descriptor.special() {
        Some(special) => special.keyword().to_string(),
        None => cx.display(fallback),
    }
}

/// Id behind `T?` for nullable value types, the id itself otherwise.
fn underlying_id(cx: &RuleContext<'_>, ty: TypeRef) -> TypeId {
    match cx.describe(ty.id) {
        TypeDescriptor::Nullable(inner) => inner,
        _ => ty.id,
    }
}

// AM003 / AM021

fn collection_fix(cx: &RuleContext<'_>, pair: &MatchedPair, element_only: bool) -> Option<FixParts> {
    let (
        TypeDescriptor::Collection {
            container: from,
            element: source_element,
        },
        TypeDescriptor::Collection {
            container: to,
            element: destination_element,
        },
    ) = (pair.source.descriptor, pair.destination.descriptor)
    else {
        return None;
    };
    if from == ContainerKind::Dictionary || to == ContainerKind::Dictionary {
        return None;
    }

    let mut parts = FixParts::new(format!(
        "Convert '{}' to {}",
        pair.destination.name,
        cx.env.display_ref(pair.destination.ty)
    ));
    let source_descriptor = cx.describe(source_element);
    let destination_descriptor = cx.describe(destination_element);
    let mut value = source_read(pair);
    if element_only || !cx.is_compatible(source_descriptor, destination_descriptor) {
        let (projection, imports) = element_conversion(
            cx,
            source_descriptor,
            destination_descriptor,
            destination_element,
            Expr::name("x"),
        )?;
        parts = parts.imports(imports).import(LINQ);
        value = value.call("Select", vec![Expr::lambda("x", projection)]);
    }

    let element = cx.display(destination_element);
    let converted = match to {
        ContainerKind::List | ContainerKind::ListInterface | ContainerKind::Enumerable => {
            parts = parts.import(LINQ);
            value.call("ToList", Vec::new())
        }
        ContainerKind::Array => {
            parts = parts.import(LINQ);
            value.call("ToArray", Vec::new())
        }
        ContainerKind::HashSet | ContainerKind::SetInterface => {
            parts = parts.import(LINQ);
            value.call("ToHashSet", Vec::new())
        }
        ContainerKind::Stack
        | ContainerKind::Queue
        | ContainerKind::SortedSet
        | ContainerKind::LinkedList => {
            parts = parts.import(GENERIC);
            let container = match to {
                ContainerKind::Stack => "Stack",
                ContainerKind::Queue => "Queue",
                ContainerKind::SortedSet => "SortedSet",
                _ => "LinkedList",
            };
            Expr::new_object(format!("{container}<{element}>"), vec![value])
        }
        ContainerKind::ObservableCollection => {
            parts = parts.import(OBJECT_MODEL);
            Expr::new_object(format!("ObservableCollection<{element}>"), vec![value])
        }
        ContainerKind::Collection => {
            parts = parts.import(OBJECT_MODEL).import(LINQ);
            Expr::new_object(
                format!("Collection<{element}>"),
                vec![value.call("ToList", Vec::new())],
            )
        }
        ContainerKind::Custom | ContainerKind::Dictionary => return None,
    };
    Some(parts.clause(for_member(&pair.destination.name, map_from(converted))))
}

/// Per-element conversion of `x`. Complex elements need their own mapping
/// and get nothing.
fn element_conversion(
    cx: &RuleContext<'_>,
    source: TypeDescriptor,
    destination: TypeDescriptor,
    destination_id: TypeId,
    x: Expr,
) -> Option<(Expr, Vec<&'static str>)> {
    let source = cx.underlying(source);
    let target = cx.underlying(destination);
    if source.is_complex() || target.is_complex() || source.is_collection() || target.is_collection() {
        return None;
    }
    let converted = match (source, target) {
        (TypeDescriptor::Primitive(from), TypeDescriptor::Primitive(to))
            if is_numeric_narrowing(from, to) =>
        {
            let method = convert_method(to)?;
            return Some((Expr::name("Convert").call(method, vec![x]), vec![SYSTEM]));
        }
        (TypeDescriptor::String, TypeDescriptor::Enum { ty, .. }) => {
            return Some((
                Expr::name("Enum").call_generic("Parse", vec![cx.display(ty)], vec![x]),
                vec![SYSTEM],
            ));
        }
        (TypeDescriptor::String, TypeDescriptor::Primitive(to) | TypeDescriptor::WellKnownValue(to))
            if is_parsable(to) =>
        {
            Expr::name(to.keyword()).call("Parse", vec![x])
        }
        (from, TypeDescriptor::String) if from.is_value_type() => x.call("ToString", Vec::new()),
        (_, TypeDescriptor::String) => Expr::binary(
            BinaryOp::Coalesce,
            x.conditional_call("ToString", Vec::new()),
            Expr::name("string").member("Empty"),
        ),
        _ => Expr::cast(keyword(cx, destination, destination_id), x),
    };
    Some((converted, Vec::new()))
}

// AM001

fn scalar_fix(cx: &RuleContext<'_>, pair: &MatchedPair) -> Option<FixParts> {
    if pair.source.is_nullable() {
        return None;
    }
    let source = cx.underlying(pair.source.descriptor);
    let target = cx.underlying(pair.destination.descriptor);
    let value = source_read(pair);
    let mut imports = Vec::new();
    let converted = match (source, target) {
        (TypeDescriptor::Primitive(from), TypeDescriptor::Primitive(to))
            if is_numeric_narrowing(from, to) =>
        {
            Expr::cast(cx.env.display_ref(pair.destination.ty), value)
        }
        (TypeDescriptor::String, TypeDescriptor::Primitive(to) | TypeDescriptor::WellKnownValue(to))
            if is_parsable(to) =>
        {
            Expr::name(to.keyword()).call("Parse", vec![value])
        }
        (TypeDescriptor::String, TypeDescriptor::Enum { ty, .. }) => {
            imports.push(SYSTEM);
            Expr::name("Enum").call_generic("Parse", vec![cx.display(ty)], vec![value])
        }
        (
            TypeDescriptor::Primitive(_) | TypeDescriptor::WellKnownValue(_) | TypeDescriptor::Enum { .. },
            TypeDescriptor::String,
        ) => value.call("ToString", Vec::new()),
        (TypeDescriptor::Enum { .. } | TypeDescriptor::Primitive(_), TypeDescriptor::Enum { .. })
        | (TypeDescriptor::Enum { .. }, TypeDescriptor::Primitive(_)) => {
            Expr::cast(cx.env.display_ref(pair.destination.ty), value)
        }
        _ => {
            tracing::debug!(
                target: "mapcheck.automapper",
                member = %pair.destination.name,
                "fix not offered: no scalar conversion template"
            );
            return None;
        }
    };
    Some(
        FixParts::new(format!(
            "Convert '{}' to {}",
            pair.destination.name,
            cx.env.display_ref(pair.destination.ty)
        ))
        .imports(imports)
        .clause(for_member(&pair.destination.name, map_from(converted))),
    )
}

// AM002

fn null_coalescing_fix(cx: &RuleContext<'_>, pair: &MatchedPair) -> Option<FixParts> {
    let (fallback, imports) = default_literal(cx, pair.destination.ty)?;
    let value = Expr::binary(BinaryOp::Coalesce, source_read(pair), fallback);
    Some(
        FixParts::new(format!("Substitute a default for null '{}'", pair.destination.name))
            .imports(imports)
            .clause(for_member(&pair.destination.name, map_from(value))),
    )
}

// AM011

fn required_member_fix(cx: &RuleContext<'_>, member: &str) -> Option<FixParts> {
    let shape = cx.destination.mappable_member(member)?;
    let (literal, imports) = default_literal(cx, shape.ty)?;
    Some(
        FixParts::new(format!("Map required member '{member}' to a default value"))
            .imports(imports)
            .clause(for_member(member, map_from(literal))),
    )
}

/// Kind-appropriate default literal for a destination member type.
fn default_literal(cx: &RuleContext<'_>, ty: TypeRef) -> Option<(Expr, Vec<&'static str>)> {
    let id = underlying_id(cx, ty);
    let literal = match cx.describe(id) {
        TypeDescriptor::String => Expr::string(""),
        TypeDescriptor::Primitive(special) => match special {
            SpecialType::Boolean => Expr::Literal(Literal::Bool(false)),
            SpecialType::Char => Expr::Literal(Literal::Char('\0')),
            SpecialType::Int64 => Expr::number("0L"),
            SpecialType::UInt32 => Expr::number("0U"),
            SpecialType::UInt64 => Expr::number("0UL"),
            SpecialType::Single => Expr::number("0f"),
            SpecialType::Double => Expr::number("0d"),
            SpecialType::Decimal => Expr::number("0m"),
            _ => Expr::number("0"),
        },
        TypeDescriptor::WellKnownValue(special) => {
            let field = match special {
                SpecialType::Guid => "Empty",
                SpecialType::TimeSpan => "Zero",
                _ => "MinValue",
            };
            return Some((Expr::name(special.keyword()).member(field), vec![SYSTEM]));
        }
        TypeDescriptor::Enum { ty, .. } => Expr::cast(cx.display(ty), Expr::number("0")),
        TypeDescriptor::Collection { container, element } => {
            return empty_collection(cx, id, container, element);
        }
        _ => return None,
    };
    Some((literal, Vec::new()))
}

fn empty_collection(
    cx: &RuleContext<'_>,
    id: TypeId,
    container: ContainerKind,
    element: TypeId,
) -> Option<(Expr, Vec<&'static str>)> {
    let element = cx.display(element);
    let (expr, import) = match container {
        ContainerKind::Array => (
            Expr::name("Array").call_generic("Empty", vec![element], Vec::new()),
            SYSTEM,
        ),
        ContainerKind::List | ContainerKind::ListInterface | ContainerKind::Enumerable => {
            (Expr::new_object(format!("List<{element}>"), Vec::new()), GENERIC)
        }
        ContainerKind::HashSet | ContainerKind::SetInterface => {
            (Expr::new_object(format!("HashSet<{element}>"), Vec::new()), GENERIC)
        }
        ContainerKind::Stack
        | ContainerKind::Queue
        | ContainerKind::SortedSet
        | ContainerKind::LinkedList => (Expr::new_object(cx.display(id), Vec::new()), GENERIC),
        ContainerKind::Collection | ContainerKind::ObservableCollection => {
            (Expr::new_object(cx.display(id), Vec::new()), OBJECT_MODEL)
        }
        ContainerKind::Dictionary => {
            let def = cx.env.type_def(id)?;
            let args: Vec<String> = def.type_args.iter().map(|arg| cx.display(*arg)).collect();
            if args.len() != 2 {
                return None;
            }
            let name = if def.kind == TypeKind::Interface {
                format!("Dictionary<{}>", args.join(", "))
            } else {
                cx.display(id)
            };
            (Expr::new_object(name, Vec::new()), GENERIC)
        }
        ContainerKind::Custom => return None,
    };
    Some((expr, vec![import]))
}

// AM020

fn nested_mapping_fix(cx: &RuleContext<'_>, pair: &MatchedPair) -> Option<FixParts> {
    let source = cx.underlying(pair.source.descriptor).complex_id()?;
    let destination = cx.underlying(pair.destination.descriptor).complex_id()?;
    let (source, destination) = (cx.display(source), cx.display(destination));
    let mut parts = FixParts::new(format!("Add CreateMap<{source}, {destination}>()"));
    parts
        .siblings
        .push(format!("CreateMap<{source}, {destination}>();"));
    Some(parts)
}

// AM030 missing ConvertUsing

fn convert_using_fixes(cx: &RuleContext<'_>, pair: &MatchedPair) -> Vec<FixParts> {
    let source = cx.underlying(pair.source.descriptor);
    let target = cx.underlying(pair.destination.descriptor);
    let (Some(source_special), Some(target_special)) = (source.special(), target.special()) else {
        return Vec::new();
    };
    let source_type = cx.env.display_ref(pair.source.ty);
    let target_type = cx.env.display_ref(pair.destination.ty);
    let member = pair.destination.name.as_str();

    // Inline conversion.
    let Some(inline) = conversion_body(
        source_special,
        target_special,
        source_read(pair),
        Expr::Opaque(format!("default({target_type})")),
    ) else {
        return Vec::new();
    };
    let mut inline_parts = FixParts::new(format!("Convert '{member}' inline with MapFrom"))
        .clause(for_member(member, map_from(inline)));
    if target_special != SpecialType::String {
        inline_parts = inline_parts.import(SYSTEM);
    }

    // Named converter, referenced by type or by instance.
    let converter = format!(
        "{}To{}Converter",
        simple_name(source_special.metadata_name()),
        simple_name(target_special.metadata_name())
    );
    let Some(body) = conversion_body(
        source_special,
        target_special,
        Expr::name("sourceMember"),
        Expr::Literal(Literal::Default),
    ) else {
        return vec![inline_parts];
    };
    let class = format!(
        "public class {converter} : IValueConverter<{source_type}, {target_type}>\n{{\n    public {target_type} Convert({source_type} sourceMember, ResolutionContext context)\n    {{\n        return {body};\n    }}\n}}\n"
    );
    let appended = if cx.env.lookup(&converter).is_some() {
        Vec::new()
    } else {
        vec![(converter.clone(), class)]
    };

    let by_type = FixParts {
        appended_types: appended.clone(),
        ..FixParts::new(format!("Convert '{member}' with a new {converter}"))
    }
    .imports([SYSTEM, AUTOMAPPER])
    .clause(for_member(
        member,
        Expr::name("opt").call_generic(
            "ConvertUsing",
            vec![converter.clone(), source_type.clone()],
            vec![Expr::lambda("src", source_read(pair))],
        ),
    ));

    let by_instance = FixParts {
        appended_types: appended,
        ..FixParts::new(format!("Convert '{member}' with a {converter} instance"))
    }
    .imports([SYSTEM, AUTOMAPPER])
    .clause(for_member(
        member,
        Expr::name("opt").call(
            "ConvertUsing",
            vec![
                Expr::new_object(converter, Vec::new()),
                Expr::lambda("src", source_read(pair)),
            ],
        ),
    ));

    vec![inline_parts, by_type, by_instance]
}

/// Null-safe conversion of `value` between a converter-table pair.
/// `fallback` stands in for null or empty strings.
fn conversion_body(
    source: SpecialType,
    target: SpecialType,
    value: Expr,
    fallback: Expr,
) -> Option<Expr> {
    match (source, target) {
        (SpecialType::String, target) if is_parsable(target) => {
            Some(Expr::Conditional {
                condition: Box::new(
                    Expr::name("string").call("IsNullOrEmpty", vec![value.clone()]),
                ),
                when_true: Box::new(fallback),
                when_false: Box::new(Expr::name(target.keyword()).call("Parse", vec![value])),
            })
        }
        (_, SpecialType::String) => Some(value.call("ToString", Vec::new())),
        _ => None,
    }
}
