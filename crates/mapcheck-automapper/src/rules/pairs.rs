//! Rules over name-matched member pairs.

use super::{Finding, Rule, RuleContext};
use crate::descriptors::{
    CASE_SENSITIVITY_MISMATCH, COLLECTION_ELEMENT_MISMATCH, COLLECTION_TYPE_INCOMPATIBILITY,
    MISSING_CONVERT_USING, NESTED_OBJECT_MAPPING_MISSING, NON_NULLABLE_TO_NULLABLE,
    NULLABLE_TO_NON_NULLABLE, PROPERTY_TYPE_MISMATCH,
};
use crate::matcher::{MatchKind, MatchedPair};
use crate::shape::{is_assignable, ContainerFamily, TypeDescriptor};
use mapcheck_types::conversions::requires_type_converter;
use mapcheck_types::DiagnosticDescriptor;

/// `member, source type, source member type, destination type, destination member type`.
fn pair_finding(
    cx: &RuleContext<'_>,
    descriptor: &'static DiagnosticDescriptor,
    pair: &MatchedPair,
) -> Finding {
    Finding::for_member(
        descriptor,
        pair.destination.name.clone(),
        vec![
            pair.destination.name.clone(),
            cx.source.name.clone(),
            cx.env.display_ref(pair.source.ty),
            cx.destination.name.clone(),
            cx.env.display_ref(pair.destination.ty),
        ],
    )
}

pub struct TypeMismatchRule;

impl Rule for TypeMismatchRule {
    fn id(&self) -> &'static str {
        PROPERTY_TYPE_MISMATCH.id
    }

    fn check(&self, cx: &RuleContext<'_>, out: &mut Vec<Finding>) {
        for pair in &cx.matches.pairs {
            let source = cx.underlying(pair.source.descriptor);
            let destination = cx.underlying(pair.destination.descriptor);
            // Owned by the collection and nested-mapping rules.
            if source.is_collection() && destination.is_collection() {
                continue;
            }
            if source.is_complex() && destination.is_complex() {
                continue;
            }
            if !cx.is_compatible(source, destination) {
                out.push(pair_finding(cx, &PROPERTY_TYPE_MISMATCH, pair));
            }
        }
    }
}

pub struct NullabilityRule;

impl Rule for NullabilityRule {
    fn id(&self) -> &'static str {
        NULLABLE_TO_NON_NULLABLE.id
    }

    fn check(&self, cx: &RuleContext<'_>, out: &mut Vec<Finding>) {
        for pair in &cx.matches.pairs {
            let source_nullable = pair.source.is_nullable();
            if source_nullable == pair.destination.is_nullable() {
                continue;
            }
            if cx.underlying(pair.destination.descriptor) == TypeDescriptor::Object {
                continue;
            }
            if !cx.is_compatible(pair.source.descriptor, pair.destination.descriptor) {
                continue;
            }
            let descriptor = if source_nullable {
                &NULLABLE_TO_NON_NULLABLE
            } else {
                &NON_NULLABLE_TO_NULLABLE
            };
            out.push(pair_finding(cx, descriptor, pair));
        }
    }
}

/// Container kinds first; element types only once the containers line up.
pub struct CollectionRule;

impl Rule for CollectionRule {
    fn id(&self) -> &'static str {
        COLLECTION_TYPE_INCOMPATIBILITY.id
    }

    fn check(&self, cx: &RuleContext<'_>, out: &mut Vec<Finding>) {
        for pair in &cx.matches.pairs {
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
                continue;
            };
            if !from.converts_to(to) {
                out.push(pair_finding(cx, &COLLECTION_TYPE_INCOMPATIBILITY, pair));
                continue;
            }
            // Dictionaries map entry by entry through their own rules.
            if to.family() == ContainerFamily::Dictionary {
                continue;
            }
            let compatible =
                cx.is_compatible(cx.describe(source_element), cx.describe(destination_element));
            if !compatible {
                out.push(Finding::for_member(
                    &COLLECTION_ELEMENT_MISMATCH,
                    pair.destination.name.clone(),
                    vec![
                        pair.destination.name.clone(),
                        cx.source.name.clone(),
                        cx.display(source_element),
                        cx.destination.name.clone(),
                        cx.display(destination_element),
                    ],
                ));
            }
        }
    }
}

pub struct CaseSensitivityRule;

impl Rule for CaseSensitivityRule {
    fn id(&self) -> &'static str {
        CASE_SENSITIVITY_MISMATCH.id
    }

    fn check(&self, cx: &RuleContext<'_>, out: &mut Vec<Finding>) {
        for pair in &cx.matches.pairs {
            if pair.kind != MatchKind::CaseInsensitiveName {
                continue;
            }
            out.push(Finding::for_member(
                &CASE_SENSITIVITY_MISMATCH,
                pair.destination.name.clone(),
                vec![
                    pair.source.name.clone(),
                    cx.source.name.clone(),
                    pair.destination.name.clone(),
                    cx.destination.name.clone(),
                ],
            ));
        }
    }
}

pub struct NestedMappingRule;

impl Rule for NestedMappingRule {
    fn id(&self) -> &'static str {
        NESTED_OBJECT_MAPPING_MISSING.id
    }

    fn check(&self, cx: &RuleContext<'_>, out: &mut Vec<Finding>) {
        for pair in &cx.matches.pairs {
            let source = cx.underlying(pair.source.descriptor).complex_id();
            let destination = cx.underlying(pair.destination.descriptor).complex_id();
            let (Some(source), Some(destination)) = (source, destination) else {
                continue;
            };
            if source == destination
                || is_assignable(cx.env, source, destination)
                || cx.index.has_mapping(source, destination)
            {
                continue;
            }
            out.push(Finding::for_member(
                &NESTED_OBJECT_MAPPING_MISSING,
                pair.destination.name.clone(),
                vec![
                    pair.destination.name.clone(),
                    cx.display(source),
                    cx.display(destination),
                ],
            ));
        }
    }
}

pub struct MissingConvertUsingRule;

impl Rule for MissingConvertUsingRule {
    fn id(&self) -> &'static str {
        MISSING_CONVERT_USING.id
    }

    fn check(&self, cx: &RuleContext<'_>, out: &mut Vec<Finding>) {
        for pair in &cx.matches.pairs {
            let source = cx.underlying(pair.source.descriptor).special();
            let destination = cx.underlying(pair.destination.descriptor).special();
            let (Some(source), Some(destination)) = (source, destination) else {
                continue;
            };
            if !requires_type_converter(source, destination) {
                continue;
            }
            out.push(Finding::for_member(
                &MISSING_CONVERT_USING,
                pair.destination.name.clone(),
                vec![
                    pair.destination.name.clone(),
                    cx.env.display_ref(pair.source.ty),
                    cx.env.display_ref(pair.destination.ty),
                ],
            ));
        }
    }
}
