//! Rules about a declaration as a whole rather than about single members.

use super::{Finding, Rule, RuleContext};
use crate::descriptors::{DUPLICATE_MAPPING_DECLARATION, INDIRECT_RECURSION, SELF_REFERENCING_TYPE};
use crate::profile::OverrideKind;
use crate::shape::{TypeDescriptor, TypeShape};

/// Self-referencing types and mapping cycles spanning several declarations.
pub struct RecursionRule;

impl Rule for RecursionRule {
    fn id(&self) -> &'static str {
        SELF_REFERENCING_TYPE.id
    }

    fn check(&self, cx: &RuleContext<'_>, out: &mut Vec<Finding>) {
        let config = cx.config();
        if config.has_recursion_guard() {
            return;
        }
        let found = self_reference(cx, &cx.source, false)
            .map(|member| (cx.source.name.clone(), member))
            .or_else(|| {
                self_reference(cx, &cx.destination, true)
                    .map(|member| (cx.destination.name.clone(), member))
            });
        if let Some((ty, member)) = found {
            out.push(Finding::for_member(
                &SELF_REFERENCING_TYPE,
                member.clone(),
                vec![
                    ty,
                    member,
                    cx.source.name.clone(),
                    cx.destination.name.clone(),
                ],
            ));
        }

        if let Some(cycle) = cx.index.cycle(cx.declaration_index) {
            let path = cycle
                .iter()
                .map(|ty| cx.display(*ty))
                .collect::<Vec<_>>()
                .join(" -> ");
            out.push(Finding::new(
                &INDIRECT_RECURSION,
                vec![cx.source.name.clone(), cx.destination.name.clone(), path],
            ));
        }
    }
}

/// First member of `shape` whose type (or element type) is `shape` itself.
/// Members the configuration ignores never recurse, and a `MaxDepth` on the
/// member itself limits it.
fn self_reference(cx: &RuleContext<'_>, shape: &TypeShape, destination: bool) -> Option<String> {
    let config = cx.config();
    shape
        .mappable_members()
        .filter(|member| {
            !config.override_for(&member.name).is_some_and(|o| {
                o.max_depth.is_some() || matches!(o.kind, OverrideKind::MaxDepth(_))
            })
        })
        .filter(|member| {
            if destination {
                !config
                    .override_for(&member.name)
                    .is_some_and(|o| o.kind == OverrideKind::Ignore)
            } else {
                !config.ignored_source_members.contains(&member.name)
            }
        })
        .find(|member| {
            let referenced = match cx.underlying(member.descriptor) {
                TypeDescriptor::Collection { element, .. } => {
                    cx.underlying(cx.describe(element)).complex_id()
                }
                descriptor => descriptor.complex_id(),
            };
            referenced == Some(shape.id)
        })
        .map(|member| member.name.clone())
}

/// Reports every declaration a later declaration of the same pair replaces.
pub struct DuplicateDeclarationRule;

impl Rule for DuplicateDeclarationRule {
    fn id(&self) -> &'static str {
        DUPLICATE_MAPPING_DECLARATION.id
    }

    fn check(&self, cx: &RuleContext<'_>, out: &mut Vec<Finding>) {
        if cx.index.is_superseded(cx.declaration_index) {
            out.push(Finding::new(
                &DUPLICATE_MAPPING_DECLARATION,
                vec![cx.source.name.clone(), cx.destination.name.clone()],
            ));
        }
    }

    fn runs_with_type_converter(&self) -> bool {
        true
    }
}
