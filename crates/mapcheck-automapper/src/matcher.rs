//! Member matching between a source and a destination shape.

use crate::profile::{ExpressionShape, MappingConfiguration, OverrideKind};
use crate::shape::{MemberShape, ShapeArena, TypeShape};
use indexmap::IndexMap;
use mapcheck_types::TypeId;
use std::collections::HashSet;

/// Flattened paths longer than this are not followed (`CustomerAddressCityName`).
const MAX_FLATTENING_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    ExactName,
    CaseInsensitiveName,
    /// `CustomerName` <- `Customer.Name`.
    Flattened,
    ExplicitOverride,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationMatch {
    Resolved {
        /// Source member path; empty when an override supplies no single member.
        source_path: Vec<String>,
        kind: MatchKind,
    },
    Unresolved,
}

impl DestinationMatch {
    pub fn is_name_match(&self) -> bool {
        matches!(
            self,
            DestinationMatch::Resolved {
                kind: MatchKind::ExactName | MatchKind::CaseInsensitiveName | MatchKind::Flattened,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Consumed,
    Orphaned,
}

/// A destination member fed by a source member through name matching.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub destination: MemberShape,
    /// Leaf member on the source side; for flattened matches, the innermost one.
    pub source: MemberShape,
    pub source_path: Vec<String>,
    pub kind: MatchKind,
}

/// Every mappable destination member and every mappable source member appears
/// exactly once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberMatch {
    pub destinations: IndexMap<String, DestinationMatch>,
    pub sources: IndexMap<String, SourceState>,
    pub pairs: Vec<MatchedPair>,
}

impl MemberMatch {
    pub fn destination(&self, name: &str) -> Option<&DestinationMatch> {
        self.destinations.get(name)
    }

    pub fn orphaned_sources(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .filter(|(_, state)| **state == SourceState::Orphaned)
            .map(|(name, _)| name.as_str())
    }

    pub fn pair(&self, destination: &str) -> Option<&MatchedPair> {
        self.pairs
            .iter()
            .find(|pair| pair.destination.name == destination)
    }
}

pub fn match_members(
    arena: &mut ShapeArena<'_>,
    source: &TypeShape,
    destination: &TypeShape,
    config: &MappingConfiguration,
    flattening: bool,
) -> MemberMatch {
    let mut result = MemberMatch::default();
    let mut flattened_roots = HashSet::new();

    for dest in destination.mappable_members() {
        if let Some(member_override) = config.override_for(&dest.name) {
            if member_override.kind.handles_member() {
                let source_path = match &member_override.kind {
                    OverrideKind::ExplicitMapFrom(ExpressionShape::MemberRead(name)) => {
                        vec![name.clone()]
                    }
                    _ => Vec::new(),
                };
                result.destinations.insert(
                    dest.name.clone(),
                    DestinationMatch::Resolved {
                        source_path,
                        kind: MatchKind::ExplicitOverride,
                    },
                );
                continue;
            }
        }
        if config.ignore_all_other && !config.overrides.contains_key(&dest.name) {
            result.destinations.insert(
                dest.name.clone(),
                DestinationMatch::Resolved {
                    source_path: Vec::new(),
                    kind: MatchKind::ExplicitOverride,
                },
            );
            continue;
        }

        let found = find_by_name(source, &dest.name)
            .map(|(member, kind)| (vec![member.name.clone()], member.clone(), kind))
            .or_else(|| {
                if !flattening {
                    return None;
                }
                let mut visited = HashSet::from([source.id]);
                find_flattened(arena, source, &dest.name, 0, &mut visited)
                    .map(|(path, leaf)| (path, leaf, MatchKind::Flattened))
            });

        match found {
            Some((source_path, leaf, kind)) => {
                if kind == MatchKind::Flattened {
                    flattened_roots.insert(source_path[0].clone());
                }
                result.destinations.insert(
                    dest.name.clone(),
                    DestinationMatch::Resolved {
                        source_path: source_path.clone(),
                        kind,
                    },
                );
                result.pairs.push(MatchedPair {
                    destination: dest.clone(),
                    source: leaf,
                    source_path,
                    kind,
                });
            }
            None => {
                result
                    .destinations
                    .insert(dest.name.clone(), DestinationMatch::Unresolved);
            }
        }
    }

    for member in source.mappable_members() {
        let consumed = destination
            .mappable_members()
            .any(|dest| names_match(&dest.name, &member.name))
            || flattened_roots.contains(&member.name)
            || config.ignored_source_members.contains(&member.name)
            || config.referenced_source_members.contains(&member.name);
        let state = if consumed {
            SourceState::Consumed
        } else {
            SourceState::Orphaned
        };
        result.sources.insert(member.name.clone(), state);
    }

    result
}

fn names_match(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Exact name first, then the first case-insensitive match in declaration order.
fn find_by_name<'s>(shape: &'s TypeShape, name: &str) -> Option<(&'s MemberShape, MatchKind)> {
    if let Some(member) = shape.mappable_member(name) {
        return Some((member, MatchKind::ExactName));
    }
    let lowered = name.to_lowercase();
    shape
        .mappable_members()
        .find(|member| member.name.to_lowercase() == lowered)
        .map(|member| (member, MatchKind::CaseInsensitiveName))
}

fn find_flattened(
    arena: &mut ShapeArena<'_>,
    shape: &TypeShape,
    name: &str,
    depth: usize,
    visited: &mut HashSet<TypeId>,
) -> Option<(Vec<String>, MemberShape)> {
    if depth >= MAX_FLATTENING_DEPTH {
        return None;
    }
    for member in shape.mappable_members() {
        let Some(inner_id) = member.descriptor.complex_id() else {
            continue;
        };
        let Some(rest) = strip_prefix_ignore_case(name, &member.name) else {
            continue;
        };
        if rest.is_empty() || !visited.insert(inner_id) {
            continue;
        }
        let Some(inner) = arena.shape(inner_id) else {
            continue;
        };
        if let Some((leaf, _)) = find_by_name(&inner, rest) {
            return Some((vec![member.name.clone(), leaf.name.clone()], leaf.clone()));
        }
        if let Some((mut path, leaf)) = find_flattened(arena, &inner, rest, depth + 1, visited) {
            path.insert(0, member.name.clone());
            return Some((path, leaf));
        }
    }
    None
}

fn strip_prefix_ignore_case<'n>(name: &'n str, prefix: &str) -> Option<&'n str> {
    if name.len() < prefix.len() || !name.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = name.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix).then_some(rest)
}
