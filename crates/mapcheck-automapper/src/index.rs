//! Cross-declaration facts: which pairs are declared, which declarations are
//! superseded duplicates, which take part in a mapping cycle, and which
//! converters are referenced.

use crate::matcher::match_members;
use crate::profile::MappingConfiguration;
use crate::shape::{ShapeArena, TypeDescriptor};
use mapcheck_core::FileId;
use mapcheck_types::{symbols::simple_name, Location, TypeEnv, TypeId};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Identifies a declaration by unit and invocation position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclarationRef {
    pub file: FileId,
    pub invocation: usize,
}

/// A recognized mapping declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub id: DeclarationRef,
    pub config: MappingConfiguration,
    /// Anchor: the `CreateMap` call.
    pub location: Location,
    /// The configuration root the call binds to (the profile type).
    pub receiver_type: Option<TypeId>,
}

type Pair = (TypeId, TypeId);

#[derive(Debug, Default)]
pub struct MappingIndex {
    explicit: HashMap<Pair, Vec<usize>>,
    reverse: HashSet<Pair>,
    superseded: HashSet<usize>,
    cycles: HashMap<usize, Vec<TypeId>>,
    converters: HashSet<String>,
}

impl MappingIndex {
    pub fn build(env: &dyn TypeEnv, declarations: &[Declaration], flattening: bool) -> Self {
        let mut index = MappingIndex::default();
        for (idx, declaration) in declarations.iter().enumerate() {
            let config = &declaration.config;
            index
                .explicit
                .entry((config.source, config.destination))
                .or_default()
                .push(idx);
            if config.reverse_map {
                index.reverse.insert((config.destination, config.source));
            }
            index.converters.extend(
                config
                    .converter_names
                    .iter()
                    .map(|name| simple_name(name).to_string()),
            );
        }
        for indices in index.explicit.values() {
            if let Some((_, earlier)) = indices.split_last() {
                index.superseded.extend(earlier.iter().copied());
            }
        }
        index.cycles = find_cycles(env, declarations, &index, flattening);
        index
    }

    /// Declared anywhere in the analyzed set, directly or through `ReverseMap()`.
    pub fn has_mapping(&self, source: TypeId, destination: TypeId) -> bool {
        self.explicit.contains_key(&(source, destination))
            || self.reverse.contains(&(source, destination))
    }

    /// A later declaration of the same pair replaces this one.
    pub fn is_superseded(&self, declaration: usize) -> bool {
        self.superseded.contains(&declaration)
    }

    /// Source types around the unguarded cycle `declaration` takes part in,
    /// starting and ending with its own source type.
    pub fn cycle(&self, declaration: usize) -> Option<&[TypeId]> {
        self.cycles.get(&declaration).map(Vec::as_slice)
    }

    pub fn is_converter_referenced(&self, name: &str) -> bool {
        self.converters.contains(simple_name(name))
    }

    /// Last-wins lookup of the declaration for a pair.
    fn effective(&self, pair: Pair) -> Option<usize> {
        self.explicit.get(&pair).and_then(|indices| indices.last().copied())
    }
}

struct Node {
    pair: Pair,
    /// Declaration that declares this pair, explicitly or through `ReverseMap()`.
    owner: usize,
    guarded: bool,
}

fn find_cycles(
    env: &dyn TypeEnv,
    declarations: &[Declaration],
    index: &MappingIndex,
    flattening: bool,
) -> HashMap<usize, Vec<TypeId>> {
    // Nodes in a stable order: explicit pairs (last declaration wins), then
    // reverse pairs not declared explicitly.
    let mut nodes: Vec<Node> = Vec::new();
    let mut explicit: BTreeMap<usize, Pair> = BTreeMap::new();
    for (pair, indices) in &index.explicit {
        if let Some(&last) = indices.last() {
            explicit.insert(last, *pair);
        }
    }
    for (owner, pair) in &explicit {
        nodes.push(Node {
            pair: *pair,
            owner: *owner,
            guarded: declarations[*owner].config.has_recursion_guard(),
        });
    }
    for (owner, declaration) in declarations.iter().enumerate() {
        let config = &declaration.config;
        let pair = (config.destination, config.source);
        if config.reverse_map
            && index.effective(pair).is_none()
            && !nodes.iter().any(|node| node.pair == pair)
        {
            nodes.push(Node {
                pair,
                owner,
                guarded: false,
            });
        }
    }
    let by_pair: HashMap<Pair, usize> = nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.pair, idx))
        .collect();

    let mut arena = ShapeArena::new(env);
    let mut edges: Vec<Vec<usize>> = Vec::with_capacity(nodes.len());
    for node in &nodes {
        let mut targets = Vec::new();
        let (Some(source), Some(destination)) =
            (arena.shape(node.pair.0), arena.shape(node.pair.1))
        else {
            edges.push(targets);
            continue;
        };
        let owner = &declarations[node.owner].config;
        let config = if node.pair == (owner.source, owner.destination) {
            if owner.type_converter.is_some() {
                // The converter builds the destination; members are never mapped.
                edges.push(targets);
                continue;
            }
            owner.clone()
        } else {
            MappingConfiguration::new(node.pair.0, node.pair.1)
        };
        let matches = match_members(&mut arena, &source, &destination, &config, flattening);
        for pair in &matches.pairs {
            let inner_source = referenced_type(&mut arena, pair.source.descriptor);
            let inner_destination = referenced_type(&mut arena, pair.destination.descriptor);
            if let (Some(s), Some(d)) = (inner_source, inner_destination) {
                if let Some(&target) = by_pair.get(&(s, d)) {
                    if !targets.contains(&target) {
                        targets.push(target);
                    }
                }
            }
        }
        edges.push(targets);
    }

    let mut cycles = HashMap::new();
    for (start, node) in nodes.iter().enumerate() {
        if cycles.contains_key(&node.owner) {
            continue;
        }
        let Some(path) = shortest_cycle(&edges, start) else {
            continue;
        };
        let component = strongly_connected_with(&edges, start);
        if component.iter().any(|&member| nodes[member].guarded) {
            continue;
        }
        let path: Vec<TypeId> = path.iter().map(|&idx| nodes[idx].pair.0).collect();
        cycles.insert(node.owner, path);
    }
    cycles
}

/// The complex type behind a member: itself, a collection element, or a
/// nullable struct's underlying type.
fn referenced_type(arena: &mut ShapeArena<'_>, descriptor: TypeDescriptor) -> Option<TypeId> {
    match descriptor {
        TypeDescriptor::Reference(id) | TypeDescriptor::Struct(id) => Some(id),
        TypeDescriptor::Collection { element, .. } | TypeDescriptor::Nullable(element) => {
            arena.describe(element).complex_id()
        }
        _ => None,
    }
}

/// Shortest path `start -> .. -> start` through at least one other node.
fn shortest_cycle(edges: &[Vec<usize>], start: usize) -> Option<Vec<usize>> {
    let mut previous: HashMap<usize, usize> = HashMap::new();
    let mut queue = VecDeque::new();
    for &next in &edges[start] {
        if next != start && !previous.contains_key(&next) {
            previous.insert(next, start);
            queue.push_back(next);
        }
    }
    while let Some(current) = queue.pop_front() {
        for &next in &edges[current] {
            if next == start {
                let mut path = vec![start, current];
                let mut cursor = current;
                while let Some(&prev) = previous.get(&cursor) {
                    if prev == start {
                        break;
                    }
                    path.push(prev);
                    cursor = prev;
                }
                path.push(start);
                // Collected back to front, apart from the leading `start`.
                let end = path.len() - 1;
                path[1..end].reverse();
                return Some(path);
            }
            if !previous.contains_key(&next) && next != start {
                previous.insert(next, current);
                queue.push_back(next);
            }
        }
    }
    None
}

fn reachable(edges: &[Vec<usize>], start: usize) -> HashSet<usize> {
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        for &next in &edges[current] {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}

fn strongly_connected_with(edges: &[Vec<usize>], start: usize) -> Vec<usize> {
    reachable(edges, start)
        .into_iter()
        .filter(|&node| reachable(edges, node).contains(&start))
        .collect()
}
