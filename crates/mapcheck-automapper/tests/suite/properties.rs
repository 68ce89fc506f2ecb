use super::analyze;
use mapcheck_test_utils::Fixture;
use mapcheck_types::{MemberDef, SpecialType, TypeId};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};

const PROPTEST_CASES: u32 = 64;
const NAMES: &[&str] = &["Id", "Name", "Total", "Active", "Tags", "Notes", "Code"];

#[derive(Debug, Clone, Copy)]
enum Kind {
    String,
    Int,
    Long,
    Bool,
    StringList,
    IntList,
}

fn arb_kind() -> impl Strategy<Value = Kind> {
    prop::sample::select(vec![
        Kind::String,
        Kind::Int,
        Kind::Long,
        Kind::Bool,
        Kind::StringList,
        Kind::IntList,
    ])
}

fn arb_members() -> impl Strategy<Value = BTreeMap<&'static str, Kind>> {
    prop::collection::btree_map(prop::sample::select(NAMES), arb_kind(), 0..=NAMES.len())
}

fn ty(fixture: &mut Fixture, kind: Kind) -> TypeId {
    match kind {
        Kind::String => fixture.string(),
        Kind::Int => fixture.int(),
        Kind::Long => fixture.special(SpecialType::Int64),
        Kind::Bool => fixture.special(SpecialType::Boolean),
        Kind::StringList => {
            let string = fixture.string();
            fixture.list_of(string)
        }
        Kind::IntList => {
            let int = fixture.int();
            fixture.list_of(int)
        }
    }
}

fn class(fixture: &mut Fixture, name: &str, members: &BTreeMap<&'static str, Kind>) -> TypeId {
    let defs = members
        .iter()
        .map(|(member, kind)| MemberDef::property(*member, ty(fixture, *kind)))
        .collect();
    fixture.class(name, defs)
}

fn fixture_for(
    source: &BTreeMap<&'static str, Kind>,
    destination: &BTreeMap<&'static str, Kind>,
    chain: Vec<mapcheck_types::ChainedCall>,
) -> Fixture {
    let mut fixture = Fixture::new();
    let source = class(&mut fixture, "Source", source);
    let destination = class(&mut fixture, "Destination", destination);
    fixture.create_map(source, destination, chain);
    fixture
}

/// A kind the mapper converts `kind` into once the offered fix is applied.
fn convertible(kind: Kind, pick: usize) -> Kind {
    match kind {
        Kind::String | Kind::Int | Kind::Long => [Kind::String, Kind::Int, Kind::Long][pick % 3],
        Kind::Bool => Kind::Bool,
        Kind::StringList | Kind::IntList => [Kind::StringList, Kind::IntList][pick % 2],
    }
}

/// A source shape and a destination made of some of its members, each kept
/// as is or changed to a kind every fix template covers.
fn arb_fixable_pair(
) -> impl Strategy<Value = (BTreeMap<&'static str, Kind>, BTreeMap<&'static str, Kind>)> {
    arb_members()
        .prop_flat_map(|source| {
            let picks = prop::collection::vec((any::<bool>(), 0usize..3), source.len());
            (Just(source), picks)
        })
        .prop_map(|(source, picks)| {
            let destination = source
                .iter()
                .zip(picks)
                .filter(|(_, (keep, _))| *keep)
                .map(|((name, kind), (_, pick))| (*name, convertible(*kind, pick)))
                .collect();
            (source, destination)
        })
}

const PAIR_FAMILY: &[&str] = &[
    "PropertyTypeMismatch",
    "NullableToNonNullable",
    "NonNullableToNullable",
    "CollectionTypeIncompatibility",
    "CollectionElementMismatch",
    "CaseSensitivityMismatch",
    "NestedObjectMappingMissing",
    "MissingConvertUsing",
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

    #[test]
    fn at_most_one_pair_finding_per_member(
        source in arb_members(),
        destination in arb_members(),
    ) {
        let fixture = fixture_for(&source, &destination, Vec::new());
        let analyzed = analyze(&fixture);

        let mut seen = HashSet::new();
        for (name, member) in analyzed.names() {
            let member = member.expect("every declaration diagnostic here names a member");
            prop_assert!(source.contains_key(member) || destination.contains_key(member));
            if PAIR_FAMILY.contains(&name) {
                prop_assert!(seen.insert(member.to_string()), "{member} reported twice");
            }
        }
    }

    #[test]
    fn fix_all_clears_orphans_and_conversions(
        (source, destination) in arb_fixable_pair(),
    ) {
        let fixture = fixture_for(&source, &destination, Vec::new());
        let analyzed = analyze(&fixture);
        let declaration = analyzed.result.declarations[0].id;
        let fix = analyzed.analyzer.fix_all(
            &fixture.store,
            std::slice::from_ref(&analyzed.unit),
            declaration,
        );
        let Some(fix) = fix else {
            prop_assert_eq!(analyzed.render(), "");
            return Ok(());
        };

        // The rendered chain matches what the fix inserted: newest clause first.
        let chain = fix.clauses.iter().rev().cloned().collect();
        let mut fixed = fixture_for(&source, &destination, chain);
        let mut usings = vec!["AutoMapper", "System"];
        let missing: Vec<&str> = fix
            .required_imports
            .iter()
            .map(String::as_str)
            .filter(|ns| !usings.contains(ns))
            .collect();
        usings.extend(missing);
        fixed.usings(&usings);
        prop_assert_eq!(fix.apply(&analyzed.unit.text).unwrap(), fixed.unit().text);
        prop_assert_eq!(analyze(&fixed).render(), "");
    }
}
