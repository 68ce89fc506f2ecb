use super::{analyze, analyze_with};
use mapcheck_config::MapcheckConfig;
use mapcheck_test_utils::{for_member, ignore, map_from, src, Fixture};
use mapcheck_types::{ChainedCall, Expr, MemberDef, SpecialType};
use pretty_assertions::assert_eq;

#[test]
fn orphaned_source_members_are_reported_once_each() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let source = fixture.class(
        "Source",
        vec![
            MemberDef::property("Name", string),
            MemberDef::property("Notes", string),
            MemberDef::property("Internal", string),
        ],
    );
    let destination = fixture.class("Destination", vec![MemberDef::property("Name", string)]);
    fixture.create_map(source, destination, Vec::new());

    let analyzed = analyze(&fixture);
    insta::assert_snapshot!(analyzed.render(), @r###"
    AM004 warning 10:9: Source property 'Notes' on 'Source' has no corresponding property on destination 'Destination' and will not be mapped
    AM004 warning 10:9: Source property 'Internal' on 'Source' has no corresponding property on destination 'Destination' and will not be mapped
    "###);
}

#[test]
fn source_members_read_by_overrides_are_consumed() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let source = fixture.class(
        "Source",
        vec![
            MemberDef::property("First", string),
            MemberDef::property("Last", string),
        ],
    );
    let destination = fixture.class("Destination", vec![MemberDef::property("FullName", string)]);
    let full_name = Expr::binary(
        mapcheck_types::BinaryOp::Add,
        Expr::binary(mapcheck_types::BinaryOp::Add, src("First"), Expr::string(" ")),
        src("Last"),
    );
    fixture.create_map(
        source,
        destination,
        vec![for_member("FullName", map_from(full_name))],
    );

    assert_eq!(analyze(&fixture).render(), "");
}

#[test]
fn do_not_validate_suppresses_the_orphan() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let source = fixture.class(
        "Source",
        vec![
            MemberDef::property("Name", string),
            MemberDef::property("Notes", string),
        ],
    );
    let destination = fixture.class("Destination", vec![MemberDef::property("Name", string)]);
    fixture.create_map(
        source,
        destination,
        vec![ChainedCall::new(
            "ForSourceMember",
            vec![
                Expr::lambda("src", src("Notes")),
                Expr::lambda("opt", Expr::name("opt").call("DoNotValidate", Vec::new())),
            ],
        )],
    );

    assert_eq!(analyze(&fixture).render(), "");
}

#[test]
fn required_members_without_a_source() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let int = fixture.int();
    let source = fixture.class("Source", vec![MemberDef::property("Name", string)]);
    let destination = fixture.class(
        "Destination",
        vec![
            MemberDef::property("Name", string),
            MemberDef::property("Code", string).required(),
            MemberDef::property("Optional", int),
        ],
    );
    fixture.create_map(source, destination, Vec::new());

    let analyzed = analyze(&fixture);
    insta::assert_snapshot!(
        analyzed.render(),
        @"AM011 error 10:9: Required destination property 'Code' on 'Destination' is not mapped from source 'Source'"
    );
}

#[test]
fn default_value_fix_round_trips() {
    fn build(chain: Vec<ChainedCall>) -> Fixture {
        let mut fixture = Fixture::new();
        let string = fixture.string();
        let source = fixture.class("Source", vec![MemberDef::property("Name", string)]);
        let destination = fixture.class(
            "Destination",
            vec![
                MemberDef::property("Name", string),
                MemberDef::property("Code", string).required(),
            ],
        );
        fixture.create_map(source, destination, chain);
        fixture
    }

    let fixture = build(Vec::new());
    let analyzed = analyze(&fixture);
    let fixes = analyzed.fixes(&fixture, 0);
    assert_eq!(fixes[0].title, "Map required member 'Code' to a default value");

    let fixed = build(vec![for_member("Code", map_from(Expr::string("")))]);
    assert_eq!(
        fixes[0].apply(&analyzed.unit.text).unwrap(),
        fixed.unit().text
    );
    assert_eq!(analyze(&fixed).render(), "");
}

#[test]
fn ignoring_a_required_member_does_not_fill_it() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let source = fixture.class("Source", vec![MemberDef::property("Name", string)]);
    let destination = fixture.class(
        "Destination",
        vec![
            MemberDef::property("Name", string),
            MemberDef::property("Code", string).required(),
        ],
    );
    fixture.create_map(source, destination, vec![for_member("Code", ignore())]);

    let analyzed = analyze(&fixture);
    assert_eq!(
        analyzed.names(),
        vec![("UnmappedRequiredProperty", Some("Code"))]
    );
}

#[test]
fn required_member_default_literals_follow_the_member_kind() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let int = fixture.int();
    let long = fixture.special(SpecialType::Int64);
    let flag = fixture.special(SpecialType::Boolean);
    let id = fixture.special(SpecialType::Guid);
    let status = fixture.enumeration("Status");
    let tags = fixture.list_of(string);
    let members = [
        ("Code", string, "\"\""),
        ("Count", int, "0"),
        ("Total", long, "0L"),
        ("Active", flag, "false"),
        ("Id", id, "Guid.Empty"),
        ("State", status, "(Status)0"),
        ("Tags", tags, "new List<string>()"),
    ];
    let source = fixture.class("Source", Vec::new());
    let destination = fixture.class(
        "Destination",
        members
            .iter()
            .map(|(name, ty, _)| MemberDef::property(*name, *ty).required())
            .collect(),
    );
    fixture.create_map(source, destination, Vec::new());

    let analyzed = analyze(&fixture);
    assert_eq!(analyzed.result.diagnostics.len(), members.len());
    for (idx, (name, _, literal)) in members.iter().enumerate() {
        let fixes = analyzed.fixes(&fixture, idx);
        assert_eq!(
            fixes[0].clauses[0].to_string(),
            format!(".ForMember(dest => dest.{name}, opt => opt.MapFrom(src => {literal}))")
        );
    }
}

#[test]
fn required_complex_members_get_no_fix() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let address = fixture.class("Address", vec![MemberDef::property("City", string)]);
    let source = fixture.class("Source", Vec::new());
    let destination = fixture.class(
        "Destination",
        vec![MemberDef::property("Address", address).required()],
    );
    fixture.create_map(source, destination, Vec::new());

    let analyzed = analyze(&fixture);
    assert_eq!(
        analyzed.names(),
        vec![("UnmappedRequiredProperty", Some("Address"))]
    );
    assert!(analyzed.fixes(&fixture, 0).is_empty());
}

#[test]
fn flattened_members_consume_their_root() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let customer = fixture.class("Customer", vec![MemberDef::property("Name", string)]);
    let order = fixture.class("Order", vec![MemberDef::property("Customer", customer)]);
    let order_dto = fixture.class(
        "OrderDto",
        vec![MemberDef::property("CustomerName", string)],
    );
    fixture.create_map(order, order_dto, Vec::new());

    assert_eq!(analyze(&fixture).render(), "");

    let mut config = MapcheckConfig::default();
    config.analysis.flattening = false;
    let analyzed = analyze_with(&fixture, config);
    assert_eq!(
        analyzed.names(),
        vec![("MissingDestinationProperty", Some("Customer"))]
    );
}

#[test]
fn inherited_members_take_part_in_matching() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let int = fixture.int();
    let entity = fixture.class("Entity", vec![MemberDef::property("Id", int)]);
    let source = fixture.derived_class("Product", entity, vec![MemberDef::property("Name", string)]);
    let destination = fixture.class(
        "ProductDto",
        vec![
            MemberDef::property("Id", int),
            MemberDef::property("Name", string),
        ],
    );
    fixture.create_map(source, destination, Vec::new());

    assert_eq!(analyze(&fixture).render(), "");
}

#[test]
fn for_all_other_members_ignore() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let int = fixture.int();
    let source = fixture.class("Source", vec![MemberDef::property("Name", string)]);
    let destination = fixture.class(
        "Destination",
        vec![
            MemberDef::property("Name", int),
            MemberDef::property("Other", string),
        ],
    );
    fixture.create_map(
        source,
        destination,
        vec![ChainedCall::new(
            "ForAllOtherMembers",
            vec![Expr::lambda("opt", ignore())],
        )],
    );

    assert_eq!(analyze(&fixture).render(), "");
}
