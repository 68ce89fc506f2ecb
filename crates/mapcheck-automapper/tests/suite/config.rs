use super::{analyze, analyze_with};
use mapcheck_config::MapcheckConfig;
use mapcheck_test_utils::Fixture;
use mapcheck_types::{MemberDef, Severity, SpecialType};
use pretty_assertions::assert_eq;

/// One case-only match (AM005) and one orphan (AM004).
fn case_and_orphan() -> Fixture {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let source = fixture.class(
        "Source",
        vec![
            MemberDef::property("emailAddress", string),
            MemberDef::property("Notes", string),
        ],
    );
    let destination = fixture.class(
        "Destination",
        vec![MemberDef::property("EmailAddress", string)],
    );
    fixture.create_map(source, destination, Vec::new());
    fixture
}

fn load(text: &str) -> MapcheckConfig {
    let (config, diagnostics) = MapcheckConfig::load_from_str_with_diagnostics(text).unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    config
}

#[test]
fn defaults_report_everything_at_catalog_severity() {
    let analyzed = analyze(&case_and_orphan());
    insta::assert_snapshot!(analyzed.render(), @r###"
    AM004 warning 10:9: Source property 'Notes' on 'Source' has no corresponding property on destination 'Destination' and will not be mapped
    AM005 info 10:9: Source property 'emailAddress' on 'Source' matches destination property 'EmailAddress' on 'Destination' only by case-insensitive name
    "###);
}

#[test]
fn severity_overrides_apply_per_rule_id() {
    let config = load(
        r#"
[rules.AM005]
severity = "error"

[rules.AM004]
severity = "info"
"#,
    );
    let analyzed = analyze_with(&case_and_orphan(), config);
    let severities: Vec<(&str, Severity)> = analyzed
        .result
        .diagnostics
        .iter()
        .map(|d| (d.diagnostic.code, d.diagnostic.severity))
        .collect();
    assert_eq!(
        severities,
        vec![("AM004", Severity::Info), ("AM005", Severity::Error)]
    );
}

#[test]
fn disabled_and_off_rules_are_dropped() {
    let config = load(
        r#"
[rules.AM004]
enabled = false
"#,
    );
    assert_eq!(
        analyze_with(&case_and_orphan(), config).names(),
        vec![("CaseSensitivityMismatch", Some("EmailAddress"))]
    );

    let config = load(
        r#"
[rules.AM005]
severity = "off"
"#,
    );
    assert_eq!(
        analyze_with(&case_and_orphan(), config).names(),
        vec![("MissingDestinationProperty", Some("Notes"))]
    );
}

#[test]
fn disabling_a_rule_leaves_the_finding_it_outranked() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let date = fixture.special(SpecialType::DateTime);
    let source = fixture.class("Source", vec![MemberDef::property("Placed", string)]);
    let destination = fixture.class("Destination", vec![MemberDef::property("Placed", date)]);
    fixture.create_map(source, destination, Vec::new());

    assert_eq!(
        analyze(&fixture).names(),
        vec![("MissingConvertUsing", Some("Placed"))]
    );

    let config = load(
        r#"
[rules.AM030]
severity = "off"
"#,
    );
    let analyzed = analyze_with(&fixture, config);
    assert_eq!(
        analyzed.names(),
        vec![("PropertyTypeMismatch", Some("Placed"))]
    );
    let declaration = analyzed.result.declarations[0].id;
    let fix = analyzed
        .analyzer
        .fix_all(
            &fixture.store,
            std::slice::from_ref(&analyzed.unit),
            declaration,
        )
        .unwrap();
    assert_eq!(fix.code, "AM001");
}

#[test]
fn one_id_covers_every_diagnostic_sharing_it() {
    let mut fixture = Fixture::new();
    let int = fixture.int();
    let nullable = fixture.nullable(int);
    let source = fixture.class(
        "Source",
        vec![
            MemberDef::property("Count", nullable),
            MemberDef::property("Total", int),
        ],
    );
    let destination = fixture.class(
        "Destination",
        vec![
            MemberDef::property("Count", int),
            MemberDef::property("Total", nullable),
        ],
    );
    fixture.create_map(source, destination, Vec::new());

    let analyzed = analyze(&fixture);
    assert_eq!(
        analyzed.names(),
        vec![
            ("NullableToNonNullable", Some("Count")),
            ("NonNullableToNullable", Some("Total")),
        ]
    );

    let config = load(
        r#"
[rules.AM002]
severity = "off"
"#,
    );
    assert_eq!(analyze_with(&fixture, config).render(), "");
}

#[test]
fn suggested_depth_is_configurable() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let node = fixture.class("Node", vec![MemberDef::property("Name", string)]);
    fixture.add_members(node, vec![MemberDef::property("Next", node)]);
    let dto = fixture.class("NodeDto", vec![MemberDef::property("Name", string)]);
    fixture.add_members(dto, vec![MemberDef::property("Next", dto)]);
    fixture.create_map(node, dto, Vec::new());

    let config = load(
        r#"
[fixes]
suggested_max_depth = 5
"#,
    );
    let analyzed = analyze_with(&fixture, config);
    let fixes = analyzed.fixes(&fixture, 0);
    assert_eq!(fixes[0].clauses[0].to_string(), ".MaxDepth(5)");
}
