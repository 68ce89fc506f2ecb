use mapcheck_config::json_schema;

#[test]
fn rule_keys_are_constrained_to_rule_ids() {
    let value = serde_json::to_value(json_schema()).expect("schema serializes");
    let pattern = value
        .pointer("/properties/rules/propertyNames/pattern")
        .and_then(|v| v.as_str());
    assert_eq!(pattern, Some("^AM[0-9]{3}$"));
}

#[test]
fn nested_tables_deny_unknown_fields() {
    let value = serde_json::to_value(json_schema()).expect("schema serializes");
    for definition in ["AnalysisConfig", "FixConfig", "LoggingConfig", "RuleConfig"] {
        let additional = value
            .pointer(&format!("/definitions/{definition}/additionalProperties"))
            .and_then(|v| v.as_bool());
        assert_eq!(additional, Some(false), "{definition}");
    }
}

#[test]
fn severity_enum_lists_every_level() {
    let value = serde_json::to_value(json_schema()).expect("schema serializes");
    let severities = value
        .pointer("/definitions/RuleSeverity/enum")
        .cloned()
        .expect("RuleSeverity is a string enum");
    insta::assert_json_snapshot!(severities, @r###"
    [
      "off",
      "info",
      "warning",
      "error"
    ]
    "###);
}
