use mapcheck_config::{ConfigError, ConfigWarning, MapcheckConfig, RuleSeverity};
use pretty_assertions::assert_eq;

#[test]
fn empty_config_uses_defaults() {
    let (config, diagnostics) = MapcheckConfig::load_from_str_with_diagnostics("").unwrap();
    assert_eq!(config, MapcheckConfig::default());
    assert!(diagnostics.is_empty());
    assert_eq!(config.analysis.max_linq_nesting, 2);
    assert_eq!(config.fixes.indent_width, 4);
    assert_eq!(config.fixes.suggested_max_depth, 3);
    assert!(config.analysis.flattening);
}

#[test]
fn rule_overrides_deserialize() {
    let text = r#"
[rules.AM005]
severity = "off"

[rules.AM031]
severity = "warn"

[rules.AM004]
enabled = false
"#;
    let (config, diagnostics) = MapcheckConfig::load_from_str_with_diagnostics(text).unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    assert_eq!(config.rule("AM005").unwrap().severity, Some(RuleSeverity::Off));
    assert!(!config.rule("AM005").unwrap().is_active());
    assert_eq!(config.rule("AM031").unwrap().severity, Some(RuleSeverity::Warning));
    assert!(!config.rule("AM004").unwrap().enabled);
    assert!(config.rule("AM001").is_none());
}

#[test]
fn unknown_keys_are_reported_with_full_paths() {
    let text = r#"
[analysis]
flatening = false
max_linq_nesting = 3

[rules.AM001]
sevrity = "info"
"#;
    let (config, diagnostics) = MapcheckConfig::load_from_str_with_diagnostics(text).unwrap();
    assert_eq!(config.analysis.max_linq_nesting, 3);
    assert!(config.analysis.flattening);
    assert_eq!(
        diagnostics.unknown_keys,
        vec!["analysis.flatening".to_string(), "rules.AM001.sevrity".to_string()]
    );
    assert!(diagnostics.is_ok());
}

#[test]
fn semantic_problems_surface_as_diagnostics() {
    let text = r#"
[rules.TypeMismatch]
severity = "error"

[fixes]
indent_width = 0

[logging]
level = "mapcheck=loud"
"#;
    let (_config, diagnostics) = MapcheckConfig::load_from_str_with_diagnostics(text).unwrap();
    assert!(!diagnostics.is_ok());
    assert!(diagnostics.warnings.contains(&ConfigWarning::UnknownRuleId {
        id: "TypeMismatch".to_string()
    }));
    assert!(diagnostics
        .warnings
        .iter()
        .any(|w| matches!(w, ConfigWarning::LoggingLevelInvalid { .. })));
}

#[test]
fn invalid_toml_is_an_error() {
    let err = MapcheckConfig::load_from_str_with_diagnostics("[analysis\nflattening = true")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));

    let err = MapcheckConfig::load_from_str_with_diagnostics("[rules.AM001]\nseverity = \"loud\"")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = MapcheckConfig::load_from_path(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
