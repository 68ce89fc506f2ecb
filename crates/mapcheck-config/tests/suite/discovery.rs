use mapcheck_config::{
    discover_config_path, load_for_path_with_diagnostics, with_config_env_lock, MapcheckConfig,
    MAPCHECK_CONFIG_ENV_VAR,
};

#[test]
fn config_is_found_in_an_ancestor_directory() {
    let root = tempfile::tempdir().unwrap();
    let nested = root.path().join("src").join("Profiles");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(
        root.path().join("mapcheck.toml"),
        "[analysis]\nmax_linq_nesting = 4\n",
    )
    .unwrap();

    let (config, path, diagnostics) = with_config_env_lock(|| {
        std::env::remove_var(MAPCHECK_CONFIG_ENV_VAR);
        load_for_path_with_diagnostics(&nested).unwrap()
    });
    assert_eq!(path, Some(root.path().join("mapcheck.toml")));
    assert_eq!(config.analysis.max_linq_nesting, 4);
    assert!(diagnostics.is_empty());
}

#[test]
fn nearest_config_wins_and_dotfile_is_a_fallback() {
    let root = tempfile::tempdir().unwrap();
    let nested = root.path().join("app");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(root.path().join("mapcheck.toml"), "").unwrap();
    std::fs::write(nested.join(".mapcheck.toml"), "").unwrap();

    let found = with_config_env_lock(|| {
        std::env::remove_var(MAPCHECK_CONFIG_ENV_VAR);
        discover_config_path(&nested)
    });
    assert_eq!(found, Some(nested.join(".mapcheck.toml")));
}

#[test]
fn env_var_overrides_discovery() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("custom.toml"), "[fixes]\nindent_width = 2\n").unwrap();

    let (config, path, _) = with_config_env_lock(|| {
        std::env::set_var(MAPCHECK_CONFIG_ENV_VAR, "custom.toml");
        let loaded = load_for_path_with_diagnostics(root.path());
        std::env::remove_var(MAPCHECK_CONFIG_ENV_VAR);
        loaded.unwrap()
    });
    assert_eq!(path, Some(root.path().join("custom.toml")));
    assert_eq!(config.fixes.indent_width, 2);
}

#[test]
fn no_config_yields_defaults() {
    let root = tempfile::tempdir().unwrap();
    let (config, path, diagnostics) = with_config_env_lock(|| {
        std::env::remove_var(MAPCHECK_CONFIG_ENV_VAR);
        load_for_path_with_diagnostics(root.path()).unwrap()
    });
    // A config higher up the real filesystem would be picked up here; temp
    // directories do not have one.
    assert_eq!(path, None);
    assert_eq!(config, MapcheckConfig::default());
    assert!(diagnostics.is_empty());
}
