use mapcheck_config::{init_tracing, LoggingConfig};

#[test]
fn init_tracing_writes_to_the_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapcheck.log");
    let config = LoggingConfig {
        level: "debug".to_string(),
        json: true,
        stderr: false,
        file: Some(path.clone()),
    };

    init_tracing(&config);
    // Second call is a no-op.
    init_tracing(&LoggingConfig::default());

    tracing::debug!(target: "mapcheck.test", declaration = "Source -> Destination", "analyzed");

    let contents = std::fs::read_to_string(&path).unwrap();
    let line = contents
        .lines()
        .find(|line| line.contains("analyzed"))
        .expect("debug event reaches the log file");
    let value: serde_json::Value = serde_json::from_str(line).expect("json log line");
    assert_eq!(value["target"], "mapcheck.test");
    assert_eq!(value["fields"]["declaration"], "Source -> Destination");
}
