//! Scenario file parsing and validation

use fifoq_core::{ActorConfig, DelaySpec, Error, ScenarioConfig};

#[test]
fn test_parse_scenario_yaml() {
    let yaml = r#"
capacity: 5
producers:
  - label: "first"
    delay: { fixed_ms: 1000 }
  - label: "burst"
    delay: { min_ms: 50, max_ms: 400 }
    max_items: 100
consumers:
  - label: "consumer1"
    delay: { fixed_ms: 500 }
"#;

    let cfg = ScenarioConfig::from_yaml(yaml).expect("parse");
    cfg.validate().expect("valid");
    assert_eq!(cfg.capacity, 5);
    assert_eq!(cfg.producers[0], ActorConfig::new("first", DelaySpec::fixed(1000)));
    assert_eq!(
        cfg.producers[1],
        ActorConfig::new("burst", DelaySpec::uniform(50, 400)).with_max_items(100)
    );
    assert_eq!(cfg.consumers.len(), 1);
}

#[test]
fn test_actor_lists_default_to_empty() {
    let cfg = ScenarioConfig::from_yaml("capacity: 1\n").unwrap();
    assert!(cfg.producers.is_empty());
    assert!(cfg.consumers.is_empty());
    cfg.validate().unwrap();
}

#[test]
fn test_malformed_yaml_is_parse_error() {
    let err = ScenarioConfig::from_yaml("capacity: [not, a, number]").unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert!(!err.suggestions().is_empty());

    let err = ScenarioConfig::from_yaml(
        "capacity: 2\nproducers:\n  - { label: p, delay: { every: 3 } }\n",
    )
    .unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn test_validation_rules() {
    let zero = ScenarioConfig::new(0);
    assert!(matches!(zero.validate(), Err(Error::Config(m)) if m.contains("capacity")));

    let empty_label = ScenarioConfig::new(1).consumer(ActorConfig::new("  ", DelaySpec::fixed(1)));
    assert!(matches!(empty_label.validate(), Err(Error::Config(m)) if m.contains("label")));

    let dup = ScenarioConfig::new(1)
        .producer(ActorConfig::new("same", DelaySpec::fixed(1)))
        .producer(ActorConfig::new("same", DelaySpec::fixed(2)));
    assert!(matches!(dup.validate(), Err(Error::Config(m)) if m.contains("duplicate")));

    let inverted = ScenarioConfig::new(1).producer(ActorConfig::new("p", DelaySpec::uniform(9, 3)));
    let err = inverted.validate().unwrap_err();
    assert!(err.to_string().contains("min_ms"));
    assert!(err.suggestions().iter().any(|s| s.contains("min_ms")));
}

#[test]
fn test_scenario_roundtrips_through_yaml() {
    let cfg = ScenarioConfig::default();
    // JSON is a subset of YAML, so the serialized form must load back.
    let text = serde_json::to_string_pretty(&cfg).unwrap();
    assert!(text.contains("\"fixed_ms\": 1200"));
    assert!(!text.contains("max_items"));
    assert_eq!(ScenarioConfig::from_yaml(&text).unwrap(), cfg);
}

#[test]
fn test_missing_file_reports_path() {
    let err = ScenarioConfig::from_yaml_file("/nonexistent/fifoq/scenario.yaml").unwrap_err();
    match err {
        Error::Context { context, .. } => assert!(context.contains("scenario.yaml")),
        other => panic!("expected Context, got {other:?}"),
    }
}

#[test]
fn test_scenario_file_on_disk() {
    let dir = std::env::temp_dir().join(format!("fifoq-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("scenario.yaml");
    std::fs::write(&path, "capacity: 3\nconsumers:\n  - { label: c, delay: { fixed_ms: 1 } }\n")
        .unwrap();

    let cfg = ScenarioConfig::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.capacity, 3);
    assert_eq!(cfg.consumers[0].label, "c");

    let _ = std::fs::remove_dir_all(&dir);
}
