use super::*;
use std::io::Write;

#[test]
fn test_defaults() {
    let config = PlanConfig::from_yaml("").unwrap();
    assert_eq!(config.error_mode, ErrorMode::FailFast);
    assert_eq!(config.unresolved_exclude, UnresolvedExclude::Drop);
    assert_eq!(config.severity_for("PL101"), Severity::Error);
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
error_mode: collect
unresolved_exclude: error
severity_overrides:
  PL103: warning
"#;
    let config = PlanConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.error_mode, ErrorMode::Collect);
    assert_eq!(config.unresolved_exclude, UnresolvedExclude::Error);
    assert_eq!(config.severity_for("PL103"), Severity::Warning);
    assert_eq!(config.severity_for("PL101"), Severity::Error);
}

#[test]
fn test_unknown_field_rejected() {
    let err = PlanConfig::from_yaml("error_mod: collect\n").unwrap_err();
    assert!(matches!(err, PlanError::Yaml(_)));
}

#[test]
fn test_override_of_internal_code_rejected() {
    let yaml = "severity_overrides:\n  PL001: info\n";
    let err = PlanConfig::from_yaml(yaml).unwrap_err();
    assert!(matches!(err, PlanError::ConfigInvalid { .. }));
    assert!(err.to_string().contains("PL001"));
}

#[test]
fn test_load_missing_file() {
    let err = PlanConfig::load(Path::new("/definitely/not/here.yml")).unwrap_err();
    assert!(matches!(err, PlanError::ConfigNotFound { .. }));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("qlplan.yml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "error_mode: collect").unwrap();

    let config = PlanConfig::load(&path).unwrap();
    assert_eq!(config, PlanConfig::collecting());
}
