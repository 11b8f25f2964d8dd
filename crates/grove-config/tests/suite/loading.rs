use grove_ast::DumpFormat;
use grove_config::{ConfigError, ConfigWarning, GroveConfig};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn empty_config_is_the_default() {
    let config = GroveConfig::load_from_str("").unwrap();
    assert_eq!(config, GroveConfig::default());
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.stderr);
    assert!(!config.logging.json);
    assert_eq!(config.converter.max_nesting_depth, 256);
    assert!(!config.bindings.recovering);
}

#[test]
fn every_section_is_read() {
    let text = r#"
[logging]
level = "debug"
json = true
stderr = false
file = "grove.log"

[converter]
max_nesting_depth = 32
dump = "html"

[bindings]
recovering = true
"#;
    let config = GroveConfig::load_from_str(text).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
    assert!(!config.logging.stderr);
    assert_eq!(config.logging.file.as_deref(), Some(std::path::Path::new("grove.log")));
    assert_eq!(config.converter.convert_options().max_nesting_depth, 32);
    assert_eq!(
        config.converter.dump_format_with_override(None),
        Some(DumpFormat::Html)
    );
    assert!(config.bindings.recovering);
}

#[test]
fn partial_sections_keep_their_defaults() {
    let config = GroveConfig::load_from_str("[converter]\ndump = \"tree\"\n").unwrap();
    assert_eq!(config.converter.max_nesting_depth, 256);
    assert_eq!(config.logging, GroveConfig::default().logging);
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let err = GroveConfig::load_from_str("[converter\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err:?}");

    let err = GroveConfig::load_from_str("[converter]\nmax_nesting_depth = \"deep\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err:?}");
}

#[test]
fn missing_files_are_io_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = GroveConfig::load_from_path(&path).unwrap_err();
    match err {
        ConfigError::Io { path: reported, .. } => assert!(reported.ends_with("absent.toml")),
        other => panic!("expected an io error, got {other:?}"),
    }
}

#[test]
fn files_load_like_strings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("grove.toml");
    std::fs::write(&path, "[bindings]\nrecovering = true\n").unwrap();
    let config = GroveConfig::load_from_path(&path).unwrap();
    assert!(config.bindings.recovering);
}

#[test]
fn diagnostics_report_unknown_keys_and_odd_values() {
    let text = r#"
[logging]
levle = "debug"

[converter]
max_nesting_depth = 0
dump = "mindmapp"
"#;
    let (config, diagnostics) = GroveConfig::load_from_str_with_diagnostics(text).unwrap();
    assert_eq!(config.converter.max_nesting_depth, 0);
    assert_eq!(diagnostics.unknown_keys, vec!["logging.levle".to_string()]);
    assert_eq!(
        diagnostics.warnings,
        vec![
            ConfigWarning::NestingDepthZero,
            ConfigWarning::DumpFormatUnknown {
                value: "mindmapp".into()
            },
        ]
    );
    assert_eq!(
        diagnostics.warnings[1].to_string(),
        "converter.dump `mindmapp` is not a known dump format"
    );

    let (_, clean) = GroveConfig::load_from_str_with_diagnostics("[bindings]\nrecovering = true\n")
        .unwrap();
    assert!(clean.is_empty());
}
