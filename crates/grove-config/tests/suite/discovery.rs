use std::ffi::OsString;

use grove_ast::DumpFormat;
use grove_config::{
    discover_config_path, load_for_root, load_for_root_with_diagnostics, with_config_env_lock,
    ConfigWarning, GroveConfig, GROVE_AST_DUMP_ENV_VAR, GROVE_CONFIG_ENV_VAR,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn discovers_grove_toml_in_the_root() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(GROVE_CONFIG_ENV_VAR);
        let dir = tempdir().unwrap();
        let path = dir.path().join("grove.toml");
        std::fs::write(&path, "[converter]\ndump = \"tree\"\n").unwrap();

        let discovered = discover_config_path(dir.path()).expect("grove.toml");
        assert_eq!(discovered, path.canonicalize().unwrap_or(path));

        let (config, from) = load_for_root(dir.path()).unwrap();
        assert_eq!(from, Some(discovered));
        assert_eq!(config.converter.dump.as_deref(), Some("tree"));
    });
}

#[test]
fn hidden_config_is_the_fallback() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(GROVE_CONFIG_ENV_VAR);
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".grove.toml"), "").unwrap();
        let discovered = discover_config_path(dir.path()).unwrap();
        assert!(discovered.ends_with(".grove.toml"));
    });
}

#[test]
fn no_file_means_defaults() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(GROVE_CONFIG_ENV_VAR);
        let dir = tempdir().unwrap();
        assert_eq!(discover_config_path(dir.path()), None);
        let (config, from) = load_for_root(dir.path()).unwrap();
        assert_eq!(config, GroveConfig::default());
        assert_eq!(from, None);
    });
}

#[test]
fn the_environment_names_the_file_relative_to_the_root() {
    with_config_env_lock(|| {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("conf")).unwrap();
        let path = dir.path().join("conf/custom.toml");
        std::fs::write(&path, "[bindings]\nrecovering = true\n").unwrap();
        std::fs::write(dir.path().join("grove.toml"), "").unwrap();

        let _env = EnvVarGuard::set(GROVE_CONFIG_ENV_VAR, "conf/custom.toml");
        let (config, from) = load_for_root(dir.path()).unwrap();
        assert_eq!(from, Some(path.canonicalize().unwrap_or(path)));
        assert!(config.bindings.recovering);
    });
}

#[test]
fn the_dump_environment_variable_wins() {
    with_config_env_lock(|| {
        let config = GroveConfig::load_from_str("[converter]\ndump = \"source\"\n").unwrap();
        {
            let _env = EnvVarGuard::unset(GROVE_AST_DUMP_ENV_VAR);
            assert_eq!(config.converter.dump_format(), Some(DumpFormat::Source));
        }
        let _env = EnvVarGuard::set(GROVE_AST_DUMP_ENV_VAR, "mindmap");
        assert_eq!(config.converter.dump_format(), Some(DumpFormat::Tree));
    });
}

#[test]
fn discovered_config_reports_its_diagnostics() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(GROVE_CONFIG_ENV_VAR);
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("grove.toml"),
            "[converter]\nmax_nesting_depth = 0\n[extra]\n",
        )
        .unwrap();

        let (config, from, diagnostics) = load_for_root_with_diagnostics(dir.path()).unwrap();
        assert!(from.is_some());
        assert_eq!(config.converter.max_nesting_depth, 0);
        assert_eq!(diagnostics.unknown_keys, vec!["extra".to_string()]);
        assert_eq!(diagnostics.warnings, vec![ConfigWarning::NestingDepthZero]);

        let empty = tempdir().unwrap();
        let (config, from, diagnostics) = load_for_root_with_diagnostics(empty.path()).unwrap();
        assert_eq!(config, GroveConfig::default());
        assert_eq!(from, None);
        assert!(diagnostics.is_empty());
    });
}
