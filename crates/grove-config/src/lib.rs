//! Configuration for grove tools.
//!
//! Configuration lives in a TOML file (`grove.toml`). Every key is optional;
//! a missing file is the same as an empty one.
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [converter]
//! max_nesting_depth = 512
//! dump = "tree"
//!
//! [bindings]
//! recovering = true
//! ```

mod diagnostics;
mod logging;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use grove_ast::{ConvertOptions, DumpFormat, DEFAULT_MAX_NESTING_DEPTH};
use grove_binding::BindingResolver;
use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use diagnostics::{ConfigDiagnostics, ConfigWarning};
pub use logging::init_tracing;

/// Environment variable naming the config file, absolute or relative to the
/// search root.
pub const GROVE_CONFIG_ENV_VAR: &str = "GROVE_CONFIG_PATH";

/// Environment variable overriding `converter.dump`.
pub const GROVE_AST_DUMP_ENV_VAR: &str = "GROVE_AST_DUMP";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroveConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub converter: ConverterConfig,

    #[serde(default)]
    pub bindings: BindingsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to this file as well. If it cannot be opened, file
    /// logging is skipped and the other sinks stay active.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    /// Simple levels are matched case-insensitively (`WARNING` is `warn`);
    /// anything else is kept as an `EnvFilter` directive string.
    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();
        match lower.as_str() {
            "" => Self::default_level(),
            "warning" => "warn".to_owned(),
            "trace" | "debug" | "info" | "warn" | "error" => trimmed.to_ascii_lowercase(),
            _ => trimmed.to_owned(),
        }
    }

    /// The effective filter: `level`, with `RUST_LOG` appended when set.
    /// Unusable directives fall back to `info`.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        use tracing_subscriber::EnvFilter;

        let level = Self::normalize_level_directives(&self.level);
        let rust_log = std::env::var("RUST_LOG")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let candidates = match rust_log {
            Some(rust_log) => vec![format!("{level},{}", rust_log.trim()), rust_log, level],
            None => vec![level],
        };
        candidates
            .into_iter()
            .find_map(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| {
                EnvFilter::default().add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
            })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Statements and expressions nested deeper than this are replaced by
    /// placeholders.
    #[serde(default = "ConverterConfig::default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    /// Debug dump printed after conversion: `source`, `tree` or `html`.
    #[serde(default)]
    pub dump: Option<String>,
}

impl ConverterConfig {
    fn default_max_nesting_depth() -> usize {
        DEFAULT_MAX_NESTING_DEPTH
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            max_nesting_depth: self.max_nesting_depth,
        }
    }

    /// The dump to print, `GROVE_AST_DUMP` taking precedence over `dump`.
    /// Unknown names select nothing.
    pub fn dump_format(&self) -> Option<DumpFormat> {
        let env = with_config_env_lock(|| std::env::var(GROVE_AST_DUMP_ENV_VAR).ok());
        self.dump_format_with_override(env.as_deref())
    }

    pub fn dump_format_with_override(&self, env: Option<&str>) -> Option<DumpFormat> {
        let name = env
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .or(self.dump.as_deref())?;
        DumpFormat::from_name(name)
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: Self::default_max_nesting_depth(),
            dump: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingsConfig {
    /// Hand out recovered bindings for code the semantic engine could not
    /// resolve.
    #[serde(default)]
    pub recovering: bool,
}

impl BindingsConfig {
    pub fn configure(&self, resolver: BindingResolver) -> BindingResolver {
        resolver.recovering(self.recovering)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err.message().to_owned())
    }
}

impl GroveConfig {
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = read_config(path.as_ref())?;
        Self::load_from_str(&text)
    }

    /// Load from TOML and report unknown keys and suspicious values.
    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<GroveConfig>(text)?;
        let diagnostics = ConfigDiagnostics {
            unknown_keys,
            warnings: config.validate(),
        };
        Ok((config, diagnostics))
    }

    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let text = read_config(path.as_ref())?;
        Self::load_from_str_with_diagnostics(&text)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let normalized = LoggingConfig::normalize_level_directives(&self.logging.level);
        if tracing_subscriber::EnvFilter::try_new(&normalized).is_err() {
            warnings.push(ConfigWarning::LoggingLevelInvalid {
                value: self.logging.level.clone(),
                normalized,
            });
        }
        if self.converter.max_nesting_depth == 0 {
            warnings.push(ConfigWarning::NestingDepthZero);
        }
        if let Some(dump) = &self.converter.dump {
            if DumpFormat::from_name(dump).is_none() {
                warnings.push(ConfigWarning::DumpFormatUnknown {
                    value: dump.clone(),
                });
            }
        }
        warnings
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

static CONFIG_ENV_LOCK: OnceLock<ReentrantMutex<()>> = OnceLock::new();

/// Run `f` while holding the lock that guards grove's environment
/// variables. Tests that set them should do so inside this lock.
pub fn with_config_env_lock<R>(f: impl FnOnce() -> R) -> R {
    let _guard = CONFIG_ENV_LOCK.get_or_init(|| ReentrantMutex::new(())).lock();
    f()
}

/// Find the config file for `root`.
///
/// Search order:
/// 1) `GROVE_CONFIG_PATH` (absolute or relative to `root`)
/// 2) `grove.toml` in `root`
/// 3) `.grove.toml` in `root`
pub fn discover_config_path(root: &Path) -> Option<PathBuf> {
    with_config_env_lock(|| {
        if let Some(value) = std::env::var_os(GROVE_CONFIG_ENV_VAR) {
            let candidate = PathBuf::from(value);
            let path = if candidate.is_absolute() {
                candidate
            } else {
                root.join(candidate)
            };
            return Some(path.canonicalize().unwrap_or(path));
        }
        ["grove.toml", ".grove.toml"]
            .into_iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
            .map(|path| path.canonicalize().unwrap_or(path))
    })
}

/// The configuration for `root` and the file it came from. Without a file
/// this is [`GroveConfig::default`].
pub fn load_for_root(root: &Path) -> Result<(GroveConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(root) else {
        return Ok((GroveConfig::default(), None));
    };
    let config = GroveConfig::load_from_path(&path)?;
    tracing::debug!(target: "grove.config", path = %path.display(), "loaded config");
    Ok((config, Some(path)))
}

/// [`load_for_root`], also reporting unknown keys and suspicious values.
pub fn load_for_root_with_diagnostics(
    root: &Path,
) -> Result<(GroveConfig, Option<PathBuf>, ConfigDiagnostics), ConfigError> {
    let Some(path) = discover_config_path(root) else {
        return Ok((GroveConfig::default(), None, ConfigDiagnostics::default()));
    };
    let (config, diagnostics) = GroveConfig::load_from_path_with_diagnostics(&path)?;
    tracing::debug!(target: "grove.config", path = %path.display(), "loaded config");
    Ok((config, Some(path), diagnostics))
}
