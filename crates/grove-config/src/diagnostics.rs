use serde::de::DeserializeOwned;

/// Findings of a config load that did not stop it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    /// Keys the schema does not know, as dotted paths (`converter.dumpp`).
    pub unknown_keys: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
}

impl ConfigDiagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty() && self.warnings.is_empty()
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// `logging.level` is not a valid filter; logging falls back to `info`.
    LoggingLevelInvalid { value: String, normalized: String },
    /// `converter.dump` names no dump format; nothing is dumped.
    DumpFormatUnknown { value: String },
    /// `converter.max_nesting_depth = 0` turns every statement into a
    /// placeholder.
    NestingDepthZero,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::LoggingLevelInvalid { value, .. } => {
                write!(f, "logging.level `{value}` is not a valid filter")
            }
            ConfigWarning::DumpFormatUnknown { value } => {
                write!(f, "converter.dump `{value}` is not a known dump format")
            }
            ConfigWarning::NestingDepthZero => {
                f.write_str("converter.max_nesting_depth is 0")
            }
        }
    }
}

pub(crate) fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(path.to_string().trim_start_matches('.').to_owned());
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}
