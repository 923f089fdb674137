//! Security properties and chain configuration
//!
//! Properties are a flat map of fully qualified names to string values, read
//! from a TOML file (nested tables flatten into dotted keys) and overridden
//! from the environment. [`ChainingConfig`] is the typed view the chain uses;
//! the process-wide instance is read once and then never changes.

use crate::errors::{Result, SecurityError};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Property controlling early termination of a chain pass
pub const STOP_WHEN_AUTHENTICATED_KEY: &str = "security.provider.chaining.stop_when_authenticated";

/// Environment variable naming the properties file read at process start
pub const PROPERTIES_PATH_ENV: &str = "AURA_SECURITY_PROPERTIES";

/// Prefix for environment overrides of individual properties
pub const ENV_PREFIX: &str = "AURA_";

const DEFAULT_STOP_WHEN_AUTHENTICATED: bool = true;

static GLOBAL_CHAINING_CONFIG: OnceCell<ChainingConfig> = OnceCell::new();

/// Flat map of fully qualified security property names to raw values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityProperties {
    values: BTreeMap<String, String>,
}

impl SecurityProperties {
    /// Create an empty property set
    pub fn new() -> Self {
        Self::default()
    }

    /// Load properties from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SecurityError::config(format!(
                "Failed to read properties file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse properties from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let mut properties = Self::new();
        flatten_table("", &table, &mut properties.values);
        Ok(properties)
    }

    /// Environment variable overriding `key`
    ///
    /// `security.provider.x_y` maps to `AURA_SECURITY_PROVIDER_X_Y`.
    pub fn env_var_name(key: &str) -> String {
        format!("{ENV_PREFIX}{}", key.replace('.', "_").to_uppercase())
    }

    /// Override `keys` from the process environment
    pub fn merge_with_env(&mut self, keys: &[&str]) {
        self.merge_with_lookup(keys, |name| std::env::var(name).ok());
    }

    /// Override `keys` using an arbitrary variable lookup
    pub fn merge_with_lookup<F>(&mut self, keys: &[&str], lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in keys {
            if let Some(value) = lookup(&Self::env_var_name(key)) {
                tracing::debug!(property = %key, "Security property overridden from environment");
                self.values.insert((*key).to_string(), value);
            }
        }
    }

    /// Overlay every value of `other` onto this set
    pub fn merge_with(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Set a single property from its string form
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(SecurityError::config("Empty property key"));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Raw value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Boolean value of `key`, falling back to `default` when absent or unrecognised
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            None => default,
            Some(raw) => parse_bool(raw).unwrap_or_else(|| {
                tracing::warn!(
                    property = %key,
                    value = %raw,
                    default,
                    "Unrecognised boolean security property, using default"
                );
                default
            }),
        }
    }

    /// Number of properties held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no properties are held
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    let value = raw.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(nested) => flatten_table(&full_key, nested, out),
            toml::Value::String(s) => {
                out.insert(full_key, s.clone());
            }
            other => {
                out.insert(full_key, other.to_string());
            }
        }
    }
}

/// Typed configuration consumed by [`crate::ChainingSecurityContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainingConfig {
    /// Stop a pass at the first child reporting itself authenticated
    pub stop_when_authenticated: bool,
}

impl Default for ChainingConfig {
    fn default() -> Self {
        Self {
            stop_when_authenticated: DEFAULT_STOP_WHEN_AUTHENTICATED,
        }
    }
}

impl ChainingConfig {
    /// Build the configuration from a property set
    pub fn from_properties(properties: &SecurityProperties) -> Self {
        Self {
            stop_when_authenticated: properties
                .get_bool(STOP_WHEN_AUTHENTICATED_KEY, DEFAULT_STOP_WHEN_AUTHENTICATED),
        }
    }

    /// Read the configuration from the process environment
    ///
    /// Uses the file named by [`PROPERTIES_PATH_ENV`] when set, then applies
    /// environment overrides. Any failure falls back to defaults.
    pub fn from_env() -> Self {
        let mut properties = match std::env::var(PROPERTIES_PATH_ENV) {
            Ok(path) => SecurityProperties::load_from_file(Path::new(&path)).unwrap_or_else(|err| {
                tracing::warn!(
                    path = %path,
                    error = %err,
                    "Security properties unavailable, using defaults"
                );
                SecurityProperties::new()
            }),
            Err(_) => SecurityProperties::new(),
        };
        properties.merge_with_env(&[STOP_WHEN_AUTHENTICATED_KEY]);
        Self::from_properties(&properties)
    }

    /// Process-wide configuration, read on first use
    pub fn global() -> &'static ChainingConfig {
        GLOBAL_CHAINING_CONFIG.get_or_init(|| {
            let config = Self::from_env();
            tracing::info!(
                stop_when_authenticated = config.stop_when_authenticated,
                "Chaining security configuration loaded"
            );
            config
        })
    }

    /// Install the process-wide configuration before its first use
    pub fn install(config: ChainingConfig) -> Result<()> {
        GLOBAL_CHAINING_CONFIG
            .set(config)
            .map_err(|_| SecurityError::config("Chaining configuration already initialised"))
    }
}
