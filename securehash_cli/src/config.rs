use crate::paths;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use securehash_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the algorithm registry and its helper binaries live
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binaries_dir: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub default_format: String,
    pub color_enabled: bool,
    pub progress_enabled: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: "text".to_string(),
            color_enabled: true,
            progress_enabled: true,
        }
    }
}

impl RegistryConfig {
    /// Registry document to load
    pub fn registry_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(paths::default_registry_path)
    }

    /// Directory executable records are resolved against
    pub fn binaries_dir(&self) -> PathBuf {
        self.binaries_dir
            .clone()
            .unwrap_or_else(paths::default_binaries_dir)
    }
}

impl AppConfig {
    /// Apply CLI argument overrides to the configuration
    pub fn apply_cli_overrides(
        &mut self,
        registry: Option<PathBuf>,
        format: Option<String>,
        no_progress: bool,
    ) {
        if let Some(path) = registry {
            self.registry.path = Some(path);
        }
        if let Some(format) = format {
            self.output.default_format = format;
        }
        if no_progress {
            self.output.progress_enabled = false;
        }
    }
}

/// Configuration manager that handles XDG-compliant paths and layered configuration
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Create a new ConfigManager with the platform config path
    pub fn new() -> Self {
        Self {
            config_path: paths::get_config_path(),
        }
    }

    /// Create a ConfigManager with a specific path (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn get_config_path(&self) -> PathBuf {
        self.config_path.clone()
    }

    /// Load configuration with layered priority: ENV > File > Defaults
    ///
    /// CLI flags are applied afterwards by the caller.
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new();

        // Layer 1: Defaults
        figment = figment.merge(Serialized::defaults(AppConfig::default()));

        // Layer 2: Config file (if exists)
        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        // Layer 3: Environment variables
        figment = figment.merge(Env::prefixed("SECUREHASH_").split("__"));

        figment.extract().context("Failed to load configuration")
    }

    /// Get a configuration value by key (dot notation)
    pub fn get(&self, key: &str) -> Result<String> {
        let value = self.effective_value()?;

        let mut current = &value;
        for part in key.split('.') {
            match current {
                toml::Value::Table(table) => {
                    current = table
                        .get(part)
                        .ok_or_else(|| anyhow::anyhow!("Key '{}' not found", key))?;
                }
                _ => anyhow::bail!("Invalid key path: {}", key),
            }
        }

        match current {
            toml::Value::String(s) => Ok(s.clone()),
            toml::Value::Integer(i) => Ok(i.to_string()),
            toml::Value::Float(f) => Ok(f.to_string()),
            toml::Value::Boolean(b) => Ok(b.to_string()),
            _ => anyhow::bail!("Value at '{}' is not a simple type", key),
        }
    }

    /// Set a configuration value by key (dot notation) in the config file
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parsed_value = Self::parse_config_value(key, value)?;

        let mut config = if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            toml::from_str(&content)?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        let parts: Vec<&str> = key.split('.').collect();
        let Some((last, parents)) = parts.split_last() else {
            anyhow::bail!("Empty key");
        };

        let mut current = &mut config;
        for part in parents {
            let toml::Value::Table(table) = current else {
                anyhow::bail!("Invalid key path: expected table at '{}'", part);
            };
            current = table
                .entry(part.to_string())
                .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        }
        let toml::Value::Table(table) = current else {
            anyhow::bail!("Cannot set value on non-table");
        };
        table.insert(last.to_string(), parsed_value);

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(&config)?;
        fs::write(&self.config_path, toml_string)?;

        Ok(())
    }

    /// List all effective configuration values
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let value = self.effective_value()?;

        let mut items = Vec::new();
        Self::collect_values(&value, String::new(), &mut items);
        items.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(items)
    }

    fn effective_value(&self) -> Result<toml::Value> {
        let config = self.load()?;
        let toml_string = toml::to_string(&config)?;
        Ok(toml::from_str(&toml_string)?)
    }

    /// Recursively collect all key-value pairs from TOML
    fn collect_values(value: &toml::Value, prefix: String, items: &mut Vec<(String, String)>) {
        match value {
            toml::Value::Table(table) => {
                for (key, val) in table {
                    let new_prefix = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    Self::collect_values(val, new_prefix, items);
                }
            }
            toml::Value::String(s) => items.push((prefix, s.clone())),
            toml::Value::Integer(i) => items.push((prefix, i.to_string())),
            toml::Value::Float(f) => items.push((prefix, f.to_string())),
            toml::Value::Boolean(b) => items.push((prefix, b.to_string())),
            _ => {}
        }
    }

    /// Validate and convert a value to the TOML type its key expects
    fn parse_config_value(key: &str, value: &str) -> Result<toml::Value> {
        match key {
            "engine.chunk_size" | "engine.process_chunk_size" => {
                let size: i64 = value
                    .parse()
                    .with_context(|| format!("{key} must be a positive integer"))?;
                if size < 1 {
                    anyhow::bail!("{key} must be greater than 0");
                }
                Ok(toml::Value::Integer(size))
            }
            "engine.progress_step" => {
                let step: u8 = value
                    .parse()
                    .context("progress_step must be an integer between 1 and 100")?;
                if step == 0 || step > 100 {
                    anyhow::bail!("progress_step must be between 1 and 100");
                }
                Ok(toml::Value::Integer(i64::from(step)))
            }
            "engine.text_timeout_secs" | "engine.terminate_grace_ms" => {
                let n: u32 = value
                    .parse()
                    .with_context(|| format!("{key} must be a non-negative integer"))?;
                Ok(toml::Value::Integer(i64::from(n)))
            }
            "output.default_format" => match value {
                "text" | "json" | "csv" => Ok(toml::Value::String(value.to_string())),
                _ => anyhow::bail!("default_format must be one of text, json, csv"),
            },
            "output.color_enabled" | "output.progress_enabled" => {
                let b: bool = value.parse().context("Value must be 'true' or 'false'")?;
                Ok(toml::Value::Boolean(b))
            }
            "registry.path" | "registry.binaries_dir" => Ok(toml::Value::String(value.to_string())),
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        }
    }
}

/// Load the effective configuration from the default location
pub fn get_config() -> Result<AppConfig> {
    ConfigManager::new().load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager() -> (TempDir, ConfigManager) {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested/config.toml"));
        (dir, manager)
    }

    #[test]
    fn test_defaults_without_file() {
        let (_dir, manager) = manager();
        let config = manager.load().unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.output.default_format, "text");
        assert!(config.registry.path.is_none());
    }

    #[test]
    fn test_file_layer_overrides_defaults() {
        let (dir, manager) = manager();
        let path = dir.path().join("nested/config.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "[engine]\nchunk_size = 4096\n\n[registry]\npath = \"/etc/securehash/algorithms.json\"\n",
        )
        .unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.engine.chunk_size, 4096);
        // Unset engine keys keep their defaults
        assert_eq!(config.engine.progress_step, 5);
        assert_eq!(
            config.registry.registry_path(),
            PathBuf::from("/etc/securehash/algorithms.json")
        );
    }

    #[test]
    fn test_set_then_get() {
        let (_dir, mut manager) = manager();
        manager.set("engine.text_timeout_secs", "12").unwrap();
        manager.set("output.default_format", "json").unwrap();

        assert_eq!(manager.get("engine.text_timeout_secs").unwrap(), "12");
        assert_eq!(manager.get("output.default_format").unwrap(), "json");
        assert!(manager.get_config_path().exists());
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let (_dir, mut manager) = manager();
        assert!(manager.set("engine.progress_step", "0").is_err());
        assert!(manager.set("engine.chunk_size", "lots").is_err());
        assert!(manager.set("output.default_format", "xml").is_err());
        assert!(manager.set("output.color_enabled", "yes").is_err());
        assert!(manager.set("nope.key", "1").is_err());
        assert!(!manager.get_config_path().exists());
    }

    #[test]
    fn test_list_contains_engine_keys() {
        let (_dir, manager) = manager();
        let items = manager.list().unwrap();
        let keys: Vec<_> = items.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"engine.chunk_size"));
        assert!(keys.contains(&"output.progress_enabled"));
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AppConfig::default();
        config.apply_cli_overrides(
            Some(PathBuf::from("custom.json")),
            Some("csv".to_string()),
            true,
        );
        assert_eq!(config.registry.registry_path(), PathBuf::from("custom.json"));
        assert_eq!(config.output.default_format, "csv");
        assert!(!config.output.progress_enabled);
    }
}
