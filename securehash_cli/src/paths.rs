//! Centralized path management for the securehash CLI
//!
//! Config file, algorithm registry and helper binaries all have a platform
//! default; every one of them can be overridden through configuration.

use std::path::PathBuf;

/// The name of the application directory used across all platforms
const APP_DIR: &str = "securehash";

/// The name of the configuration file
const CONFIG_FILE: &str = "config.toml";

/// The name of the algorithm registry document
const REGISTRY_FILE: &str = "algorithms.json";

/// Returns the configuration directory
///
/// On Unix-like systems `XDG_CONFIG_HOME` wins when set, otherwise the
/// platform config dir (`~/.config/securehash` on Linux). Falls back to
/// `.securehash` in the current directory.
pub fn get_config_dir() -> PathBuf {
    #[cfg(not(target_os = "windows"))]
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return PathBuf::from(xdg_config).join(APP_DIR);
    }

    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".securehash"))
}

/// Returns the path to the configuration file
pub fn get_config_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE)
}

/// Returns the default location of the algorithm registry
pub fn default_registry_path() -> PathBuf {
    get_config_dir().join(REGISTRY_FILE)
}

/// Returns the default directory that helper executables are resolved against
///
/// This is the directory holding the running executable, so helpers shipped
/// next to `securehash` are found without configuration.
pub fn default_binaries_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(get_config_dir)
}
