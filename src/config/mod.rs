//! Configuration loading.
//!
//! The resolved [`Config`] is built in three layers: built-in defaults, the
//! user's `config.json`, and command-line overrides (applied by the CLI).

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub use dvr_core::Config;

/// Directory holding `config.json` and `comskip.ini` when no `--config` is
/// given.
pub const DEFAULT_CONFIG_DIR: &str = "~/.config/dvrpost";

/// Name of the user configuration file.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Name of the scanner configuration file looked up in the config directory.
pub const COMSKIP_INI_NAME: &str = "comskip.ini";

/// The configuration directory: the parent of an explicit config file, or
/// the default directory with `~` expanded.
pub fn config_dir(custom_path: Option<&Path>) -> PathBuf {
    if let Some(dir) = custom_path.and_then(Path::parent) {
        if !dir.as_os_str().is_empty() {
            return dir.to_path_buf();
        }
        return PathBuf::from(".");
    }
    PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_DIR).as_ref())
}

/// Load configuration from a JSON file. Keys set to an empty string are
/// treated as unset.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;
    drop_empty_strings(&mut value);

    let config: Config = serde_json::from_value(value)
        .with_context(|| format!("Invalid config file: {:?}", path))?;
    Ok(config)
}

/// Load the user's configuration, or defaults when there is none.
///
/// An explicit `custom_path` must exist. The default file is optional.
/// When no scanner configuration is set, `comskip.ini` in `config_dir` is
/// used if it exists.
pub fn load_config_or_default(custom_path: Option<&Path>, config_dir: &Path) -> Result<Config> {
    let mut config = match custom_path {
        Some(path) => load_config(path)?,
        None => {
            let path = config_dir.join(CONFIG_FILE_NAME);
            if path.exists() {
                load_config(&path)?
            } else {
                tracing::debug!("No config file at {:?}; using defaults", path);
                Config::default()
            }
        }
    };

    if config.comskip_ini.is_none() {
        let ini = config_dir.join(COMSKIP_INI_NAME);
        if ini.is_file() {
            config.comskip_ini = Some(ini);
        }
    }

    Ok(config)
}

fn drop_empty_strings(value: &mut Value) {
    if let Value::Object(map) = value {
        map.retain(|_, v| !matches!(v, Value::String(s) if s.is_empty()));
        for v in map.values_mut() {
            drop_empty_strings(v);
        }
    }
}
