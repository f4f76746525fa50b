//! Where binaries find their settings, and what they were asked to watch
//!
//! Each settings file has a fixed location under `config/` that an
//! environment variable can redirect. Positional arguments are event types.

use std::path::PathBuf;

/// A settings file a binary can ask for
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Channel endpoint, retry policy and subscriptions
    Realtime,
    /// An explicit file, bypassing the environment
    Custom(String),
}

impl ConfigType {
    /// Location used when the environment says nothing
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Realtime => "config/realtime.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    /// Variable that redirects this settings file
    pub fn env_var_name(&self) -> &str {
        match self {
            ConfigType::Realtime => "REALTIME_CONFIG_PATH",
            ConfigType::Custom(_) => "CONFIG_PATH",
        }
    }
}

/// Resolve the settings file for `config_type`
///
/// `Custom` paths are taken as given; otherwise the environment variable
/// wins over the default location.
///
/// ```
/// use campus_admin::bin_common::{load_config_from_env, ConfigType};
///
/// let path = load_config_from_env(ConfigType::Custom("monitor.yaml".into()));
/// assert_eq!(path.to_str(), Some("monitor.yaml"));
/// ```
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    if let ConfigType::Custom(path) = config_type {
        return path.into();
    }

    match std::env::var(config_type.env_var_name()) {
        Ok(path) if !path.trim().is_empty() => path.into(),
        _ => config_type.default_path().into(),
    }
}

/// Event types named on the command line
pub fn parse_args() -> Vec<String> {
    std::env::args()
        .skip(1)
        .filter(|arg| !arg.trim().is_empty())
        .collect()
}
