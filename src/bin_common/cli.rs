//! Config path resolution for the binaries

use std::path::PathBuf;

/// Which configuration file a binary reads
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// `config/realtime.yaml`, overridable with `REALTIME_CONFIG_PATH`
    Realtime,
    /// Path given on the command line, overridable with `CONFIG_PATH`
    Custom(String),
}

impl ConfigType {
    /// Path used when the override variable is unset
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Realtime => "config/realtime.yaml",
            ConfigType::Custom(path) => path.as_str(),
        }
    }

    pub fn env_var_name(&self) -> &str {
        match self {
            ConfigType::Realtime => "REALTIME_CONFIG_PATH",
            ConfigType::Custom(_) => "CONFIG_PATH",
        }
    }

    /// `Custom` when a path argument was given, `Realtime` otherwise
    pub fn from_args(args: &[String]) -> Self {
        match args.first() {
            Some(path) => ConfigType::Custom(path.clone()),
            None => ConfigType::Realtime,
        }
    }
}

/// Resolve the config path: override variable first, then the default
///
/// ```
/// use hotel_dashboard_realtime::bin_common::{load_config_from_env, ConfigType};
///
/// let path = load_config_from_env(ConfigType::Realtime);
/// ```
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    match std::env::var(config_type.env_var_name()) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(config_type.default_path()),
    }
}

/// Command line arguments after the program name
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}
