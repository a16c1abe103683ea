//! Standard configuration locations

use std::path::PathBuf;

/// Application directory name under the platform config directory
pub const CONFIG_DIR_NAME: &str = "digitalscratch";

/// `<config_dir>/digitalscratch`, or `./digitalscratch` if the platform has
/// no config directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// `<config_dir>/digitalscratch/<filename>`
pub fn default_config_path(filename: &str) -> PathBuf {
    default_config_dir().join(filename)
}
