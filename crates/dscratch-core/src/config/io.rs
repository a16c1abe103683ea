//! YAML load/save shared by every configuration file
//!
//! A missing or unreadable file is not fatal: the caller gets the defaults and
//! the problem is logged. Saving creates the parent directories.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Load a configuration, falling back to `T::default()`
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    match try_load_config(path) {
        Ok(Some(config)) => {
            log::info!("Loaded config from {:?}", path);
            config
        }
        Ok(None) => {
            log::info!("No config at {:?}, using defaults", path);
            T::default()
        }
        Err(e) => {
            log::warn!("{:#}, using defaults", e);
            T::default()
        }
    }
}

/// Load a configuration, `Ok(None)` if the file does not exist
pub fn try_load_config<T>(path: &Path) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;
    Ok(Some(config))
}

/// Save a configuration as YAML
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {:?}", parent))?;
    }
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml).with_context(|| format!("Failed to write config file {:?}", path))?;
    log::info!("Saved config to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        decks: u32,
        label: String,
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config: Sample = load_config(&dir.path().join("absent.yaml"));
        assert_eq!(config, Sample::default());
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "decks: [not, a, number").unwrap();
        assert!(try_load_config::<Sample>(&path).is_err());
        assert_eq!(load_config::<Sample>(&path), Sample::default());
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deck.yaml");
        let config = Sample {
            decks: 2,
            label: "booth".to_string(),
        };
        save_config(&config, &path).unwrap();
        assert_eq!(load_config::<Sample>(&path), config);
    }
}
