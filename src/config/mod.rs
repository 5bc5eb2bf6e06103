mod settings;

pub use settings::{Config, DisplaySettings, ExportSettings, GymSettings, StorageSettings};

use crate::error::{GymError, Result};
use crate::member::Roster;
use crate::store::FileStore;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.gym/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "gym") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.gym/
    let home = dirs_home().ok_or_else(|| {
        GymError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".gym"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Expand ~ and resolve relative paths against `base`
pub fn resolve_dir(path: &str, base: &Path) -> PathBuf {
    let expanded = expand_path(path);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(GymError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| GymError::ConfigParse { path, source: e })
}

/// Directory the member store lives in
pub fn data_dir(config_dir: &Path, config: &Config) -> PathBuf {
    resolve_dir(&config.storage.data_dir, config_dir)
}

/// Open the roster backed by the configured data directory
pub fn open_roster(config_dir: &Path, config: &Config) -> Result<Roster<FileStore>> {
    Roster::open(FileStore::new(data_dir(config_dir, config)))
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[gym]
name = "Your Gym Name"

[display]
currency_symbol = "$"

[export]
filename = "b7_members_export.csv"
output_dir = "."          # relative to the current directory

[storage]
data_dir = "data"         # relative to this config directory
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_template_parses() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.gym.name, "Your Gym Name");
        assert_eq!(config.export.filename, "b7_members_export.csv");
        assert_eq!(config.storage.data_dir, "data");
    }

    #[test]
    fn test_sections_default() {
        let config: Config = toml::from_str("[gym]\nname = \"B7\"\n").unwrap();
        assert_eq!(config.display.currency_symbol, "$");
        assert_eq!(config.export.output_dir, ".");
    }

    #[test]
    fn test_load_config_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            load_config(temp_dir.path()),
            Err(GymError::ConfigFileNotFound(_))
        ));
    }

    #[test]
    fn test_load_config_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("config.toml"), "[gym\n").unwrap();
        assert!(matches!(
            load_config(temp_dir.path()),
            Err(GymError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_resolve_dir() {
        let base = Path::new("/srv/gym");
        assert_eq!(resolve_dir("data", base), PathBuf::from("/srv/gym/data"));
        assert_eq!(resolve_dir("/var/gym", base), PathBuf::from("/var/gym"));
    }
}
