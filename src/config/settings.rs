use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub gym: GymSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GymSettings {
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DisplaySettings {
    pub currency_symbol: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ExportSettings {
    pub filename: String,
    /// Relative paths resolve against the current directory
    pub output_dir: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            filename: "b7_members_export.csv".to_string(),
            output_dir: ".".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Relative paths resolve against the config directory
    pub data_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}
