use crate::models::config::AppConfig;
use std::fs;
use std::path::PathBuf;

/// Loads and persists the app configuration as JSON under the
/// platform-specific config directory.
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a manager, creating the config directory if needed
    pub fn new() -> Result<Self, String> {
        let config_dir = dirs::config_dir()
            .ok_or("Failed to determine config directory")?
            .join("deskscribe");

        fs::create_dir_all(&config_dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;

        let config_path = config_dir.join("config.json");

        Ok(Self {
            config_dir,
            config_path,
        })
    }

    /// Save configuration to disk (pretty-printed for hand editing)
    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;

        let json = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_path, json)
            .map_err(|e| format!("Failed to write config file: {}", e))?;

        Ok(())
    }

    /// Load configuration, falling back to defaults when no file exists
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        Ok(config)
    }

    pub fn config_file_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }
}
