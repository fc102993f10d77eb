use crate::models::locate::MatchMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Icon locator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocatorConfig {
    /// Label text to look for in text mode (case-insensitive substring)
    pub target_label: String,
    pub mode: MatchMode,
    /// Reference image used in template mode
    pub template_path: PathBuf,
    /// Minimum correlation confidence for a template match
    pub match_threshold: f64,
    /// Template scale factors, tried in order; earlier entries win ties
    pub match_scales: Vec<f64>,
    /// Base URL of the local OCR sidecar
    pub ocr_server_url: String,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            target_label: "Notepad".to_string(),
            mode: MatchMode::Text,
            template_path: PathBuf::from("templates/notepad_icon.png"),
            match_threshold: 0.7,
            match_scales: vec![1.0, 0.8, 1.2, 0.6, 1.4],
            ocr_server_url: "http://127.0.0.1:39835".to_string(),
        }
    }
}

/// Posts API settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    pub url: String,
    /// How many posts to process per run
    pub post_limit: usize,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "https://jsonplaceholder.typicode.com/posts".to_string(),
            post_limit: 10,
            timeout_secs: 10,
        }
    }
}

/// Retry and polling settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Detection attempts per item before the item is skipped
    pub detect_attempts: u32,
    pub detect_retry_delay_ms: u64,
    /// Bounded poll for the editor window after opening the icon
    pub window_poll_attempts: u32,
    pub window_poll_interval_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            detect_attempts: 3,
            detect_retry_delay_ms: 2000,
            window_poll_attempts: 5,
            window_poll_interval_ms: 200,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Directory the editor saves post files into
    pub target_dir: PathBuf,
    /// Directory for annotated/plain detection captures
    pub debug_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let target_dir = dirs::desktop_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tjm-project");

        Self {
            debug_dir: target_dir.clone(),
            target_dir,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub locator: LocatorConfig,
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub output: OutputConfig,
    /// Title fragment of the editor window to wait for
    pub window_title: String,
    /// Grace period before the first capture, so the desktop can be arranged
    pub startup_delay_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            locator: LocatorConfig::default(),
            api: ApiConfig::default(),
            retry: RetryConfig::default(),
            output: OutputConfig::default(),
            window_title: "Notepad".to_string(),
            startup_delay_secs: 3,
        }
    }
}
