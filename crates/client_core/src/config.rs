use std::{collections::HashMap, fs, path::Path, time::Duration};

use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "https://dummyjson.com";
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;
pub const SETTINGS_FILE: &str = "storefront.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub search_debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
        }
    }
}

impl Settings {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

/// Defaults, then `storefront.toml` in the working directory, then env vars.
pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    file: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(file) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => apply_file_values(&mut settings, &file_cfg),
            Err(error) => warn!(path = %file.display(), %error, "ignoring unreadable settings file"),
        }
    }

    for key in ["STOREFRONT_API_BASE_URL", "APP__API_BASE_URL"] {
        if let Some(v) = env(key) {
            settings.api_base_url = v;
        }
    }

    for key in ["STOREFRONT_DEBOUNCE_MS", "APP__SEARCH_DEBOUNCE_MS"] {
        if let Some(v) = env(key) {
            if let Ok(parsed) = v.trim().parse::<u64>() {
                settings.search_debounce_ms = parsed;
            }
        }
    }

    settings
}

fn apply_file_values(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_cfg.get("api_base_url").and_then(toml::Value::as_str) {
        settings.api_base_url = v.to_string();
    }
    match file_cfg.get("search_debounce_ms") {
        Some(toml::Value::Integer(ms)) if *ms >= 0 => settings.search_debounce_ms = *ms as u64,
        Some(toml::Value::String(ms)) => {
            if let Ok(parsed) = ms.trim().parse::<u64>() {
                settings.search_debounce_ms = parsed;
            }
        }
        _ => {}
    }
}
