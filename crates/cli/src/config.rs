use std::path::PathBuf;

use querydesk_search::{DEFAULT_CLOSED_RETENTION, DEFAULT_MAX_MATCHES};
use querydesk_workspace::DEFAULT_MAX_TABS;

/// Returns the path to the config file
pub fn config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        dirs::config_dir().map(|p| p.join("querydesk").join("config.txt"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME")
            && !xdg.is_empty()
        {
            return Some(PathBuf::from(xdg).join("querydesk").join("config.txt"));
        }
        dirs::home_dir().map(|p| p.join(".config").join("querydesk").join("config.txt"))
    }
}

/// The settings a one-shot search needs from the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub closed_tab_retention: usize,
    pub max_matches: usize,
    pub max_tabs: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            closed_tab_retention: DEFAULT_CLOSED_RETENTION,
            max_matches: DEFAULT_MAX_MATCHES,
            max_tabs: DEFAULT_MAX_TABS,
        }
    }
}

pub fn load_search_settings() -> SearchSettings {
    config_path()
        .and_then(|path| std::fs::read_to_string(path).ok())
        .map(|contents| parse_search_settings(&contents))
        .unwrap_or_default()
}

/// Parses the limits from config file contents, keeping defaults for
/// anything missing or malformed.
pub fn parse_search_settings(contents: &str) -> SearchSettings {
    let mut settings = SearchSettings::default();

    for line in contents.lines() {
        let trimmed = line.trim();

        // Skip comments and empty lines
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let Ok(value) = value.trim().parse::<usize>() else {
            continue;
        };

        match key.trim().to_ascii_lowercase().as_str() {
            "closed_tab_retention" => settings.closed_tab_retention = value.min(1_000),
            "search_max_matches" => settings.max_matches = value.clamp(1, 1_000_000),
            "max_tabs" => settings.max_tabs = value.clamp(1, 500),
            _ => {}
        }
    }

    settings
}
