use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use querydesk_search::{
    ControllerConfig, DEFAULT_CLOSED_RETENTION, DEFAULT_DEBOUNCE, DEFAULT_MAX_MATCHES,
    SearchOptions,
};
use querydesk_workspace::DEFAULT_MAX_TABS;

const MAX_DEBOUNCE_MS: u64 = 5_000;
const MAX_CLOSED_RETENTION: usize = 1_000;
const MAX_SEARCH_MATCHES: usize = 1_000_000;
const MAX_TABS_LIMIT: usize = 500;

const DEFAULT_CONFIG: &str = "# Search settings\n\
# Quiet period after the last keystroke before searching, in milliseconds\n\
search_debounce_ms = 400\n\
# Stop collecting after this many content matches (shown as N+)\n\
# search_max_matches = 10000\n\
# Initial state of the search toggles\n\
# search_case_sensitive = false\n\
# search_whole_word = false\n\
# search_use_regex = false\n\
# Include closed tabs in results\n\
search_include_closed = true\n\
\n\
# Tabs\n\
# Closed tabs kept around for search (oldest are forgotten first)\n\
closed_tab_retention = 50\n\
# Maximum number of open tabs\n\
# max_tabs = 100\n\
# Session file restored on start and saved on quit (~ supported)\n\
# session_file = ~/.local/share/querydesk/session.json\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub search_debounce_ms: u64,
    pub search_max_matches: usize,
    pub search_case_sensitive: bool,
    pub search_whole_word: bool,
    pub search_use_regex: bool,
    pub search_include_closed: bool,
    pub closed_tab_retention: usize,
    pub max_tabs: usize,
    pub session_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            search_max_matches: DEFAULT_MAX_MATCHES,
            search_case_sensitive: false,
            search_whole_word: false,
            search_use_regex: false,
            search_include_closed: true,
            closed_tab_retention: DEFAULT_CLOSED_RETENTION,
            max_tabs: DEFAULT_MAX_TABS,
            session_file: None,
        }
    }
}

impl AppConfig {
    pub fn load_or_create() -> Self {
        let mut config = Self::default();
        let Some(path) = ensure_config_file() else {
            return config;
        };

        match fs::read_to_string(&path) {
            Ok(contents) => config = Self::from_contents(&contents),
            Err(error) => log::warn!("could not read {}: {error}", path.display()),
        }

        config
    }

    fn from_contents(contents: &str) -> Self {
        let mut config = Self::default();
        for (line_number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.splitn(2, '=');
            let key = parts.next().unwrap_or("").trim();
            let value = parts.next().unwrap_or("").trim();
            let line_number = line_number + 1;

            if key.eq_ignore_ascii_case("search_debounce_ms") {
                match value.parse::<u64>() {
                    Ok(ms) => config.search_debounce_ms = ms.min(MAX_DEBOUNCE_MS),
                    Err(_) => warn_invalid(line_number, key, value),
                }
            } else if key.eq_ignore_ascii_case("search_max_matches") {
                match value.parse::<usize>() {
                    Ok(limit) => config.search_max_matches = limit.clamp(1, MAX_SEARCH_MATCHES),
                    Err(_) => warn_invalid(line_number, key, value),
                }
            } else if key.eq_ignore_ascii_case("search_case_sensitive") {
                set_bool(&mut config.search_case_sensitive, line_number, key, value);
            } else if key.eq_ignore_ascii_case("search_whole_word") {
                set_bool(&mut config.search_whole_word, line_number, key, value);
            } else if key.eq_ignore_ascii_case("search_use_regex") {
                set_bool(&mut config.search_use_regex, line_number, key, value);
            } else if key.eq_ignore_ascii_case("search_include_closed")
                || key.eq_ignore_ascii_case("search_include_deleted")
            {
                set_bool(&mut config.search_include_closed, line_number, key, value);
            } else if key.eq_ignore_ascii_case("closed_tab_retention") {
                match value.parse::<usize>() {
                    Ok(retention) => config.closed_tab_retention = retention.min(MAX_CLOSED_RETENTION),
                    Err(_) => warn_invalid(line_number, key, value),
                }
            } else if key.eq_ignore_ascii_case("max_tabs") {
                match value.parse::<usize>() {
                    Ok(max_tabs) => config.max_tabs = max_tabs.clamp(1, MAX_TABS_LIMIT),
                    Err(_) => warn_invalid(line_number, key, value),
                }
            } else if key.eq_ignore_ascii_case("session_file") {
                config.session_file = parse_optional_string_value(value).map(|raw| expand_home(&raw));
            } else {
                log::warn!("config line {line_number}: unknown key {key:?}");
            }
        }

        config
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            case_sensitive: self.search_case_sensitive,
            whole_word: self.search_whole_word,
            use_regex: self.search_use_regex,
            include_deleted: self.search_include_closed,
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            debounce: Duration::from_millis(self.search_debounce_ms),
            max_matches: self.search_max_matches,
            closed_retention: self.closed_tab_retention,
            options: self.search_options(),
        }
    }
}

fn set_bool(target: &mut bool, line_number: usize, key: &str, value: &str) {
    match parse_bool(value) {
        Some(parsed) => *target = parsed,
        None => warn_invalid(line_number, key, value),
    }
}

fn warn_invalid(line_number: usize, key: &str, value: &str) {
    log::warn!("config line {line_number}: ignoring invalid value {value:?} for {key}");
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_string_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let unquoted = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    let unquoted = unquoted.trim();
    if unquoted.is_empty() {
        return None;
    }

    Some(unquoted.to_string())
}

fn parse_optional_string_value(value: &str) -> Option<String> {
    let parsed = parse_string_value(value)?;
    let normalized = parsed.trim().to_ascii_lowercase();
    if matches!(normalized.as_str(), "none" | "unset" | "default") {
        return None;
    }
    Some(parsed)
}

pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

pub fn ensure_config_file() -> Option<PathBuf> {
    let path = config_path()?;
    if !path.exists() {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(error) = fs::write(&path, DEFAULT_CONFIG) {
            log::warn!("could not create {}: {error}", path.display());
        }
    }
    Some(path)
}

fn config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        if let Ok(app_data) = env::var("APPDATA")
            && !app_data.trim().is_empty()
        {
            return Some(Path::new(&app_data).join("querydesk").join("config.txt"));
        }
    }

    if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME")
        && !xdg_config_home.trim().is_empty()
    {
        return Some(Path::new(&xdg_config_home).join("querydesk/config.txt"));
    }

    if let Ok(home) = env::var("HOME")
        && !home.trim().is_empty()
    {
        return Some(Path::new(&home).join(".config/querydesk/config.txt"));
    }

    env::current_dir()
        .ok()
        .map(|dir| dir.join(".config/querydesk/config.txt"))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{AppConfig, DEFAULT_CONFIG, parse_string_value};

    #[test]
    fn default_config_text_matches_defaults() {
        assert_eq!(AppConfig::from_contents(DEFAULT_CONFIG), AppConfig::default());
    }

    #[test]
    fn debounce_parses_and_clamps() {
        let defaults = AppConfig::from_contents("");
        assert_eq!(defaults.search_debounce_ms, 400);

        let custom = AppConfig::from_contents("search_debounce_ms = 150\n");
        assert_eq!(custom.controller_config().debounce, Duration::from_millis(150));

        let clamped = AppConfig::from_contents("search_debounce_ms = 99999\n");
        assert_eq!(clamped.search_debounce_ms, 5_000);

        let invalid = AppConfig::from_contents("search_debounce_ms = soon\n");
        assert_eq!(invalid.search_debounce_ms, 400);
    }

    #[test]
    fn limits_parse_and_clamp() {
        let config = AppConfig::from_contents(
            "search_max_matches = 0\n\
             closed_tab_retention = 5000\n\
             MAX_TABS = 1000\n",
        );
        assert_eq!(config.search_max_matches, 1);
        assert_eq!(config.closed_tab_retention, 1_000);
        assert_eq!(config.max_tabs, 500);

        let zero = AppConfig::from_contents("closed_tab_retention = 0\nmax_tabs = 0\n");
        assert_eq!(zero.closed_tab_retention, 0);
        assert_eq!(zero.max_tabs, 1);
    }

    #[test]
    fn search_toggles_feed_options() {
        let config = AppConfig::from_contents(
            "search_case_sensitive = yes\n\
             search_whole_word = on\n\
             search_use_regex = 1\n\
             search_include_closed = false\n",
        );
        let options = config.search_options();
        assert!(options.case_sensitive);
        assert!(options.whole_word);
        assert!(options.use_regex);
        assert!(!options.include_deleted);

        let invalid = AppConfig::from_contents("search_use_regex = maybe\n");
        assert!(!invalid.search_use_regex);
    }

    #[test]
    fn session_file_accepts_quotes_and_unset() {
        let quoted = AppConfig::from_contents("session_file = \"/tmp/my session.json\"\n");
        assert_eq!(quoted.session_file, Some(PathBuf::from("/tmp/my session.json")));

        let unset = AppConfig::from_contents("session_file = none\n");
        assert_eq!(unset.session_file, None);
    }

    #[test]
    fn string_values_trim_quotes() {
        assert_eq!(parse_string_value("  'x'  ").as_deref(), Some("x"));
        assert_eq!(parse_string_value("\"\""), None);
        assert_eq!(parse_string_value("\""), Some("\"".to_string()));
    }
}
