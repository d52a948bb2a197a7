use std::fmt::Write as _;
use std::path::Path;

use querydesk_search::{DEFAULT_CLOSED_RETENTION, DEFAULT_DEBOUNCE, DEFAULT_MAX_MATCHES, SearchOptions};
use querydesk_workspace::DEFAULT_MAX_TABS;

use crate::config::config_path;

pub fn run() {
    let Some(path) = config_path() else {
        eprintln!("Could not determine config directory");
        return;
    };

    match describe(&path) {
        Ok(text) => print!("{text}"),
        Err(error) => eprintln!("Failed to read config file: {error}"),
    }
}

/// The config file as it would be shown, falling back to the built-in
/// defaults when the file is missing or empty.
fn describe(path: &Path) -> std::io::Result<String> {
    let mut out = String::new();

    if !path.exists() {
        let _ = writeln!(out, "# Config file: {} (not created yet)", path.display());
        out.push_str("# Using default configuration\n\n");
        out.push_str(&default_values());
        return Ok(out);
    }

    let contents = std::fs::read_to_string(path)?;
    let _ = writeln!(out, "# Config file: {}\n", path.display());
    if contents.trim().is_empty() {
        out.push_str("# (empty file - using defaults)\n\n");
        out.push_str(&default_values());
    } else {
        out.push_str(&contents);
        if !contents.ends_with('\n') {
            out.push('\n');
        }
    }
    Ok(out)
}

fn default_values() -> String {
    let options = SearchOptions::default();
    let settings = [
        ("search_debounce_ms", DEFAULT_DEBOUNCE.as_millis().to_string()),
        ("search_max_matches", DEFAULT_MAX_MATCHES.to_string()),
        ("search_case_sensitive", options.case_sensitive.to_string()),
        ("search_whole_word", options.whole_word.to_string()),
        ("search_use_regex", options.use_regex.to_string()),
        ("search_include_closed", options.include_deleted.to_string()),
        ("closed_tab_retention", DEFAULT_CLOSED_RETENTION.to_string()),
        ("max_tabs", DEFAULT_MAX_TABS.to_string()),
    ];

    let mut out = String::from("# Default values:\n");
    for (key, value) in settings {
        let _ = writeln!(out, "{key} = {value}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::validate_config::validate;

    #[test]
    fn test_defaults_follow_library_constants() {
        let defaults = default_values();
        assert!(defaults.contains(&format!("search_debounce_ms = {}\n", DEFAULT_DEBOUNCE.as_millis())));
        assert!(defaults.contains(&format!("closed_tab_retention = {DEFAULT_CLOSED_RETENTION}\n")));
        assert!(defaults.contains("search_include_closed = true\n"));

        let report = validate(&defaults);
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_missing_file_shows_defaults() {
        let path = std::env::temp_dir().join("querydesk-show-config-missing/config.txt");
        let text = describe(&path).unwrap();
        assert!(text.contains("(not created yet)"));
        assert!(text.ends_with(&default_values()));
    }
}
