use crate::config::config_path;

const VALID_KEYS: &[&str] = &[
    "search_debounce_ms",
    "search_max_matches",
    "search_case_sensitive",
    "search_whole_word",
    "search_use_regex",
    "search_include_closed",
    "search_include_deleted",
    "closed_tab_retention",
    "max_tabs",
    "session_file",
];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn run() {
    let path = match config_path() {
        Some(p) => p,
        None => {
            eprintln!("Could not determine config directory");
            std::process::exit(1);
        }
    };

    println!("Config file: {}", path.display());

    if !path.exists() {
        println!("Status: File does not exist (using defaults)");
        println!("Result: Valid");
        return;
    }

    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            println!("Status: Failed to read file");
            println!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let report = validate(&contents);

    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("Status: Valid");
        return;
    }

    if !report.errors.is_empty() {
        println!();
        println!("Errors:");
        for error in &report.errors {
            println!("  {}", error);
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  {}", warning);
        }
    }

    println!();
    if report.errors.is_empty() {
        println!("Result: Valid (with warnings)");
    } else {
        println!("Result: Invalid");
        std::process::exit(1);
    }
}

pub fn validate(contents: &str) -> Report {
    let mut report = Report::default();

    for (line_num, line) in contents.lines().enumerate() {
        let line_num = line_num + 1;
        let trimmed = line.trim();

        // Skip empty lines and comments
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            report.errors.push(format!(
                "Line {}: Invalid syntax. Expected 'key = value'",
                line_num
            ));
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        if !VALID_KEYS.contains(&key.as_str()) {
            report
                .warnings
                .push(format!("Line {}: Unknown key '{}'", line_num, key));
            continue;
        }

        match key.as_str() {
            "search_case_sensitive"
            | "search_whole_word"
            | "search_use_regex"
            | "search_include_closed"
            | "search_include_deleted" => {
                let lowered = value.to_ascii_lowercase();
                if !["true", "false", "1", "0", "yes", "no", "on", "off"].contains(&lowered.as_str()) {
                    report.errors.push(format!(
                        "Line {}: {} must be 'true' or 'false'",
                        line_num, key
                    ));
                }
            }
            "search_debounce_ms" => check_range(&mut report, line_num, &key, value, 0, 5_000),
            "closed_tab_retention" => check_range(&mut report, line_num, &key, value, 0, 1_000),
            "search_max_matches" => check_range(&mut report, line_num, &key, value, 1, 1_000_000),
            "max_tabs" => check_range(&mut report, line_num, &key, value, 1, 500),
            _ => {}
        }
    }

    report
}

fn check_range(report: &mut Report, line_num: usize, key: &str, value: &str, min: u64, max: u64) {
    match value.parse::<u64>() {
        Ok(v) if (min..=max).contains(&v) => {}
        Ok(v) => report.warnings.push(format!(
            "Line {}: {} = {} is outside {}..={} and will be clamped",
            line_num, key, v, min, max
        )),
        Err(_) => report.errors.push(format!(
            "Line {}: {} must be a non-negative integer",
            line_num, key
        )),
    }
}
