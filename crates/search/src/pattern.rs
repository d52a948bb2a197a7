use regex::{Regex, RegexBuilder};

use crate::error::CompileError;

/// Toggles that shape how a query is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub use_regex: bool,
    pub include_deleted: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            whole_word: false,
            use_regex: false,
            include_deleted: true,
        }
    }
}

impl SearchOptions {
    pub fn get(&self, option: SearchOption) -> bool {
        match option {
            SearchOption::CaseSensitive => self.case_sensitive,
            SearchOption::WholeWord => self.whole_word,
            SearchOption::UseRegex => self.use_regex,
            SearchOption::IncludeDeleted => self.include_deleted,
        }
    }

    pub fn with(mut self, option: SearchOption, value: bool) -> Self {
        match option {
            SearchOption::CaseSensitive => self.case_sensitive = value,
            SearchOption::WholeWord => self.whole_word = value,
            SearchOption::UseRegex => self.use_regex = value,
            SearchOption::IncludeDeleted => self.include_deleted = value,
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchOption {
    CaseSensitive,
    WholeWord,
    UseRegex,
    IncludeDeleted,
}

impl SearchOption {
    pub const ALL: [SearchOption; 4] = [
        Self::CaseSensitive,
        Self::WholeWord,
        Self::UseRegex,
        Self::IncludeDeleted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::CaseSensitive => "caseSensitive",
            Self::WholeWord => "wholeWord",
            Self::UseRegex => "useRegex",
            Self::IncludeDeleted => "includeDeleted",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        let normalized = value.trim().replace(['_', '-'], "").to_ascii_lowercase();
        match normalized.as_str() {
            "casesensitive" | "case" | "matchcase" => Some(Self::CaseSensitive),
            "wholeword" | "word" => Some(Self::WholeWord),
            "useregex" | "regex" => Some(Self::UseRegex),
            "includedeleted" | "includeclosed" | "closed" => Some(Self::IncludeDeleted),
            _ => None,
        }
    }
}

/// Half-open byte range `[start, end)` of a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A compiled query, ready to scan text.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
}

impl Matcher {
    pub fn compile(query: &str, options: &SearchOptions) -> Result<Self, CompileError> {
        if query.is_empty() {
            return Err(CompileError::EmptyQuery);
        }

        let body = if options.use_regex {
            // Validate the user's pattern on its own first so that wrapping it
            // in a group can never repair an unbalanced expression.
            if options.whole_word {
                build(query, options.case_sensitive).map_err(|e| syntax_error(query, &e))?;
            }
            query.to_string()
        } else {
            escape_literal(query)
        };

        let pattern = if options.whole_word {
            format!(r"\b(?:{body})\b")
        } else {
            body
        };

        let regex = build(&pattern, options.case_sensitive).map_err(|e| syntax_error(query, &e))?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Non-overlapping, leftmost-first hits scanning left to right.
    /// Zero-width hits are skipped.
    pub fn find_all<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Span> + 'a {
        self.regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| Span::new(m.start(), m.end()))
    }

    pub fn find_first(&self, text: &str) -> Option<Span> {
        self.find_all(text).next()
    }
}

pub fn compile(query: &str, options: &SearchOptions) -> Result<Matcher, CompileError> {
    Matcher::compile(query, options)
}

/// Escapes every regex metacharacter in `literal`, one character at a time.
pub fn escape_literal(literal: &str) -> String {
    regex::escape(literal)
}

fn build(pattern: &str, case_sensitive: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
}

fn syntax_error(query: &str, error: &regex::Error) -> CompileError {
    let rendered = error.to_string();
    // Syntax errors render as a multi-line report ending in `error: <reason>`.
    let reason = rendered
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix("error: "))
        .or_else(|| rendered.lines().next())
        .unwrap_or("invalid pattern")
        .to_string();

    CompileError::RegexSyntax {
        message: format!("SyntaxError: Invalid regular expression: /{query}/: {reason}"),
    }
}
