use anyhow::{Context, Result, anyhow, bail};
use querydesk_search::{BufferId, SearchOption};

/// One line typed into the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Replaces the query. An empty query clears the panel.
    Find(String),
    /// Searches right away instead of waiting out the debounce.
    Enter,
    SetOption(SearchOption, bool),
    Next,
    Prev,
    /// 1-based panel entry, or the active entry when absent.
    Click(Option<usize>),
    DoubleClick(Option<usize>),
    Toggle(usize),
    New(Option<String>),
    Edit(BufferId, String),
    Close(BufferId),
    Activate(BufferId),
    Tabs,
    Results,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
}

const fn command(name: &'static str, usage: &'static str, summary: &'static str) -> CommandSpec {
    CommandSpec {
        name,
        usage,
        summary,
    }
}

const COMMANDS: &[CommandSpec] = &[
    command("find", "/find <text>", "search all tabs (empty clears)"),
    command("enter", "/enter", "search now"),
    command(
        "opt",
        "/opt <caseSensitive|wholeWord|useRegex|includeDeleted> <on|off>",
        "set a search toggle",
    ),
    command("next", "/next", "move to the next result"),
    command("prev", "/prev", "move to the previous result"),
    command("click", "/click [n]", "open result n (preview for closed tabs)"),
    command("dblclick", "/dblclick [n]", "open result n as a permanent tab"),
    command("toggle", "/toggle <n>", "collapse or expand the group of result n"),
    command("new", "/new [title]", "open a new tab"),
    command("edit", "/edit <id> <text>", "replace a tab's text (\\n for newlines)"),
    command("close", "/close <id>", "close a tab"),
    command("activate", "/activate <id>", "focus a tab from the tab strip"),
    command("tabs", "/tabs", "list open and closed tabs"),
    command("results", "/results", "print the results panel"),
    command("help", "/help", "show this list"),
    command("quit", "/quit", "save the session and exit"),
];

pub fn specs() -> &'static [CommandSpec] {
    COMMANDS
}

impl ConsoleCommand {
    /// Lines without a leading `/` are treated as `/find <line>`.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(command) = line.strip_prefix('/') else {
            return Ok(Self::Find(line.to_string()));
        };

        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest),
            None => (command, ""),
        };
        let args = rest.trim();

        match name.to_ascii_lowercase().as_str() {
            // keep the raw text so leading spaces can be searched for
            "find" => Ok(Self::Find(rest.to_string())),
            "enter" => Ok(Self::Enter),
            "opt" | "option" => parse_option(args),
            "next" | "n" => Ok(Self::Next),
            "prev" | "p" => Ok(Self::Prev),
            "click" => Ok(Self::Click(parse_optional_entry(args)?)),
            "dblclick" | "doubleclick" => Ok(Self::DoubleClick(parse_optional_entry(args)?)),
            "toggle" => Ok(Self::Toggle(parse_entry(args)?)),
            "new" => Ok(Self::New((!args.is_empty()).then(|| args.to_string()))),
            "edit" => {
                let (id, text) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
                Ok(Self::Edit(parse_buffer_id(id)?, unescape(text.trim_start())))
            }
            "close" => Ok(Self::Close(parse_buffer_id(args)?)),
            "activate" | "focus" => Ok(Self::Activate(parse_buffer_id(args)?)),
            "tabs" => Ok(Self::Tabs),
            "results" => Ok(Self::Results),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            _ => bail!("unknown command /{name} (try /help)"),
        }
    }
}

fn parse_option(args: &str) -> Result<ConsoleCommand> {
    let mut parts = args.split_whitespace();
    let name = parts.next().context("missing option name")?;
    let option = SearchOption::from_name(name).ok_or_else(|| anyhow!("unknown option {name:?}"))?;
    let value = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        Some("on" | "true" | "1" | "yes") => true,
        Some("off" | "false" | "0" | "no") => false,
        Some(other) => bail!("expected on or off, got {other:?}"),
        None => bail!("missing value for {}", option.name()),
    };
    Ok(ConsoleCommand::SetOption(option, value))
}

fn parse_entry(args: &str) -> Result<usize> {
    let number: usize = args
        .parse()
        .with_context(|| format!("invalid result number {args:?}"))?;
    if number == 0 {
        bail!("result numbers start at 1");
    }
    Ok(number)
}

fn parse_optional_entry(args: &str) -> Result<Option<usize>> {
    if args.is_empty() {
        Ok(None)
    } else {
        parse_entry(args).map(Some)
    }
}

fn parse_buffer_id(args: &str) -> Result<BufferId> {
    args.parse::<u64>()
        .map(BufferId)
        .with_context(|| format!("invalid tab id {args:?}"))
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
