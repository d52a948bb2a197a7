use std::fmt::Write as _;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::pin::pin;
use std::time::Instant;

use anyhow::{Context, Result};
use flume::Receiver;
use futures::future::{Either, select};
use querydesk_search::{BufferEvent, ClickKind, Direction, SearchController};
use querydesk_workspace::{Session, TabKind, Workspace, render_panel};

use crate::APP_VERSION;
use crate::commands::{self, ConsoleCommand};
use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Workspace plus search panel, driven one command at a time.
pub struct Console {
    workspace: Workspace,
    controller: SearchController,
    events: Receiver<BufferEvent>,
    session_file: Option<PathBuf>,
    rendered_generation: u64,
    panel_dirty: bool,
}

impl Console {
    pub fn new(config: &AppConfig, mut workspace: Workspace, session_file: Option<PathBuf>) -> Self {
        let events = workspace.subscribe();
        Self {
            workspace,
            controller: SearchController::new(config.controller_config()),
            events,
            session_file,
            rendered_generation: 0,
            panel_dirty: false,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn controller(&self) -> &SearchController {
        &self.controller
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.controller.deadline()
    }

    pub fn handle(&mut self, command: ConsoleCommand, now: Instant) -> Result<Flow> {
        match command {
            ConsoleCommand::Find(query) => self.controller.set_query(&query, now),
            ConsoleCommand::Enter => self.controller.submit(&self.workspace),
            ConsoleCommand::SetOption(option, value) => self.controller.set_option(option, value, now),
            ConsoleCommand::Next => self.navigate(Direction::Next),
            ConsoleCommand::Prev => self.navigate(Direction::Prev),
            ConsoleCommand::Click(entry) => self.click(entry, ClickKind::Single),
            ConsoleCommand::DoubleClick(entry) => self.click(entry, ClickKind::Double),
            ConsoleCommand::Toggle(entry) => self.toggle(entry),
            ConsoleCommand::New(title) => {
                let id = self.workspace.open_tab(title.as_deref(), "")?;
                println!("opened tab {id}");
            }
            ConsoleCommand::Edit(id, text) => self.workspace.edit(id, &text)?,
            ConsoleCommand::Close(id) => self.workspace.close_tab(id)?,
            ConsoleCommand::Activate(id) => self.workspace.activate(id)?,
            ConsoleCommand::Tabs => print!("{}", self.render_tabs()),
            ConsoleCommand::Results => self.panel_dirty = true,
            ConsoleCommand::Help => print!("{}", render_help()),
            ConsoleCommand::Quit => return Ok(Flow::Quit),
        }

        self.pump_events(now);
        Ok(Flow::Continue)
    }

    /// Runs a due search cycle.
    pub fn tick(&mut self, now: Instant) {
        self.pump_events(now);
        self.controller.poll(&self.workspace, now);
    }

    /// The panel text when something changed since the last call.
    pub fn take_render(&mut self) -> Option<String> {
        let generation = self.controller.generation();
        if generation == self.rendered_generation && !self.panel_dirty {
            return None;
        }

        self.rendered_generation = generation;
        self.panel_dirty = false;
        Some(render_panel(
            self.controller.results(),
            self.controller.navigator(),
            self.controller.preview(),
        ))
    }

    pub fn save_session(&self) -> Result<()> {
        let Some(path) = &self.session_file else {
            return Ok(());
        };

        Session::capture(&self.workspace)
            .save(path)
            .with_context(|| format!("saving session to {}", path.display()))?;
        log::info!("saved session to {}", path.display());
        Ok(())
    }

    fn pump_events(&mut self, now: Instant) {
        for event in self.events.try_iter() {
            self.controller.buffers_changed(event, now);
        }
    }

    fn navigate(&mut self, direction: Direction) {
        if self.controller.navigate(direction).is_some() {
            self.panel_dirty = true;
        }
    }

    fn click(&mut self, entry: Option<usize>, click: ClickKind) {
        let activated = match entry {
            Some(number) => self.controller.activate(&mut self.workspace, number - 1, click),
            None => self.controller.activate_active(&mut self.workspace, click),
        };

        if activated {
            self.panel_dirty = true;
        } else {
            log::debug!("click on {entry:?} had no effect");
        }
    }

    fn toggle(&mut self, entry: usize) {
        let buffer_id = self
            .controller
            .navigator()
            .entries()
            .get(entry - 1)
            .and_then(|target| self.controller.results().groups.get(target.group()))
            .map(|group| group.buffer_id);

        if let Some(buffer_id) = buffer_id {
            self.controller.toggle_group(buffer_id);
            self.panel_dirty = true;
        }
    }

    fn render_tabs(&self) -> String {
        let mut out = String::new();
        let active = self.workspace.active();
        for tab in self.workspace.tabs() {
            let cursor = if active == Some(tab.id) { '*' } else { ' ' };
            let kind = match self.workspace.tab_kind(tab.id) {
                Some(TabKind::Preview) => " (preview)",
                _ => "",
            };
            let _ = writeln!(out, "{cursor} {:>3}  {}{kind}", tab.id, tab.title);
        }

        let mut closed: Vec<_> = self.workspace.closed_tabs().iter().collect();
        closed.sort_by_key(|tab| std::cmp::Reverse(tab.closed_at_seq()));
        for tab in closed {
            let _ = writeln!(out, "  {:>3}  {} [closed]", tab.id, tab.title);
        }
        out
    }
}

fn render_help() -> String {
    let mut out = String::new();
    for spec in commands::specs() {
        let _ = writeln!(out, "  {:<40} {}", spec.usage, spec.summary);
    }
    out.push_str("  lines without a leading / search for the line itself\n");
    out
}

/// Restores the session at `path` when it exists, otherwise starts with one
/// empty tab.
pub fn load_workspace(config: &AppConfig, path: Option<&Path>) -> Result<Workspace> {
    if let Some(path) = path
        && path.exists()
    {
        let session = Session::load(path)?;
        return session
            .into_workspace(config.closed_tab_retention, config.max_tabs)
            .with_context(|| format!("restoring session from {}", path.display()));
    }

    let mut workspace = Workspace::new(config.closed_tab_retention, config.max_tabs);
    workspace.open_tab(None, "")?;
    Ok(workspace)
}

/// Forwards stdin lines until EOF.
pub fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = flume::unbounded();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    log::warn!("stopped reading stdin: {error}");
                    break;
                }
            }
        }
    });
    rx
}

enum Wake {
    Line(String),
    Closed,
    Deadline,
}

async fn next_wake(lines: &Receiver<String>, deadline: Option<Instant>) -> Wake {
    let line = lines.recv_async();
    let Some(deadline) = deadline else {
        return line.await.map(Wake::Line).unwrap_or(Wake::Closed);
    };

    match select(pin!(line), pin!(smol::Timer::at(deadline))).await {
        Either::Left((line, _)) => line.map(Wake::Line).unwrap_or(Wake::Closed),
        Either::Right(_) => Wake::Deadline,
    }
}

pub async fn run(mut console: Console, lines: Receiver<String>) -> Result<()> {
    println!("querydesk {APP_VERSION}. Type /help for commands.");

    loop {
        match next_wake(&lines, console.deadline()).await {
            Wake::Line(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let now = Instant::now();
                match ConsoleCommand::parse(&line).and_then(|command| console.handle(command, now)) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break,
                    Err(error) => println!("error: {error:#}"),
                }
            }
            Wake::Deadline => console.tick(Instant::now()),
            Wake::Closed => break,
        }

        if let Some(panel) = console.take_render() {
            print!("{panel}");
        }
    }

    console.save_session()
}
