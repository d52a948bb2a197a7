use std::time::{Duration, Instant};

use crate::catalog::{BufferCatalog, BufferEvent, BufferHost, BufferId, DEFAULT_CLOSED_RETENTION};
use crate::engine::{DEFAULT_MAX_MATCHES, SearchConfig, SearchEngine};
use crate::pattern::{SearchOption, SearchOptions};
use crate::results::{Direction, Navigator, ResultRef, ResultSet, Target};
use crate::selection::{Activation, ClickKind, SelectionBridge};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Where the controller is in one search cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Debouncing { deadline: Instant },
    Searching,
    Settled,
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub debounce: Duration,
    pub max_matches: usize,
    pub closed_retention: usize,
    pub options: SearchOptions,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            max_matches: DEFAULT_MAX_MATCHES,
            closed_retention: DEFAULT_CLOSED_RETENTION,
            options: SearchOptions::default(),
        }
    }
}

/// Manages the search session lifecycle: debounces triggers, runs the engine
/// against fresh snapshots and routes clicks to the selection bridge.
///
/// Time is passed in by the caller, so the owner decides how to wait for
/// [`SearchController::deadline`].
pub struct SearchController {
    engine: SearchEngine,
    catalog: BufferCatalog,
    bridge: SelectionBridge,
    navigator: Navigator,
    results: ResultSet,
    query: String,
    options: SearchOptions,
    debounce: Duration,
    state: ControllerState,
    generation: u64,
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

impl SearchController {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            engine: SearchEngine::new(SearchConfig {
                max_matches: config.max_matches,
            }),
            catalog: BufferCatalog::new(config.closed_retention),
            bridge: SelectionBridge::new(),
            navigator: Navigator::new(),
            results: ResultSet::empty(),
            query: String::new(),
            options: config.options,
            debounce: config.debounce,
            state: ControllerState::Idle,
            generation: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// The last settled result set. Stays visible while a new cycle debounces.
    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn preview(&self) -> Option<BufferId> {
        self.bridge.preview()
    }

    /// Bumped every time a new result set is published.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    pub fn catalog(&self) -> &BufferCatalog {
        &self.catalog
    }

    pub fn set_closed_retention(&mut self, retention: usize) {
        self.catalog.set_retention(retention);
    }

    pub fn set_max_matches(&mut self, max_matches: usize) {
        self.engine.set_config(SearchConfig { max_matches });
    }

    /// Pending debounce deadline, if a cycle is waiting to run.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            ControllerState::Debouncing { deadline } => Some(deadline),
            _ => None,
        }
    }

    pub fn set_query(&mut self, query: &str, now: Instant) {
        if query == self.query {
            return;
        }

        self.query = query.to_string();
        if self.query.is_empty() {
            // no engine run: clearing is never an error
            self.publish(ResultSet::empty());
            return;
        }

        self.schedule(now);
    }

    pub fn set_option(&mut self, option: SearchOption, value: bool, now: Instant) {
        if self.options.get(option) == value {
            return;
        }

        self.options = self.options.with(option, value);
        log::debug!("search option {} set to {value}", option.name());
        if !self.query.is_empty() {
            self.schedule(now);
        }
    }

    pub fn toggle_option(&mut self, option: SearchOption, now: Instant) {
        let value = !self.options.get(option);
        self.set_option(option, value, now);
    }

    /// Searches right away, skipping the quiet period.
    pub fn submit<H: BufferHost + ?Sized>(&mut self, host: &H) {
        self.run(host);
    }

    /// Any buffer mutation schedules a fresh cycle while a query is active.
    pub fn buffers_changed(&mut self, event: BufferEvent, now: Instant) {
        self.bridge.observe(&event);
        if !self.query.is_empty() {
            log::trace!("{event:?} retriggers search");
            self.schedule(now);
        }
    }

    /// Runs the pending cycle once its deadline has passed. Returns whether a
    /// new result set was published.
    pub fn poll<H: BufferHost + ?Sized>(&mut self, host: &H, now: Instant) -> bool {
        match self.state {
            ControllerState::Debouncing { deadline } if now >= deadline => {
                self.run(host);
                true
            }
            _ => false,
        }
    }

    pub fn navigate(&mut self, direction: Direction) -> Option<ResultRef> {
        self.navigator.navigate(direction)
    }

    pub fn select(&mut self, index: usize) -> Option<ResultRef> {
        self.navigator.select(index)
    }

    pub fn active_target(&self) -> Option<Target<'_>> {
        self.navigator
            .active()
            .and_then(|entry| self.results.get(entry))
    }

    pub fn toggle_group(&mut self, buffer_id: BufferId) -> bool {
        self.navigator.toggle_group(&self.results, buffer_id)
    }

    /// Clicks the navigator entry at `index`. Double clicking the header of a
    /// group with content hits folds it instead of opening the buffer.
    pub fn activate<H: BufferHost + ?Sized>(
        &mut self,
        host: &mut H,
        index: usize,
        click: ClickKind,
    ) -> bool {
        let Some(entry) = self.navigator.select(index) else {
            return false;
        };
        let Some(target) = self.results.get(entry) else {
            return false;
        };

        if let (ClickKind::Double, Target::Header(group)) = (click, target)
            && !group.matches.is_empty()
        {
            let buffer_id = group.buffer_id;
            self.toggle_group(buffer_id);
            return true;
        }

        let activation = Activation::from(target);
        self.bridge.activate(host, activation, click)
    }

    /// Clicks whatever entry keyboard navigation currently rests on.
    pub fn activate_active<H: BufferHost + ?Sized>(&mut self, host: &mut H, click: ClickKind) -> bool {
        match self.navigator.active_index() {
            Some(index) => self.activate(host, index, click),
            None => false,
        }
    }

    fn schedule(&mut self, now: Instant) {
        self.state = ControllerState::Debouncing {
            deadline: now + self.debounce,
        };
    }

    fn run<H: BufferHost + ?Sized>(&mut self, host: &H) {
        if self.query.is_empty() {
            self.publish(ResultSet::empty());
            return;
        }

        self.state = ControllerState::Searching;
        let snapshot = self.catalog.snapshot(host);
        let results = self.engine.run(&snapshot, &self.query, &self.options);
        self.publish(results);
    }

    fn publish(&mut self, results: ResultSet) {
        self.results = results;
        self.navigator.rebuild(&self.results);
        self.state = ControllerState::Settled;
        self.generation = self.generation.wrapping_add(1);
    }
}
