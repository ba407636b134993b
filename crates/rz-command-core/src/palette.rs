use crate::{Error, Result};
use crate::config::CommandConfig;
use crate::host::HostElement;
use crate::registry::{Candidate, Registry};
use crate::render::{ListRenderer, RowTemplates, Surface};
use crate::search::{FilterOptions, FilterPipeline};
use crate::selection::{SelectionChange, SelectionController};
use crate::source::{FetchCoordinator, FetchOutcome, HttpSource, ItemSource};
use crate::window::ResultWindow;
use rz_command_types::{CandidateSpec, CommandEvent, ElementTemplate, FetchTrigger, Key};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

/// A command palette: candidate registry, filtering, selection, remote
/// loading and row rendering owned by one instance.
///
/// Every mutation runs synchronously in the fixed order
/// filter, rebuild indexes, resync selection, render.
pub struct CommandPalette<V: Surface, S: ItemSource = HttpSource> {
    config: CommandConfig,
    registry: Registry,
    pipeline: FilterPipeline,
    window: ResultWindow,
    selection: SelectionController,
    renderer: ListRenderer<V>,
    fetch: Option<FetchCoordinator<S>>,
    query: String,

    /// Last remote loading failure, cleared by the next successful fetch
    fetch_error: Option<String>,

    /// Rendering configuration problem, cleared by the next clean render
    config_error: Option<String>,

    events_tx: UnboundedSender<CommandEvent>,
}

impl<V: Surface> CommandPalette<V, HttpSource> {
    /// Create a palette that loads remote items over HTTP when
    /// `config.items_url` is set. Returns the palette and its event receiver.
    ///
    /// An items URL that does not parse disables remote loading and is
    /// reported through [`Self::error`]; inline and static items still work.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: CommandConfig,
        surface: V,
    ) -> Result<(Self, UnboundedReceiver<CommandEvent>)> {
        let mut source_error = None;
        let source = match config.items_url.as_deref() {
            Some(url) => match HttpSource::new(url, config.query_param.clone()) {
                Ok(source) => Some(source),
                Err(e @ Error::InvalidUrl(_)) => {
                    error!("Remote loading disabled: {}", e);
                    source_error = Some(e.user_message());
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        let (mut palette, events) = Self::from_parts(config, surface, source);
        palette.fetch_error = source_error;
        Ok((palette, events))
    }
}

impl<V: Surface, S: ItemSource> CommandPalette<V, S> {
    /// Create a palette over an explicit item source. The source is only
    /// used when `config.items_url` is set.
    pub fn with_source(
        config: CommandConfig,
        surface: V,
        source: Option<S>,
    ) -> (Self, UnboundedReceiver<CommandEvent>) {
        let source = match (source, config.items_url.is_some()) {
            (Some(source), true) => Some(source),
            (Some(_), false) => {
                warn!("item source supplied but no items URL configured; remote loading disabled");
                None
            }
            (None, true) => {
                warn!("items URL configured but no item source supplied; remote loading disabled");
                None
            }
            (None, false) => None,
        };
        Self::from_parts(config, surface, source)
    }

    fn from_parts(
        config: CommandConfig,
        surface: V,
        source: Option<S>,
    ) -> (Self, UnboundedReceiver<CommandEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let fetch = source.map(|s| {
            FetchCoordinator::new(Arc::new(s), Duration::from_millis(config.debounce_ms))
        });

        let palette = Self {
            selection: SelectionController::new(
                config.selected_value.clone(),
                config.loop_navigation,
            ),
            config,
            registry: Registry::default(),
            pipeline: FilterPipeline::new(),
            window: ResultWindow::default(),
            renderer: ListRenderer::new(surface, RowTemplates::default()),
            fetch,
            query: String::new(),
            fetch_error: None,
            config_error: None,
            events_tx,
        };
        (palette, events_rx)
    }

    /// Load templates and declared items from the host, start an immediate
    /// fetch when configured, and render once.
    ///
    /// With an item source and the `immediate` trigger this spawns a tokio
    /// task, so it must run inside a runtime.
    pub fn mount(&mut self, host: HostElement) {
        let static_items = host.parse_static_items();
        let HostElement {
            items,
            data_template,
            headings,
            ..
        } = host;

        self.renderer.set_data_template(data_template);
        for (group, template) in headings {
            self.renderer.set_heading(group, template);
        }

        let inline = self.registry.register(items, false);
        let statics = self.registry.register(static_items, true);
        info!("Mounted palette with {} inline and {} static items", inline, statics);

        if self.config.fetch_trigger == FetchTrigger::Immediate {
            self.start_fetch();
        }

        self.refresh();
    }

    /// Register candidates. Filtering runs afterwards unless suppressed or
    /// server filtering is on. Returns how many were added.
    pub fn register(&mut self, specs: Vec<CandidateSpec>, suppress_filter: bool) -> usize {
        let added = self.registry.register(specs, false);
        if !suppress_filter && !self.config.server_filtering {
            self.refresh();
        }
        added
    }

    /// Register one inline candidate and refilter. Returns its id if added.
    pub fn register_one(&mut self, spec: CandidateSpec) -> Option<String> {
        let id = self.registry.register_one(spec, false);
        if id.is_some() && !self.config.server_filtering {
            self.refresh();
        }
        id
    }

    /// Remove a candidate and refilter. Returns whether it existed.
    pub fn unregister(&mut self, id: &str) -> bool {
        let removed = self.registry.unregister(id);
        self.refresh();
        removed
    }

    pub fn set_heading(&mut self, group: impl Into<String>, template: ElementTemplate) {
        self.renderer.set_heading(group, template);
        self.render();
    }

    /// Update the query: a debounced fetch under server filtering, otherwise
    /// an immediate local refilter.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();

        if self.config.server_filtering
            && let Some(fetch) = self.fetch.as_mut()
        {
            fetch.take_open_trigger();
            let query = server_query(&self.query);
            debug!("Query changed, scheduling fetch for {:?}", query);
            fetch.fetch_debounced(query);
            return;
        }

        self.open();
        self.refresh();
    }

    /// First interaction that opens the list. Starts the lazy fetch when the
    /// trigger is `on-open`; later calls do nothing. Returns whether a fetch
    /// started.
    pub fn open(&mut self) -> bool {
        if self.config.fetch_trigger != FetchTrigger::OnOpen {
            return false;
        }
        let query = self.server_query();
        let Some(fetch) = self.fetch.as_mut() else {
            return false;
        };
        if !fetch.take_open_trigger() {
            return false;
        }
        fetch.fetch_now(query);
        true
    }

    pub fn next(&mut self) -> bool {
        let change = self.selection.next(&self.window);
        self.apply_selection(change)
    }

    pub fn previous(&mut self) -> bool {
        let change = self.selection.previous(&self.window);
        self.apply_selection(change)
    }

    pub fn first(&mut self) -> bool {
        let change = self.selection.first(&self.window);
        self.apply_selection(change)
    }

    pub fn last(&mut self) -> bool {
        let change = self.selection.last(&self.window);
        self.apply_selection(change)
    }

    /// Keyboard handling. Returns whether the key did anything.
    pub fn handle_key(&mut self, key: Key) -> bool {
        match key {
            Key::ArrowDown => {
                self.open();
                self.next()
            }
            Key::ArrowUp => {
                self.open();
                self.previous()
            }
            Key::Home => self.first(),
            Key::End => self.last(),
            Key::Enter => self.execute_active(),
        }
    }

    /// Pointer over a row: make it active without executing
    pub fn hover(&mut self, id: &str) -> bool {
        let Some(index) = self.window.index_of_id(id) else {
            return false;
        };
        let change = self.selection.set_active_index(index, &self.window);
        self.apply_selection(change)
    }

    /// Click on a row: make it active and execute it
    pub fn click(&mut self, id: &str) -> bool {
        let Some(index) = self.window.index_of_id(id) else {
            return false;
        };
        let Some(change) = self.selection.set_active_index(index, &self.window) else {
            return false;
        };
        self.apply_selection(Some(change));
        self.execute_active()
    }

    /// Emit `Execute` for the active row, if it is enabled
    pub fn execute_active(&mut self) -> bool {
        let Some(candidate) = self.active_candidate() else {
            return false;
        };
        if candidate.disabled {
            return false;
        }
        let value = candidate.value.clone();
        debug!("Executing {}", value);
        self.emit(CommandEvent::Execute { value });
        true
    }

    /// Host-side write of the selected value. Moves the active row when the
    /// value is listed; never echoes a `SelectionChanged` back.
    pub fn set_selected_value(&mut self, value: Option<String>) {
        let change = self.selection.set_active_value(value, &self.window);
        self.apply_selection(Some(change));
    }

    /// Wait for the latest fetch to finish and apply it. Returns false when
    /// nothing was pending.
    pub async fn next_fetch(&mut self) -> bool {
        let Some(fetch) = self.fetch.as_mut() else {
            return false;
        };
        let Some(outcome) = fetch.next_outcome().await else {
            return false;
        };
        self.apply_fetch(outcome);
        true
    }

    /// Apply fetches until nothing is loading
    pub async fn settle(&mut self) {
        while self.next_fetch().await {}
    }

    /// Apply any fetch that already finished, without waiting
    pub fn drain_fetches(&mut self) -> bool {
        let Some(outcome) = self.fetch.as_mut().and_then(FetchCoordinator::try_next_outcome)
        else {
            return false;
        };
        self.apply_fetch(outcome);
        true
    }

    #[must_use]
    pub fn config(&self) -> &CommandConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn window(&self) -> &ResultWindow {
        &self.window
    }

    #[must_use]
    pub fn total_matches(&self) -> usize {
        self.window.total_matches()
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.selection.active_index()
    }

    #[must_use]
    pub fn active_value(&self) -> Option<&str> {
        self.selection.active_value()
    }

    #[must_use]
    pub fn active_candidate(&self) -> Option<&Arc<Candidate>> {
        self.selection.active_index().and_then(|i| self.window.get(i))
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.fetch.as_ref().is_some_and(FetchCoordinator::is_loading)
    }

    /// Something to show: matches, or a fetch on the way
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.window.total_matches() > 0 || self.is_loading()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.total_matches() == 0
    }

    /// Visible error message, configuration problems first
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.config_error.as_deref().or(self.fetch_error.as_deref())
    }

    #[must_use]
    pub fn surface(&self) -> &V {
        self.renderer.surface()
    }

    #[must_use]
    pub fn renderer(&self) -> &ListRenderer<V> {
        &self.renderer
    }

    fn start_fetch(&mut self) {
        let query = self.server_query();
        if let Some(fetch) = self.fetch.as_mut() {
            fetch.fetch_now(query);
        }
    }

    fn server_query(&self) -> Option<String> {
        if self.config.server_filtering {
            server_query(&self.query)
        } else {
            None
        }
    }

    fn apply_fetch(&mut self, outcome: FetchOutcome) {
        let server_filtering = self.config.server_filtering;

        match outcome.result {
            Ok(items) => {
                self.fetch_error = None;
                if server_filtering {
                    let removed = self.registry.remove_data_items();
                    debug!("Replacing {} data items", removed);
                }
                let added = self.registry.register(items, true);
                info!("Loaded {} remote items (request {})", added, outcome.seq);
            }
            Err(e) => {
                error!("Failed to load items (request {}): {}", outcome.seq, e);
                self.fetch_error = Some(e.user_message());
                if server_filtering {
                    self.registry.remove_data_items();
                }
            }
        }

        self.refresh();
    }

    /// Filter, resync selection, render
    fn refresh(&mut self) {
        let options = FilterOptions {
            should_filter: self.config.should_filter,
            max_render: self.config.max_render,
            server_filtered: self.config.server_filtering
                && self.fetch.as_ref().is_some_and(FetchCoordinator::has_fetched),
        };

        self.window = self.pipeline.run(&self.registry, &self.query, options);
        let change = self.selection.sync_to_window(&self.window);
        self.announce(&change);
        self.render();

        if change.index_changed()
            && let Some(id) = self.active_candidate().map(|c| c.id.clone())
        {
            self.renderer.update_selection(None, Some(&id));
        }
    }

    fn render(&mut self) {
        match self.renderer.render(&self.window, self.selection.active_index()) {
            Ok(()) => self.config_error = None,
            Err(e) => self.config_error = Some(e.user_message()),
        }
    }

    fn apply_selection(&mut self, change: Option<SelectionChange>) -> bool {
        let Some(change) = change else {
            return false;
        };

        if change.index_changed() {
            let id_at = |i: Option<usize>| {
                i.and_then(|i| self.window.get(i))
                    .map(|c| c.id.clone())
            };
            let previous = id_at(change.previous);
            let current = id_at(change.current);
            self.renderer
                .update_selection(previous.as_deref(), current.as_deref());
        }

        self.announce(&change);
        change.index_changed()
    }

    fn announce(&self, change: &SelectionChange) {
        if let Some(value) = &change.announce {
            self.emit(CommandEvent::SelectionChanged {
                value: Some(value.clone()),
            });
        }
    }

    fn emit(&self, event: CommandEvent) {
        if self.events_tx.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }
}

/// Query sent to the server: trimmed, omitted when empty
fn server_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
