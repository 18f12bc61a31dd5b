#![forbid(unsafe_code)]

//! The grid controller: configuration, navigation and lifecycle hooks.
//!
//! [`GridController`] is the composition root. It owns the session, the record
//! cache, the fetch coordinator, the transport and the renderer, and turns
//! navigation calls into page requests:
//!
//! ```text
//! first/prev/next/last/goto/reload
//!        │
//!        ▼
//!  FetchCoordinator::request_page ──▶ Transport::fetch (async)
//!        │                                   │
//!        │ cached / early render             │ complete_fetch(ticket, result)
//!        ▼                                   ▼
//!    Renderer::render ◀──────────── FetchCoordinator::complete
//! ```
//!
//! Instances are fully independent. There is no registry of grids; renderers
//! get the [`GridId`] in every [`PageView`] and route user input back as
//! [`NavCommand`]s to the controller they belong to.
//!
//! # Example
//!
//! ```
//! use ftui_datagrid::{
//!     FetchRequest, GridConfig, GridController, PageView, ParsedPage, Record, Transport,
//!     TransportError,
//! };
//!
//! #[derive(Default)]
//! struct Pending(Vec<FetchRequest>);
//!
//! impl Transport for Pending {
//!     fn fetch(&mut self, _url: &str, req: FetchRequest) -> Result<(), TransportError> {
//!         self.0.push(req);
//!         Ok(())
//!     }
//! }
//!
//! let mut pages = Vec::new();
//! let config = GridConfig::new().with_page_size(2).with_prefetch_pages(0);
//! let mut grid = GridController::new(
//!     "people",
//!     "https://example.test/rows",
//!     config,
//!     Pending::default(),
//!     |view: &PageView<'_>| pages.push(view.stats_label()),
//! );
//! grid.start();
//! let req = grid.transport_mut().0.pop().unwrap();
//! let rows = vec![Record::from_labels(["Ada"]), Record::from_labels(["Grace"])];
//! grid.complete_fetch(req.ticket, Ok(ParsedPage::new(rows, 3)));
//! assert!(grid.can_next());
//! drop(grid);
//! assert_eq!(pages, ["1-2 / 3"]);
//! ```

use std::fmt;

use tracing::{debug_span, info, warn};

use crate::cache::RecordCache;
use crate::config::GridConfig;
use crate::coordinator::{Completion, FetchCoordinator, RequestOutcome};
use crate::error::{ConfigError, TransportError};
use crate::response::ParsedPage;
use crate::session::GridSession;
use crate::transport::{FetchTicket, Transport};
use crate::view::{NavFlags, PageMeta, PageView, Renderer};

/// Name of a grid instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(String);

impl GridId {
    /// Create an id.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The id as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GridId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for GridId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A navigation request routed from a renderer back to its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    /// Go to page 0.
    First,
    /// Go to the previous page.
    Prev,
    /// Go to the next page.
    Next,
    /// Go to the last page.
    Last,
    /// Go to a specific page (page selector).
    Goto(usize),
    /// Refetch the current page, discarding its cached records.
    Reload,
}

type LoadHook = Box<dyn FnMut(&GridId, &PageMeta)>;
type ErrorHook = Box<dyn FnMut(&GridId, &TransportError)>;

/// A paginated grid backed by a remote source.
pub struct GridController<T, R> {
    id: GridId,
    source_url: String,
    config: GridConfig,
    session: GridSession,
    cache: RecordCache,
    coordinator: FetchCoordinator,
    transport: T,
    renderer: R,
    on_first_load: Option<LoadHook>,
    on_every_load: Option<LoadHook>,
    on_error: Option<ErrorHook>,
}

impl<T: Transport, R: Renderer> GridController<T, R> {
    /// Create a grid. No fetch is issued until [`start`](Self::start).
    ///
    /// `config` is expected to be valid; use [`try_new`](Self::try_new) to
    /// have it checked.
    pub fn new(
        id: impl Into<GridId>,
        source_url: impl Into<String>,
        config: GridConfig,
        transport: T,
        renderer: R,
    ) -> Self {
        let session = GridSession::new(&config);
        Self {
            id: id.into(),
            source_url: source_url.into(),
            config,
            session,
            cache: RecordCache::new(),
            coordinator: FetchCoordinator::new(),
            transport,
            renderer,
            on_first_load: None,
            on_every_load: None,
            on_error: None,
        }
    }

    /// Create a grid after validating `config`.
    pub fn try_new(
        id: impl Into<GridId>,
        source_url: impl Into<String>,
        config: GridConfig,
        transport: T,
        renderer: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(id, source_url, config, transport, renderer))
    }

    /// Run `hook` once, after the first successful fetch and before its render.
    #[must_use]
    pub fn on_first_load(mut self, hook: impl FnMut(&GridId, &PageMeta) + 'static) -> Self {
        self.on_first_load = Some(Box::new(hook));
        self
    }

    /// Run `hook` after every render.
    #[must_use]
    pub fn on_every_load(mut self, hook: impl FnMut(&GridId, &PageMeta) + 'static) -> Self {
        self.on_every_load = Some(Box::new(hook));
        self
    }

    /// Run `hook` whenever a fetch fails.
    #[must_use]
    pub fn on_error(mut self, hook: impl FnMut(&GridId, &TransportError) + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────

    /// Grid id.
    #[must_use]
    pub fn id(&self) -> &GridId {
        &self.id
    }

    /// Source URL passed to the transport.
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Paging state.
    #[must_use]
    pub fn session(&self) -> &GridSession {
        &self.session
    }

    /// Record cache.
    #[must_use]
    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// Current page (meaningful after the first successful load).
    #[must_use]
    pub fn current_page(&self) -> usize {
        self.session.current_page
    }

    /// Total records reported by the last response.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.session.total_records
    }

    /// Whether a fetch is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.coordinator.is_loading()
    }

    /// Ticket of the outstanding fetch, if any.
    #[must_use]
    pub fn pending_ticket(&self) -> Option<FetchTicket> {
        self.coordinator.in_flight().map(|f| f.request.ticket)
    }

    /// The transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The renderer.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    // ── Navigation ───────────────────────────────────────────────────────

    /// Whether `prev`/`first` would do anything.
    #[must_use]
    pub fn can_prev(&self) -> bool {
        !self.is_loading() && self.session.current_page > 0
    }

    /// Whether `next`/`last` would do anything.
    #[must_use]
    pub fn can_next(&self) -> bool {
        !self.is_loading() && self.session.current_page < self.session.last_page_index()
    }

    /// Issue the initial request for page 0.
    pub fn start(&mut self) -> bool {
        self.request_page(0, false)
    }

    /// Request `page`. Returns `false` if the request was rejected.
    pub fn goto(&mut self, page: usize) -> bool {
        self.request_page(page, false)
    }

    /// Go to page 0.
    pub fn first(&mut self) -> bool {
        self.can_prev() && self.goto(0)
    }

    /// Go to the previous page.
    pub fn prev(&mut self) -> bool {
        self.can_prev() && self.goto(self.session.current_page - 1)
    }

    /// Go to the next page.
    pub fn next(&mut self) -> bool {
        self.can_next() && self.goto(self.session.current_page + 1)
    }

    /// Go to the last page.
    pub fn last(&mut self) -> bool {
        self.can_next() && self.goto(self.session.last_page_index())
    }

    /// Refetch the current page, discarding its cached records first.
    ///
    /// Not gated on page bounds; still rejected while a fetch is outstanding.
    pub fn reload(&mut self) -> bool {
        self.request_page(self.session.current_page, true)
    }

    /// Apply a navigation command.
    pub fn dispatch(&mut self, command: NavCommand) -> bool {
        match command {
            NavCommand::First => self.first(),
            NavCommand::Prev => self.prev(),
            NavCommand::Next => self.next(),
            NavCommand::Last => self.last(),
            NavCommand::Goto(page) => self.goto(page),
            NavCommand::Reload => self.reload(),
        }
    }

    /// Request `page`, forcing a refetch of its range when `force` is set.
    ///
    /// Returns `false` when rejected because a fetch is outstanding or when the
    /// transport refused to issue the fetch.
    pub fn request_page(&mut self, page: usize, force: bool) -> bool {
        let _span = debug_span!("grid_request_page", grid = %self.id, page, force).entered();

        let outcome = self.coordinator.request_page(
            &mut self.session,
            &mut self.cache,
            &mut self.transport,
            &self.source_url,
            page,
            force,
        );
        match outcome {
            RequestOutcome::Rejected => false,
            RequestOutcome::Cached { .. } => {
                self.render_current();
                true
            }
            RequestOutcome::Fetching { render_now, .. } => {
                if render_now {
                    self.render_current();
                }
                true
            }
            RequestOutcome::IssueFailed {
                render_now, error, ..
            } => {
                if render_now {
                    self.render_current();
                }
                self.report_error(&error);
                false
            }
        }
    }

    // ── Completion ───────────────────────────────────────────────────────

    /// Deliver the result of the fetch identified by `ticket`.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<ParsedPage, TransportError>,
    ) -> Completion {
        let _span = debug_span!("grid_complete_fetch", grid = %self.id, %ticket).entered();

        let completion = self
            .coordinator
            .complete(&mut self.session, &mut self.cache, ticket, result);
        match &completion {
            Completion::Unexpected => {}
            Completion::Failed(error) => self.report_error(error),
            Completion::Loaded {
                render, first_load, ..
            } => {
                if *first_load {
                    info!(
                        grid = %self.id,
                        total_records = self.session.total_records,
                        "grid loaded"
                    );
                    let meta = self.page_meta();
                    if let Some(hook) = self.on_first_load.as_mut() {
                        hook(&self.id, &meta);
                    }
                }
                if *render {
                    self.render_current();
                }
            }
        }
        completion
    }

    /// Decode `body` and deliver it as the result of `ticket`.
    pub fn complete_fetch_json(
        &mut self,
        ticket: FetchTicket,
        body: Result<&str, TransportError>,
    ) -> Completion {
        let result = body.and_then(ParsedPage::from_json_str);
        self.complete_fetch(ticket, result)
    }

    // ── Rendering ────────────────────────────────────────────────────────

    /// Paging numbers for the current page.
    #[must_use]
    pub fn page_meta(&self) -> PageMeta {
        let range = self.session.page_range(self.session.current_page);
        PageMeta {
            current_page: self.session.current_page,
            page_size: self.session.page_size,
            total_records: self.session.total_records,
            records_on_page: self.cache.slice(range.start, range.len()).len(),
        }
    }

    fn render_current(&mut self) {
        let range = self.session.page_range(self.session.current_page);
        let meta = {
            let records = self.cache.slice(range.start, range.len());
            let meta = PageMeta {
                current_page: self.session.current_page,
                page_size: self.session.page_size,
                total_records: self.session.total_records,
                records_on_page: records.len(),
            };
            let view = PageView {
                grid: &self.id,
                records,
                header: self.session.header(),
                meta,
                nav: NavFlags::for_page(meta.current_page, meta.last_page_index()),
                loading: self.coordinator.is_loading(),
                min_column_width: self.config.min_column_width,
                page_selector_enabled: self.config.page_selector_enabled,
            };
            self.renderer.render(&view);
            meta
        };
        if let Some(hook) = self.on_every_load.as_mut() {
            hook(&self.id, &meta);
        }
    }

    fn report_error(&mut self, error: &TransportError) {
        warn!(grid = %self.id, %error, "page request failed");
        if let Some(hook) = self.on_error.as_mut() {
            hook(&self.id, error);
        }
    }
}

impl<T, R> fmt::Debug for GridController<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridController")
            .field("id", &self.id)
            .field("source_url", &self.source_url)
            .field("session", &self.session)
            .field("cached", &self.cache.size())
            .field("state", &self.coordinator.state())
            .finish()
    }
}
