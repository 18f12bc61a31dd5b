#![forbid(unsafe_code)]

//! Single-flight fetch coordination.
//!
//! [`FetchCoordinator`] is an explicit two-state machine:
//!
//! ```text
//!            request_page (fetch needed)
//!   ┌──────┐ ───────────────────────────▶ ┌─────────┐
//!   │ Idle │                              │ Loading │
//!   └──────┘ ◀─────────────────────────── └─────────┘
//!            complete (success or failure)
//! ```
//!
//! # Invariants
//!
//! 1. **Single flight**: at most one fetch is outstanding. `request_page` while
//!    `Loading` is rejected, never queued.
//! 2. **No overwrite on merge**: responses go through
//!    [`RecordCache::set_if_absent`]. A forced reload evicts the requested
//!    page's range *before* planning so that range is fetched afresh.
//! 3. **Failure leaves no trace**: a failed fetch returns to `Idle` without
//!    touching the cache, the page pointer or the total.
//! 4. **One render per request**: the outcome tells the caller whether to render
//!    now, later, or not at all; a page rendered early is not rendered again on
//!    completion.
//!
//! The coordinator does not render or run hooks itself; it returns
//! [`RequestOutcome`] / [`Completion`] and the controller acts on them.

use tracing::{debug, trace, warn};

use crate::cache::RecordCache;
use crate::error::TransportError;
use crate::planner::{WindowPlan, plan_window};
use crate::response::ParsedPage;
use crate::session::GridSession;
use crate::transport::{FetchRequest, FetchTicket, Transport};

/// The fetch currently outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    /// Request as issued to the transport.
    pub request: FetchRequest,
    /// Page that becomes current when the fetch succeeds.
    pub page: usize,
    /// Whether the page was already rendered from cache before issuing.
    pub rendered_early: bool,
}

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    /// No fetch outstanding.
    #[default]
    Idle,
    /// Exactly one fetch outstanding.
    Loading(InFlight),
}

/// What the caller should do after [`FetchCoordinator::request_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A fetch is outstanding; nothing changed.
    Rejected,
    /// The window was fully cached. `page` is current; render it now.
    Cached {
        /// Page to render.
        page: usize,
    },
    /// A fetch was issued.
    Fetching {
        /// Page that will become current.
        page: usize,
        /// Ticket of the issued fetch.
        ticket: FetchTicket,
        /// The page is already cached, is current, and should be rendered now.
        render_now: bool,
    },
    /// The transport refused to issue the fetch. The coordinator is `Idle`.
    IssueFailed {
        /// Page that was requested.
        page: usize,
        /// The page is already cached, is current, and should be rendered now.
        render_now: bool,
        /// Why the fetch could not be issued.
        error: TransportError,
    },
}

/// What the caller should do after [`FetchCoordinator::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// No fetch with this ticket is outstanding. Nothing changed.
    Unexpected,
    /// The fetch failed. The coordinator is `Idle`; nothing else changed.
    Failed(TransportError),
    /// The response was merged and `page` is current.
    Loaded {
        /// Page that is now current.
        page: usize,
        /// Render `page` now (it was not rendered early).
        render: bool,
        /// This was the grid's first successful fetch.
        first_load: bool,
        /// Records stored by this merge.
        stored: usize,
        /// Records dropped because their index was already filled.
        skipped: usize,
    },
}

/// Owns the single-flight invariant and the merge policy.
#[derive(Debug, Default)]
pub struct FetchCoordinator {
    state: FetchState,
    next_ticket: u64,
}

impl FetchCoordinator {
    /// A coordinator in the `Idle` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> FetchState {
        self.state
    }

    /// Whether a fetch is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.state, FetchState::Loading(_))
    }

    /// The outstanding fetch, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<&InFlight> {
        match &self.state {
            FetchState::Loading(f) => Some(f),
            FetchState::Idle => None,
        }
    }

    /// Handle a request for `page`.
    pub fn request_page<T: Transport + ?Sized>(
        &mut self,
        session: &mut GridSession,
        cache: &mut RecordCache,
        transport: &mut T,
        source_url: &str,
        page: usize,
        force: bool,
    ) -> RequestOutcome {
        if let FetchState::Loading(in_flight) = &self.state {
            debug!(
                page,
                pending = %in_flight.request.ticket,
                "page request rejected while loading"
            );
            return RequestOutcome::Rejected;
        }

        if force {
            let evicted = cache.evict(session.page_range(page));
            trace!(page, evicted, "evicted page for forced reload");
        }

        let plan = plan_window(&session.window_request(page, force), |i| cache.has(i));
        let (start_index, count, page_ready) = match plan {
            WindowPlan::Cached => {
                debug!(page, "window fully cached");
                session.current_page = page;
                return RequestOutcome::Cached { page };
            }
            WindowPlan::Fetch {
                start_index,
                count,
                page_ready,
            } => (start_index, count, page_ready),
        };

        if page_ready {
            session.current_page = page;
        }

        let ticket = FetchTicket(self.next_ticket);
        self.next_ticket += 1;
        let request = FetchRequest {
            ticket,
            start_index,
            count,
        };
        debug!(
            page,
            start_index,
            count,
            early_render = page_ready,
            %ticket,
            "issuing fetch"
        );

        if let Err(error) = transport.fetch(source_url, request) {
            warn!(page, %ticket, %error, "transport refused fetch");
            return RequestOutcome::IssueFailed {
                page,
                render_now: page_ready,
                error,
            };
        }

        self.state = FetchState::Loading(InFlight {
            request,
            page,
            rendered_early: page_ready,
        });
        RequestOutcome::Fetching {
            page,
            ticket,
            render_now: page_ready,
        }
    }

    /// Deliver the outcome of the fetch identified by `ticket`.
    pub fn complete(
        &mut self,
        session: &mut GridSession,
        cache: &mut RecordCache,
        ticket: FetchTicket,
        result: Result<ParsedPage, TransportError>,
    ) -> Completion {
        let in_flight = match self.state {
            FetchState::Loading(f) if f.request.ticket == ticket => f,
            FetchState::Loading(f) => {
                warn!(
                    %ticket,
                    pending = %f.request.ticket,
                    "completion for a different fetch ignored"
                );
                return Completion::Unexpected;
            }
            FetchState::Idle => {
                warn!(%ticket, "completion while idle ignored");
                return Completion::Unexpected;
            }
        };
        self.state = FetchState::Idle;

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                warn!(%ticket, page = in_flight.page, %error, "fetch failed");
                return Completion::Failed(error);
            }
        };

        let ParsedPage {
            header,
            data,
            total_records,
        } = response;

        if let Some(header) = header
            && session.adopt_header(header)
        {
            trace!(columns = session.header().len(), "header adopted");
        }

        let received = data.len();
        let mut stored = 0usize;
        for (offset, record) in data.into_iter().enumerate() {
            let Some(index) = in_flight.request.start_index.checked_add(offset) else {
                break;
            };
            if cache.set_if_absent(index, record) {
                stored += 1;
            }
        }
        let skipped = received - stored;
        trace!(
            start_index = in_flight.request.start_index,
            received,
            stored,
            skipped,
            "merged response"
        );

        session.total_records = total_records;
        session.current_page = in_flight.page;
        let first_load = session.mark_loaded();

        Completion::Loaded {
            page: in_flight.page,
            render: !in_flight.rendered_early,
            first_load,
            stored,
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::record::{HeaderField, Record};

    #[derive(Default)]
    struct Recorder {
        issued: Vec<FetchRequest>,
        refuse: bool,
    }

    impl Transport for Recorder {
        fn fetch(&mut self, _: &str, request: FetchRequest) -> Result<(), TransportError> {
            if self.refuse {
                return Err(TransportError::Network("offline".into()));
            }
            self.issued.push(request);
            Ok(())
        }
    }

    struct Fixture {
        coord: FetchCoordinator,
        session: GridSession,
        cache: RecordCache,
        transport: Recorder,
    }

    impl Fixture {
        fn new(page_size: usize, prefetch: usize) -> Self {
            let cfg = GridConfig::new()
                .with_page_size(page_size)
                .with_prefetch_pages(prefetch);
            Self {
                coord: FetchCoordinator::new(),
                session: GridSession::new(&cfg),
                cache: RecordCache::new(),
                transport: Recorder::default(),
            }
        }

        fn request(&mut self, page: usize, force: bool) -> RequestOutcome {
            self.coord.request_page(
                &mut self.session,
                &mut self.cache,
                &mut self.transport,
                "mem://rows",
                page,
                force,
            )
        }

        fn complete(
            &mut self,
            ticket: FetchTicket,
            result: Result<ParsedPage, TransportError>,
        ) -> Completion {
            self.coord
                .complete(&mut self.session, &mut self.cache, ticket, result)
        }
    }

    fn rows(tag: &str, range: std::ops::Range<usize>) -> Vec<Record> {
        range.map(|i| Record::from_labels([format!("{tag}{i}")])).collect()
    }

    fn ticket_of(outcome: &RequestOutcome) -> FetchTicket {
        match outcome {
            RequestOutcome::Fetching { ticket, .. } => *ticket,
            other => panic!("expected a fetch, got {other:?}"),
        }
    }

    #[test]
    fn first_request_fetches_and_defers_render() {
        let mut fx = Fixture::new(10, 1);
        let outcome = fx.request(0, false);
        assert!(matches!(
            outcome,
            RequestOutcome::Fetching {
                page: 0,
                render_now: false,
                ..
            }
        ));
        assert!(fx.coord.is_loading());
        assert_eq!(fx.transport.issued[0].start_index, 0);
        assert_eq!(fx.transport.issued[0].count, 20);
    }

    #[test]
    fn request_while_loading_is_rejected() {
        let mut fx = Fixture::new(10, 1);
        fx.request(0, false);
        assert_eq!(fx.request(1, false), RequestOutcome::Rejected);
        assert_eq!(fx.request(0, true), RequestOutcome::Rejected);
        assert_eq!(fx.transport.issued.len(), 1);
    }

    #[test]
    fn successful_completion_merges_and_reports_first_load() {
        let mut fx = Fixture::new(10, 1);
        let ticket = ticket_of(&fx.request(0, false));
        let page = ParsedPage::new(rows("r", 0..20), 25).with_header([HeaderField::new("Name")]);
        let completion = fx.complete(ticket, Ok(page));
        assert_eq!(
            completion,
            Completion::Loaded {
                page: 0,
                render: true,
                first_load: true,
                stored: 20,
                skipped: 0,
            }
        );
        assert_eq!(fx.session.total_records, 25);
        assert_eq!(fx.session.header().len(), 1);
        assert_eq!(fx.cache.size(), 20);
        assert_eq!(fx.coord.state(), FetchState::Idle);
    }

    #[test]
    fn second_load_is_not_first() {
        let mut fx = Fixture::new(10, 0);
        let t = ticket_of(&fx.request(0, false));
        fx.complete(t, Ok(ParsedPage::new(rows("r", 0..10), 30)));
        let t = ticket_of(&fx.request(1, false));
        let completion = fx.complete(t, Ok(ParsedPage::new(rows("r", 10..20), 30)));
        assert!(matches!(
            completion,
            Completion::Loaded {
                page: 1,
                first_load: false,
                ..
            }
        ));
    }

    #[test]
    fn cached_window_renders_synchronously() {
        let mut fx = Fixture::new(3, 0);
        let t = ticket_of(&fx.request(0, false));
        fx.complete(t, Ok(ParsedPage::new(rows("r", 0..3), 5)));
        let t = ticket_of(&fx.request(1, false));
        fx.complete(t, Ok(ParsedPage::new(rows("r", 3..5), 5)));
        assert_eq!(fx.request(0, false), RequestOutcome::Cached { page: 0 });
        assert_eq!(fx.session.current_page, 0);
        assert!(!fx.coord.is_loading());
    }

    #[test]
    fn cached_page_with_prefetch_gap_renders_early() {
        let mut fx = Fixture::new(10, 1);
        // Seed page 0 only.
        for (i, r) in rows("r", 0..10).into_iter().enumerate() {
            fx.cache.set_if_absent(i, r);
        }
        let outcome = fx.request(0, false);
        let ticket = match outcome {
            RequestOutcome::Fetching {
                page: 0,
                ticket,
                render_now: true,
            } => ticket,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(fx.session.current_page, 0);
        assert_eq!(fx.transport.issued[0].start_index, 10);
        assert_eq!(fx.transport.issued[0].count, 10);

        let completion = fx.complete(ticket, Ok(ParsedPage::new(rows("r", 10..20), 40)));
        assert!(matches!(completion, Completion::Loaded { render: false, .. }));
    }

    #[test]
    fn failure_returns_to_idle_without_mutation() {
        let mut fx = Fixture::new(10, 0);
        let t = ticket_of(&fx.request(0, false));
        fx.complete(t, Ok(ParsedPage::new(rows("r", 0..10), 30)));
        let before = (fx.session.clone(), fx.cache.size());

        let t = ticket_of(&fx.request(1, false));
        let completion = fx.complete(t, Err(TransportError::Status(500)));
        assert_eq!(completion, Completion::Failed(TransportError::Status(500)));
        assert_eq!(fx.coord.state(), FetchState::Idle);
        assert_eq!((fx.session.clone(), fx.cache.size()), before);
    }

    #[test]
    fn unexpected_tickets_change_nothing() {
        let mut fx = Fixture::new(10, 0);
        assert_eq!(
            fx.complete(FetchTicket(99), Ok(ParsedPage::new(rows("r", 0..10), 10))),
            Completion::Unexpected
        );
        assert!(fx.cache.is_empty());

        let t = ticket_of(&fx.request(0, false));
        let wrong = FetchTicket(t.0 + 1);
        assert_eq!(
            fx.complete(wrong, Ok(ParsedPage::new(rows("r", 0..10), 10))),
            Completion::Unexpected
        );
        assert!(fx.coord.is_loading());
        assert!(fx.cache.is_empty());
    }

    #[test]
    fn refused_issue_leaves_coordinator_idle() {
        let mut fx = Fixture::new(10, 0);
        fx.transport.refuse = true;
        let outcome = fx.request(0, false);
        assert!(matches!(
            outcome,
            RequestOutcome::IssueFailed {
                page: 0,
                render_now: false,
                ..
            }
        ));
        assert!(!fx.coord.is_loading());
    }

    #[test]
    fn forced_reload_replaces_page_but_keeps_prefetched_neighbours() {
        let mut fx = Fixture::new(3, 1);
        let t = ticket_of(&fx.request(0, false));
        fx.complete(t, Ok(ParsedPage::new(rows("old", 0..6), 6)));

        let outcome = fx.request(0, true);
        let t = ticket_of(&outcome);
        assert_eq!(fx.transport.issued[1].start_index, 0);
        assert_eq!(fx.transport.issued[1].count, 3);
        // The response carries fresh rows for the page and beyond.
        let completion = fx.complete(t, Ok(ParsedPage::new(rows("new", 0..6), 6)));
        assert!(matches!(completion, Completion::Loaded { stored: 3, skipped: 3, .. }));

        assert_eq!(fx.cache.get(0), Some(&Record::from_labels(["new0"])));
        assert_eq!(fx.cache.get(2), Some(&Record::from_labels(["new2"])));
        // Outside the reloaded page the first write still wins.
        assert_eq!(fx.cache.get(3), Some(&Record::from_labels(["old3"])));
    }

    #[test]
    fn merge_never_overwrites_existing_indices() {
        let mut fx = Fixture::new(5, 0);
        fx.cache.set_if_absent(2, Record::from_labels(["keep"]));
        let t = ticket_of(&fx.request(0, false));
        let completion = fx.complete(t, Ok(ParsedPage::new(rows("r", 0..4), 10)));
        assert!(matches!(completion, Completion::Loaded { stored: 3, skipped: 1, .. }));
        assert_eq!(fx.cache.get(2), Some(&Record::from_labels(["keep"])));
    }

    #[test]
    fn tickets_increase() {
        let mut fx = Fixture::new(1, 0);
        let a = ticket_of(&fx.request(0, false));
        fx.complete(a, Ok(ParsedPage::new(rows("r", 0..1), 5)));
        let b = ticket_of(&fx.request(1, false));
        assert!(b > a);
    }
}
