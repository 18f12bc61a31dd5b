#![forbid(unsafe_code)]

//! Windowed record cache and fetch coordination for paginated data grids.
//!
//! A grid shows one page of a remotely-held table at a time. This crate
//! decides, for each page request, which record indices are already cached,
//! issues at most one fetch for the rest, merges the response into a sparse
//! cache, and hands a finished page to a [`Renderer`]. Drawing and networking
//! are left to the [`Renderer`] and [`Transport`] implementations supplied by
//! the caller.
//!
//! # Layers
//!
//! - [`cache`]: sparse, first-write-wins [`RecordCache`]
//! - [`planner`]: pure window planning ([`plan_window`])
//! - [`coordinator`]: the `Idle`/`Loading` single-flight state machine
//! - [`grid`]: [`GridController`], navigation and lifecycle hooks
//! - [`view`], [`transport`], [`response`]: the seams to the outside world

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod grid;
pub mod planner;
pub mod record;
pub mod response;
pub mod session;
pub mod transport;
pub mod view;

pub use cache::{CacheStats, RecordCache};
pub use config::GridConfig;
pub use coordinator::{Completion, FetchCoordinator, FetchState, RequestOutcome};
pub use error::{ConfigError, TransportError};
pub use grid::{GridController, GridId, NavCommand};
pub use planner::{WindowPlan, WindowRequest, plan_window};
pub use record::{Field, HeaderField, Record};
pub use response::ParsedPage;
pub use session::GridSession;
pub use transport::{FetchRequest, FetchTicket, Transport};
pub use view::{ColumnLayout, NavFlags, PageMeta, PageOption, PageView, Renderer};
