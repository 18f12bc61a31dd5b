#![forbid(unsafe_code)]

//! The transport seam: how the grid asks a remote source for records.
//!
//! Fetches are fire-and-forget from the grid's point of view. [`Transport::fetch`]
//! issues the request and returns immediately; the owner of the grid later
//! delivers the outcome through
//! [`GridController::complete_fetch`](crate::grid::GridController::complete_fetch)
//! together with the request's [`FetchTicket`]. All of this happens on one
//! logical thread; the grid never blocks waiting for a response.

use std::fmt;

use crate::error::TransportError;

/// Identifies one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchTicket(pub u64);

impl fmt::Display for FetchTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request for `count` records starting at `start_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    /// Ticket to echo back on completion.
    pub ticket: FetchTicket,
    /// First record index requested.
    pub start_index: usize,
    /// Number of records requested.
    pub count: usize,
}

impl FetchRequest {
    /// Wire parameter name for the first record index.
    pub const START_PARAM: &'static str = "start_rec";
    /// Wire parameter name for the record count.
    pub const COUNT_PARAM: &'static str = "end_rec";

    /// Query parameters as sent to the remote source.
    ///
    /// The count parameter is named `end_rec` on the wire but carries a record
    /// count, not an end index.
    #[must_use]
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            (Self::START_PARAM, self.start_index.to_string()),
            (Self::COUNT_PARAM, self.count.to_string()),
        ]
    }

    /// Query string form of [`query_pairs`](Self::query_pairs).
    #[must_use]
    pub fn query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Issues fetches against a remote source.
///
/// Implementations must not call back into the grid from inside `fetch`;
/// completion is delivered later by whoever owns both.
pub trait Transport {
    /// Issue a fetch for `request` against `source_url`.
    ///
    /// An `Err` means the request could not even be issued and is handled
    /// exactly like a failed completion.
    fn fetch(&mut self, source_url: &str, request: FetchRequest) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn fetch(&mut self, source_url: &str, request: FetchRequest) -> Result<(), TransportError> {
        (**self).fetch(source_url, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_use_wire_names() {
        let req = FetchRequest {
            ticket: FetchTicket(1),
            start_index: 30,
            count: 15,
        };
        assert_eq!(
            req.query_pairs(),
            [("start_rec", "30".to_string()), ("end_rec", "15".to_string())]
        );
        assert_eq!(req.query_string(), "start_rec=30&end_rec=15");
    }

    #[test]
    fn ticket_display() {
        assert_eq!(FetchTicket(7).to_string(), "#7");
    }

    #[test]
    fn boxed_transport_forwards() {
        struct Refuse;
        impl Transport for Refuse {
            fn fetch(&mut self, _: &str, _: FetchRequest) -> Result<(), TransportError> {
                Err(TransportError::Network("offline".into()))
            }
        }
        let mut boxed: Box<dyn Transport> = Box::new(Refuse);
        let req = FetchRequest {
            ticket: FetchTicket(0),
            start_index: 0,
            count: 1,
        };
        assert!(boxed.fetch("u", req).is_err());
    }
}
