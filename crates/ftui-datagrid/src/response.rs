#![forbid(unsafe_code)]

//! Response schema for a page fetch.
//!
//! The remote source answers with a JSON object of exactly this shape:
//!
//! ```json
//! {
//!   "header": [{"Address 1": 170}, "Address 2", "Country"],
//!   "data": [
//!     {"432 Washington Blvd.": {"onclick": "alert(1)"}, "#140": {}, "United States": {}}
//!   ],
//!   "total_recs": 5
//! }
//! ```
//!
//! `header` is optional. `total_recs` may also be spelled `totalRecords`.
//! Anything else (unknown keys, non-object records, negative totals) is
//! rejected as [`TransportError::Malformed`].

use serde::Deserialize;

use crate::error::TransportError;
use crate::record::{HeaderField, Record};

/// A decoded page response.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParsedPage {
    /// Column headers, if the source sent them.
    #[serde(default)]
    pub header: Option<Vec<HeaderField>>,
    /// Records, consecutive from the request's start index.
    pub data: Vec<Record>,
    /// Authoritative total record count.
    #[serde(rename = "total_recs", alias = "totalRecords")]
    pub total_records: usize,
}

impl ParsedPage {
    /// Build a page directly (transports that decode elsewhere, tests).
    pub fn new(data: impl IntoIterator<Item = Record>, total_records: usize) -> Self {
        Self {
            header: None,
            data: data.into_iter().collect(),
            total_records,
        }
    }

    /// Attach a header.
    #[must_use]
    pub fn with_header(mut self, header: impl IntoIterator<Item = HeaderField>) -> Self {
        self.header = Some(header.into_iter().collect());
        self
    }

    /// Decode a response body.
    pub fn from_json_str(body: &str) -> Result<Self, TransportError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Decode a response body from bytes.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, TransportError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Decode an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, TransportError> {
        Ok(serde_json::from_value(value)?)
    }
}
