#![forbid(unsafe_code)]

//! Error types for grid construction and remote fetches.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `ConfigError::UnknownOption` | Unrecognized option key | Construction fails |
//! | `ConfigError::InvalidValue` | Option value out of range | Construction fails |
//! | `TransportError::Network` | Request could not complete | Grid goes idle, cache untouched |
//! | `TransportError::Malformed` | Payload does not match the schema | Same as a network failure |
//!
//! Navigation while a fetch is outstanding, or past the first/last page, is
//! not an error. Those calls are no-ops and report `false`.

use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised while building a [`GridConfig`](crate::config::GridConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An option key that the grid does not recognize.
    UnknownOption {
        /// The offending key, as supplied.
        key: String,
    },
    /// A recognized option with an unusable value.
    InvalidValue {
        /// Option key.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// The option document could not be decoded at all.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownOption { key } => write!(f, "the setting '{key}' is illegal"),
            ConfigError::InvalidValue { key, reason } => {
                write!(f, "invalid value for '{key}': {reason}")
            }
            ConfigError::Parse(msg) => write!(f, "config parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

/// Errors surfaced by a fetch.
///
/// All variants are recovered the same way: the grid goes back to idle and
/// leaves its cache and current page alone. Retrying is up to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be issued or did not complete.
    Network(String),
    /// The remote answered with a non-success status code.
    Status(u16),
    /// The payload did not match the expected response schema.
    Malformed(String),
}

impl TransportError {
    /// Whether this error came from schema validation rather than the wire.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, TransportError::Malformed(_))
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(msg) => write!(f, "network error: {msg}"),
            TransportError::Status(code) => write!(f, "remote returned status {code}"),
            TransportError::Malformed(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Malformed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_option_names_the_key() {
        let err = ConfigError::UnknownOption {
            key: "theme".into(),
        };
        assert_eq!(err.to_string(), "the setting 'theme' is illegal");
    }

    #[test]
    fn serde_errors_become_malformed() {
        let err: TransportError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.is_malformed());
    }
}
