#![forbid(unsafe_code)]

//! Grid configuration.
//!
//! Options may come from code (builder methods) or from a loosely-typed option
//! document (`from_json_str`, `from_options`). Option documents use camelCase
//! keys and also accept the legacy snake_case names:
//!
//! | Key | Legacy key | Default |
//! |-----|------------|---------|
//! | `pageSize` | `recs_per_page` | 10 |
//! | `prefetchPages` | `pages_cached` | 1 |
//! | `minColumnWidth` | `min_width` | 100 |
//! | `pageSelectorEnabled` | `page_selector` | false |
//!
//! An unrecognized key fails construction with [`ConfigError::UnknownOption`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Upper bound on `prefetch_pages`.
pub const MAX_PREFETCH_PAGES: usize = 64;

/// Every key accepted in an option document.
pub const KNOWN_OPTIONS: &[&str] = &[
    "pageSize",
    "recs_per_page",
    "prefetchPages",
    "pages_cached",
    "minColumnWidth",
    "min_width",
    "pageSelectorEnabled",
    "page_selector",
];

/// Per-grid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct GridConfig {
    /// Records per page. Must be non-zero.
    #[serde(alias = "recs_per_page")]
    pub page_size: usize,
    /// Extra pages fetched beyond the requested one whenever a fetch happens.
    /// At most [`MAX_PREFETCH_PAGES`].
    #[serde(alias = "pages_cached")]
    pub prefetch_pages: usize,
    /// Minimum column width in cells; `0` disables the minimum.
    #[serde(alias = "min_width")]
    pub min_column_width: u16,
    /// Whether renderers should offer a page selector.
    #[serde(alias = "page_selector")]
    pub page_selector_enabled: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            prefetch_pages: 1,
            min_column_width: 100,
            page_selector_enabled: false,
        }
    }
}

impl GridConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set records per page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the number of prefetched pages.
    #[must_use]
    pub fn with_prefetch_pages(mut self, pages: usize) -> Self {
        self.prefetch_pages = pages;
        self
    }

    /// Set the minimum column width.
    #[must_use]
    pub fn with_min_column_width(mut self, width: u16) -> Self {
        self.min_column_width = width;
        self
    }

    /// Enable or disable the page selector.
    #[must_use]
    pub fn with_page_selector(mut self, enabled: bool) -> Self {
        self.page_selector_enabled = enabled;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pageSize",
                reason: "must be greater than zero".into(),
            });
        }
        if self.prefetch_pages > MAX_PREFETCH_PAGES {
            return Err(ConfigError::InvalidValue {
                key: "prefetchPages",
                reason: format!("must be at most {MAX_PREFETCH_PAGES}"),
            });
        }
        Ok(())
    }

    /// Build from a JSON object of options.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(ConfigError::Parse(format!(
                "expected an object of options, got {other}"
            ))),
        }
    }

    /// Build from `(key, value)` option pairs.
    ///
    /// ```
    /// use ftui_datagrid::config::GridConfig;
    ///
    /// let cfg = GridConfig::from_options([("recs_per_page", 3)]).unwrap();
    /// assert_eq!(cfg.page_size, 3);
    /// assert!(GridConfig::from_options([("theme", 1)]).is_err());
    /// ```
    pub fn from_options<K, V>(
        options: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, ConfigError>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let map: Map<String, Value> = options
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_map(map)
    }

    fn from_map(map: Map<String, Value>) -> Result<Self, ConfigError> {
        if let Some(key) = map.keys().find(|k| !KNOWN_OPTIONS.contains(&k.as_str())) {
            return Err(ConfigError::UnknownOption { key: key.clone() });
        }
        let config: Self = serde_json::from_value(Value::Object(map))
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = GridConfig::default();
        assert_eq!(cfg.page_size, 10);
        assert_eq!(cfg.prefetch_pages, 1);
        assert_eq!(cfg.min_column_width, 100);
        assert!(!cfg.page_selector_enabled);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn camel_case_document() {
        let cfg = GridConfig::from_json_str(
            r#"{"pageSize": 3, "prefetchPages": 0, "pageSelectorEnabled": true}"#,
        )
        .unwrap();
        assert_eq!(cfg.page_size, 3);
        assert_eq!(cfg.prefetch_pages, 0);
        assert_eq!(cfg.min_column_width, 100);
        assert!(cfg.page_selector_enabled);
    }

    #[test]
    fn legacy_keys_are_accepted() {
        let cfg = GridConfig::from_json_str(
            r#"{"recs_per_page": 25, "pages_cached": 2, "min_width": 0, "page_selector": true}"#,
        )
        .unwrap();
        assert_eq!(
            cfg,
            GridConfig::new()
                .with_page_size(25)
                .with_prefetch_pages(2)
                .with_min_column_width(0)
                .with_page_selector(true)
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = GridConfig::from_json_str(r#"{"pageSize": 3, "theme": "dark"}"#).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownOption {
                key: "theme".into()
            }
        );
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = GridConfig::from_options([("pageSize", 0)]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "pageSize", .. }));
        assert!(GridConfig::new().with_page_size(0).validate().is_err());
    }

    #[test]
    fn prefetch_is_bounded() {
        let err = GridConfig::from_options([("pages_cached", 1_000_000)]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "prefetchPages",
                ..
            }
        ));
        let at_limit = GridConfig::new().with_prefetch_pages(MAX_PREFETCH_PAGES);
        assert!(at_limit.validate().is_ok());
        assert!(at_limit.with_prefetch_pages(MAX_PREFETCH_PAGES + 1).validate().is_err());
    }

    #[test]
    fn wrong_value_type_is_parse_error() {
        let err = GridConfig::from_json_str(r#"{"pageSize": "ten"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn non_object_document_is_parse_error() {
        assert!(matches!(
            GridConfig::from_json_str("[1, 2]"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn empty_options_yield_defaults() {
        let cfg = GridConfig::from_options(Vec::<(String, Value)>::new()).unwrap();
        assert_eq!(cfg, GridConfig::default());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let text = serde_json::to_string(&GridConfig::default()).unwrap();
        assert!(text.contains("\"pageSize\":10"));
        assert!(text.contains("\"minColumnWidth\":100"));
    }
}
