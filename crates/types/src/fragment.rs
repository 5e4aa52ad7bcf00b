//! Fragment request and response types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a single fragment should be fetched
///
/// Supplied by the page author through the fragment element's attributes and
/// never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentOptions {
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "async")]
    pub is_async: bool,
}

impl FragmentOptions {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            required: false,
            is_async: false,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn asynchronous(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }
}

/// Rendered HTML of a fragment plus the events its scripts depend on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentResult {
    pub html: String,
    #[serde(default)]
    pub event_dependencies: Vec<String>,
}

impl FragmentResult {
    #[must_use]
    pub fn new(html: impl Into<String>, event_dependencies: Vec<String>) -> Self {
        Self {
            html: html.into(),
            event_dependencies,
        }
    }

    /// Parse a dependency header value into trimmed event names.
    ///
    /// Blank entries are dropped, so an empty header yields no events.
    #[must_use]
    pub fn parse_event_dependencies(header: Option<&str>) -> Vec<String> {
        header
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|event| !event.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
