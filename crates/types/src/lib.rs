#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the pokeshop composition layer
//!
//! This crate provides the data model shared by the resolver, the metadata
//! registry and the composition service, plus the wire-level names of the
//! fragment protocol.

pub mod fragment;

pub use fragment::{FragmentOptions, FragmentResult};

use serde::{Deserialize, Serialize};

/// Tag name of the micro-frontend fragment element
pub const FRAGMENT_TAG: &str = "front-end-fragment";

/// Response header carrying the comma-separated event dependencies of a fragment
pub const EVENT_DEPENDENCY_HEADER: &str = "X-Event-Dependency";

/// Id of the embedded JSON script holding the event map for the browser
pub const METADATA_SCRIPT_ID: &str = "__micro_front_end_metadata__";

/// Marker set on fragment elements whose content was already injected
pub const ALREADY_LOADED_ATTR: &str = "already-loaded";

/// Name of the slot rendered when a fragment fails
pub const FRAGMENT_ERROR_SLOT: &str = "fragment-error";

/// Marker set on scripts re-created after fragment injection
pub const DYNAMIC_SCRIPT_ATTR: &str = "data-dynamic-loaded";

/// Where a page is being composed
///
/// Server rendering skips `async` fragments and leaves injected scripts in
/// place; browser rendering resolves every fragment and re-creates scripts so
/// they execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderEnvironment {
    Server,
    Browser,
}

impl RenderEnvironment {
    #[must_use]
    pub fn is_browser(self) -> bool {
        matches!(self, Self::Browser)
    }
}

impl Default for RenderEnvironment {
    fn default() -> Self {
        Self::Server
    }
}

impl std::fmt::Display for RenderEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Server => write!(f, "server"),
            Self::Browser => write!(f, "browser"),
        }
    }
}

impl std::str::FromStr for RenderEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server" => Ok(Self::Server),
            "browser" => Ok(Self::Browser),
            other => Err(format!("unknown render environment: {other}")),
        }
    }
}

// Implement clap::ValueEnum for RenderEnvironment
impl clap::ValueEnum for RenderEnvironment {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Server, Self::Browser]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Server => clap::builder::PossibleValue::new("server"),
            Self::Browser => clap::builder::PossibleValue::new("browser"),
        })
    }
}
