use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::FailureContext;

/// Lifecycle of a single fragment fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FragmentEvent {
    /// Request sent to the micro-frontend
    Started { url: String, required: bool },

    /// Response received; body becomes the fragment HTML
    Resolved {
        url: String,
        status: u16,
        bytes: usize,
        event_dependencies: Vec<String>,
        duration: Duration,
    },

    /// Transport failure routed to the error or fatal hook
    Failed {
        url: String,
        required: bool,
        failure: FailureContext,
    },

    /// Async fragment left for the browser during server rendering
    Deferred { id: String, url: String },

    /// Element already carries injected content
    Skipped { id: String, url: String },
}
