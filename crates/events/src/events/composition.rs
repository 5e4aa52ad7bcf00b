use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome reported by a fragment element when it finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentStatus {
    Resolved,
    Errored,
    Deferred,
    AlreadyLoaded,
}

/// Page composition events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompositionEvent {
    Started { fragments: usize },

    FragmentFinished {
        id: String,
        status: FragmentStatus,
        remaining: usize,
    },

    /// An event has no registered service file; the page still renders
    DependencyMissing { event: String },

    DependencyInjected { event: String, service_file: String },

    /// Fragments still pending when the page deadline expired
    DeadlineExceeded { pending: Vec<String>, deadline: Duration },

    Completed { fragments: usize, duration: Duration },
}
